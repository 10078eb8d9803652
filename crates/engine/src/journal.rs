//! Journal entries.
//!
//! A [`JournalEntry`] is an immutable, balanced set of postings
//! ([`JournalLine`]s). Entries are append-only: mistakes and cancellations
//! are undone with a reversing entry, never by editing.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, JournalLine, ResultEngine, util::parse_uuid};

use super::journal_lines;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Settlement,
    Reversal,
    Deposit,
    Manual,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Settlement => "settlement",
            Self::Reversal => "reversal",
            Self::Deposit => "deposit",
            Self::Manual => "manual",
        }
    }
}

impl TryFrom<&str> for EntryKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "settlement" => Ok(Self::Settlement),
            "reversal" => Ok(Self::Reversal),
            "deposit" => Ok(Self::Deposit),
            "manual" => Ok(Self::Manual),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid entry kind: {other}"
            ))),
        }
    }
}

/// An entry to be posted with [`Engine::post_entry`](crate::Engine::post_entry).
#[derive(Clone, Debug)]
pub struct NewJournalEntry {
    pub description: String,
    pub reference: Option<String>,
    pub kind: EntryKind,
    pub occurred_at: DateTime<Utc>,
    pub idempotency_key: Option<String>,
    pub created_by: String,
    pub lines: Vec<JournalLine>,
}

impl NewJournalEntry {
    #[must_use]
    pub fn new(
        kind: EntryKind,
        description: impl Into<String>,
        created_by: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            description: description.into(),
            reference: None,
            kind,
            occurred_at,
            idempotency_key: None,
            created_by: created_by.into(),
            lines: Vec::new(),
        }
    }

    #[must_use]
    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    #[must_use]
    pub fn idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn line(mut self, line: JournalLine) -> Self {
        self.lines.push(line);
        self
    }

    #[must_use]
    pub fn lines(mut self, lines: impl IntoIterator<Item = JournalLine>) -> Self {
        self.lines.extend(lines);
        self
    }

    /// Σdebit and Σcredit, or `InvalidAmount` on overflow.
    pub fn totals(&self) -> ResultEngine<(i64, i64)> {
        let overflow = || EngineError::InvalidAmount("entry total overflow".to_string());
        let mut debit = 0i64;
        let mut credit = 0i64;
        for line in &self.lines {
            debit = debit.checked_add(line.debit_minor).ok_or_else(overflow)?;
            credit = credit.checked_add(line.credit_minor).ok_or_else(overflow)?;
        }
        Ok((debit, credit))
    }

    /// Checks the shape of every line and that the entry balances.
    pub fn validate(&self) -> ResultEngine<()> {
        if self.lines.is_empty() {
            return Err(EngineError::UnbalancedEntry(
                "entry must have at least one line".to_string(),
            ));
        }
        for line in &self.lines {
            line.validate()?;
        }
        let (debit, credit) = self.totals()?;
        if debit != credit {
            return Err(EngineError::UnbalancedEntry(format!(
                "debits {debit} != credits {credit}"
            )));
        }
        Ok(())
    }

    /// The entry that undoes `self`: same accounts, sides swapped.
    #[must_use]
    pub fn reversed(&self, description: impl Into<String>, occurred_at: DateTime<Utc>) -> Self {
        Self {
            description: description.into(),
            reference: self.reference.clone(),
            kind: EntryKind::Reversal,
            occurred_at,
            idempotency_key: None,
            created_by: self.created_by.clone(),
            lines: self.lines.iter().map(JournalLine::swapped).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub description: String,
    pub reference: Option<String>,
    pub kind: EntryKind,
    pub idempotency_key: Option<String>,
    pub created_by: String,
    pub lines: Vec<JournalLine>,
}

impl JournalEntry {
    pub fn total_debit(&self) -> i64 {
        self.lines.iter().map(|l| l.debit_minor).sum()
    }

    pub fn total_credit(&self) -> i64 {
        self.lines.iter().map(|l| l.credit_minor).sum()
    }

    /// Rebuilds the postable form, e.g. to compute a reversal.
    pub fn to_new(&self) -> NewJournalEntry {
        NewJournalEntry {
            description: self.description.clone(),
            reference: self.reference.clone(),
            kind: self.kind,
            occurred_at: self.occurred_at,
            idempotency_key: self.idempotency_key.clone(),
            created_by: self.created_by.clone(),
            lines: self.lines.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "journal_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub occurred_at: DateTimeUtc,
    pub description: String,
    pub reference: Option<String>,
    pub kind: String,
    pub idempotency_key: Option<String>,
    pub created_by: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::journal_lines::Entity")]
    Lines,
}

impl Related<journal_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub(crate) fn new_entry(id: Uuid, entry: &NewJournalEntry) -> Self {
        Self {
            id: ActiveValue::Set(id.to_string()),
            occurred_at: ActiveValue::Set(entry.occurred_at),
            description: ActiveValue::Set(entry.description.clone()),
            reference: ActiveValue::Set(entry.reference.clone()),
            kind: ActiveValue::Set(entry.kind.as_str().to_string()),
            idempotency_key: ActiveValue::Set(entry.idempotency_key.clone()),
            created_by: ActiveValue::Set(entry.created_by.clone()),
        }
    }
}

impl TryFrom<(Model, Vec<journal_lines::Model>)> for JournalEntry {
    type Error = EngineError;

    fn try_from((model, mut lines): (Model, Vec<journal_lines::Model>)) -> ResultEngine<Self> {
        lines.sort_by_key(|l| l.position);
        Ok(Self {
            id: parse_uuid(&model.id, "journal entry")?,
            occurred_at: model.occurred_at,
            description: model.description,
            reference: model.reference,
            kind: EntryKind::try_from(model.kind.as_str())?,
            idempotency_key: model.idempotency_key,
            created_by: model.created_by,
            lines: lines.into_iter().map(JournalLine::from).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(lines: Vec<JournalLine>) -> NewJournalEntry {
        NewJournalEntry::new(EntryKind::Manual, "test", "tester", Utc::now()).lines(lines)
    }

    #[test]
    fn balanced_entry_validates() {
        let e = entry(vec![
            JournalLine::debit("1102", 35_000),
            JournalLine::credit("4100", 35_000),
        ]);
        assert!(e.validate().is_ok());
        assert_eq!(e.totals().unwrap(), (35_000, 35_000));
    }

    #[test]
    fn unbalanced_entry_is_rejected() {
        let e = entry(vec![
            JournalLine::debit("1102", 35_000),
            JournalLine::credit("4100", 30_000),
        ]);
        assert!(matches!(e.validate(), Err(EngineError::UnbalancedEntry(_))));
    }

    #[test]
    fn empty_entry_is_rejected() {
        assert!(matches!(
            entry(Vec::new()).validate(),
            Err(EngineError::UnbalancedEntry(_))
        ));
    }

    #[test]
    fn reversal_swaps_every_line() {
        let e = entry(vec![
            JournalLine::debit("2200-a1", 35_000),
            JournalLine::credit("4100", 35_000),
        ])
        .reference("RES-000001");
        let r = e.reversed("undo", Utc::now());
        assert_eq!(r.kind, EntryKind::Reversal);
        assert_eq!(r.reference.as_deref(), Some("RES-000001"));
        assert_eq!(r.lines[0], JournalLine::credit("2200-a1", 35_000));
        assert_eq!(r.lines[1], JournalLine::debit("4100", 35_000));
        assert!(r.validate().is_ok());
    }
}
