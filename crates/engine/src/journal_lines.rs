//! Journal lines.
//!
//! A [`JournalLine`] posts a debit and/or a credit on one account as part
//! of a [`JournalEntry`](crate::JournalEntry). Amounts are non-negative
//! integer **minor units**; which side grows the balance depends on the
//! account type (see [`AccountType::balance_delta`](crate::AccountType::balance_delta)).

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    pub account_code: String,
    pub debit_minor: i64,
    pub credit_minor: i64,
}

impl JournalLine {
    pub fn debit(account_code: impl Into<String>, amount_minor: i64) -> Self {
        Self {
            account_code: account_code.into(),
            debit_minor: amount_minor,
            credit_minor: 0,
        }
    }

    pub fn credit(account_code: impl Into<String>, amount_minor: i64) -> Self {
        Self {
            account_code: account_code.into(),
            debit_minor: 0,
            credit_minor: amount_minor,
        }
    }

    #[must_use]
    pub fn swapped(&self) -> Self {
        Self {
            account_code: self.account_code.clone(),
            debit_minor: self.credit_minor,
            credit_minor: self.debit_minor,
        }
    }

    pub(crate) fn validate(&self) -> ResultEngine<()> {
        if self.debit_minor < 0 || self.credit_minor < 0 {
            return Err(EngineError::InvalidAmount(format!(
                "line on {}: amounts must be >= 0",
                self.account_code
            )));
        }
        if self.debit_minor == 0 && self.credit_minor == 0 {
            return Err(EngineError::InvalidAmount(format!(
                "line on {}: debit and credit are both 0",
                self.account_code
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "journal_lines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub entry_id: String,
    pub position: i32,
    pub account_code: String,
    pub debit_minor: i64,
    pub credit_minor: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::journal::Entity",
        from = "Column::EntryId",
        to = "super::journal::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Entry,
}

impl Related<super::journal::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Entry.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub(crate) fn new_line(entry_id: Uuid, position: i32, line: &JournalLine) -> Self {
        Self {
            id: ActiveValue::Set(Uuid::new_v4().to_string()),
            entry_id: ActiveValue::Set(entry_id.to_string()),
            position: ActiveValue::Set(position),
            account_code: ActiveValue::Set(line.account_code.clone()),
            debit_minor: ActiveValue::Set(line.debit_minor),
            credit_minor: ActiveValue::Set(line.credit_minor),
        }
    }
}

impl From<Model> for JournalLine {
    fn from(model: Model) -> Self {
        Self {
            account_code: model.account_code,
            debit_minor: model.debit_minor,
            credit_minor: model.credit_minor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_line_is_invalid() {
        let line = JournalLine::debit("1102", 0);
        assert!(matches!(line.validate(), Err(EngineError::InvalidAmount(_))));
    }

    #[test]
    fn negative_side_is_invalid() {
        let line = JournalLine::credit("4100", -5);
        assert!(line.validate().is_err());
    }

    #[test]
    fn both_sides_are_allowed() {
        let line = JournalLine {
            account_code: "2200-a1".to_string(),
            debit_minor: 35_000,
            credit_minor: 2_500,
        };
        assert!(line.validate().is_ok());
    }
}
