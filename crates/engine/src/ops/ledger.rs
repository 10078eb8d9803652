use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use sea_orm::{
    DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*,
    sea_query::{Expr, OnConflict},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Account, AccountType, DepositCmd, EngineError, EntryKind, JournalEntry, JournalLine,
    NewJournalEntry, ResultEngine, accounts, codes, journal, journal_lines, sub_account_code,
    util::{normalize_required_text, parse_uuid},
};

use super::{Engine, with_tx};

/// Filters for listing journal entries.
///
/// `from` is inclusive and `to` is exclusive (`[from, to)`), both in UTC.
#[derive(Clone, Debug, Default)]
pub struct JournalFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub reference: Option<String>,
    pub kind: Option<EntryKind>,
    pub limit: Option<u64>,
}

/// An account whose stored balance disagreed with the journal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceDrift {
    pub code: String,
    pub stored_minor: i64,
    pub computed_minor: i64,
}

/// Replays `lines` over `accounts`, starting every balance from zero.
pub(super) fn replay_balances(
    accounts: &HashMap<String, AccountType>,
    lines: &[journal_lines::Model],
) -> ResultEngine<BTreeMap<String, i64>> {
    let mut balances: BTreeMap<String, i64> =
        accounts.keys().map(|code| (code.clone(), 0)).collect();
    for line in lines {
        let account_type = accounts
            .get(&line.account_code)
            .ok_or_else(|| EngineError::UnknownAccount(line.account_code.clone()))?;
        let balance = balances.entry(line.account_code.clone()).or_insert(0);
        *balance = balance
            .checked_add(account_type.balance_delta(line.debit_minor, line.credit_minor))
            .ok_or_else(|| EngineError::InvalidAmount("balance overflow".to_string()))?;
    }
    Ok(balances)
}

impl Engine {
    /// Posts a balanced entry and applies its balance changes atomically.
    ///
    /// When `idempotency_key` is set and an entry with that key already
    /// exists, its id is returned and nothing is posted.
    pub async fn post_entry(&self, entry: NewJournalEntry) -> ResultEngine<Uuid> {
        entry.validate()?;
        with_tx!(self, |db_tx| self.post_entry_in(&db_tx, &entry).await)
    }

    pub(super) async fn post_entry_in(
        &self,
        db_tx: &DatabaseTransaction,
        entry: &NewJournalEntry,
    ) -> ResultEngine<Uuid> {
        entry.validate()?;

        if let Some(key) = entry.idempotency_key.as_deref()
            && let Some(existing) = find_by_key(db_tx, key).await?
        {
            return parse_uuid(&existing.id, "journal entry");
        }

        // Net change per account, in code order.
        let mut sides: BTreeMap<&str, (i64, i64)> = BTreeMap::new();
        for line in &entry.lines {
            let side = sides.entry(line.account_code.as_str()).or_insert((0, 0));
            side.0 += line.debit_minor;
            side.1 += line.credit_minor;
        }

        let account_codes: Vec<String> = sides.keys().map(ToString::to_string).collect();
        let types: HashMap<String, AccountType> = accounts::Entity::find()
            .filter(accounts::Column::Code.is_in(account_codes))
            .all(db_tx)
            .await?
            .into_iter()
            .map(|m| AccountType::try_from(m.account_type.as_str()).map(|t| (m.code.clone(), t)))
            .collect::<ResultEngine<_>>()?;
        if let Some(missing) = sides.keys().find(|code| !types.contains_key(**code)) {
            return Err(EngineError::UnknownAccount((*missing).to_string()));
        }

        let id = Uuid::new_v4();
        if let Err(err) = journal::ActiveModel::new_entry(id, entry).insert(db_tx).await {
            // Lost a race on the idempotency key.
            if let Some(key) = entry.idempotency_key.as_deref()
                && let Some(existing) = find_by_key(db_tx, key).await?
            {
                return parse_uuid(&existing.id, "journal entry");
            }
            return Err(err.into());
        }
        for (position, line) in entry.lines.iter().enumerate() {
            let position = i32::try_from(position)
                .map_err(|_| EngineError::InvalidAmount("too many lines".to_string()))?;
            journal_lines::ActiveModel::new_line(id, position, line)
                .insert(db_tx)
                .await?;
        }

        for (code, (debit, credit)) in sides {
            let delta = types[code].balance_delta(debit, credit);
            if delta == 0 {
                continue;
            }
            accounts::Entity::update_many()
                .col_expr(
                    accounts::Column::BalanceMinor,
                    Expr::col(accounts::Column::BalanceMinor).add(delta),
                )
                .filter(accounts::Column::Code.eq(code))
                .exec(db_tx)
                .await?;
        }

        tracing::debug!(
            "posted {} entry {id} ({} lines)",
            entry.kind.as_str(),
            entry.lines.len()
        );
        Ok(id)
    }

    pub async fn account(&self, code: &str) -> ResultEngine<Account> {
        let model = accounts::Entity::find_by_id(code.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::UnknownAccount(code.to_string()))?;
        Account::try_from(model)
    }

    pub async fn accounts(&self) -> ResultEngine<Vec<Account>> {
        accounts::Entity::find()
            .order_by_asc(accounts::Column::Code)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Account::try_from)
            .collect()
    }

    /// Returns the `(parent_code, owner_id)` sub-account, creating it on
    /// first use with the parent's type and category.
    pub async fn upsert_sub_account(
        &self,
        parent_code: &str,
        owner_id: &str,
        name: &str,
    ) -> ResultEngine<Account> {
        with_tx!(self, |db_tx| {
            self.upsert_sub_account_in(&db_tx, parent_code, owner_id, name)
                .await
        })
    }

    pub(super) async fn upsert_sub_account_in(
        &self,
        db_tx: &DatabaseTransaction,
        parent_code: &str,
        owner_id: &str,
        name: &str,
    ) -> ResultEngine<Account> {
        let owner_id = normalize_required_text(owner_id, "owner id")?;
        let code = sub_account_code(parent_code, &owner_id);
        if let Some(existing) = accounts::Entity::find_by_id(code.clone()).one(db_tx).await? {
            return Account::try_from(existing);
        }

        let parent = accounts::Entity::find_by_id(parent_code.to_string())
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::UnknownAccount(parent_code.to_string()))?;
        let parent = Account::try_from(parent)?;
        let name = match name.trim() {
            "" => format!("{} {owner_id}", parent.name),
            trimmed => trimmed.to_string(),
        };
        let account = Account::sub_account_of(&parent, &owner_id, name);
        accounts::Entity::insert(accounts::ActiveModel::from(&account))
            .on_conflict(
                OnConflict::column(accounts::Column::Code)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db_tx)
            .await?;
        tracing::info!("opened sub-account {code}");

        let model = accounts::Entity::find_by_id(code.clone())
            .one(db_tx)
            .await?
            .ok_or(EngineError::UnknownAccount(code))?;
        Account::try_from(model)
    }

    pub async fn journal_entries(&self, filter: JournalFilter) -> ResultEngine<Vec<JournalEntry>> {
        if let (Some(from), Some(to)) = (filter.from, filter.to)
            && from >= to
        {
            return Err(EngineError::InvalidAmount(
                "invalid range: from must be < to".to_string(),
            ));
        }

        let mut query = journal::Entity::find();
        if let Some(from) = filter.from {
            query = query.filter(journal::Column::OccurredAt.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(journal::Column::OccurredAt.lt(to));
        }
        if let Some(reference) = filter.reference.as_deref() {
            query = query.filter(journal::Column::Reference.eq(reference));
        }
        if let Some(kind) = filter.kind {
            query = query.filter(journal::Column::Kind.eq(kind.as_str()));
        }
        query = query
            .order_by_asc(journal::Column::OccurredAt)
            .order_by_asc(journal::Column::Id);
        if let Some(limit) = filter.limit {
            query = query.limit(limit);
        }
        let entries = query.all(&self.database).await?;
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = entries.iter().map(|e| e.id.clone()).collect();
        let mut lines_by_entry: HashMap<String, Vec<journal_lines::Model>> = HashMap::new();
        for line in journal_lines::Entity::find()
            .filter(journal_lines::Column::EntryId.is_in(ids))
            .all(&self.database)
            .await?
        {
            lines_by_entry
                .entry(line.entry_id.clone())
                .or_default()
                .push(line);
        }

        entries
            .into_iter()
            .map(|entry| {
                let lines = lines_by_entry.remove(&entry.id).unwrap_or_default();
                JournalEntry::try_from((entry, lines))
            })
            .collect()
    }

    pub async fn journal_entry(&self, entry_id: Uuid) -> ResultEngine<JournalEntry> {
        with_tx!(self, |db_tx| load_entry(&db_tx, entry_id).await)
    }

    /// Rebuilds every stored balance from the journal.
    ///
    /// Returns the accounts that had drifted; they are repaired in the same
    /// transaction.
    pub async fn recompute_balances(&self) -> ResultEngine<Vec<BalanceDrift>> {
        with_tx!(self, |db_tx| {
            let models = accounts::Entity::find().all(&db_tx).await?;
            let mut stored: HashMap<String, i64> = HashMap::new();
            let mut types: HashMap<String, AccountType> = HashMap::new();
            for model in models {
                let account = Account::try_from(model)?;
                stored.insert(account.code.clone(), account.balance_minor);
                types.insert(account.code, account.account_type);
            }

            let lines = journal_lines::Entity::find().all(&db_tx).await?;
            let computed = replay_balances(&types, &lines)?;

            let mut drifts = Vec::new();
            for (code, computed_minor) in computed {
                let stored_minor = stored.get(&code).copied().unwrap_or_default();
                if stored_minor == computed_minor {
                    continue;
                }
                accounts::Entity::update_many()
                    .col_expr(accounts::Column::BalanceMinor, Expr::value(computed_minor))
                    .filter(accounts::Column::Code.eq(code.as_str()))
                    .exec(&db_tx)
                    .await?;
                tracing::warn!("balance drift on {code}: stored {stored_minor}, journal {computed_minor}");
                drifts.push(BalanceDrift {
                    code,
                    stored_minor,
                    computed_minor,
                });
            }
            Ok(drifts)
        })
    }

    /// Credits an agent wallet: Dr cash / Cr `2200-{agent}`.
    pub async fn deposit_agent_funds(&self, cmd: DepositCmd) -> ResultEngine<Uuid> {
        let DepositCmd {
            agent_id,
            amount_minor,
            idempotency_key,
            occurred_at,
            created_by,
        } = cmd;
        if amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "deposit amount must be > 0".to_string(),
            ));
        }
        let agent_id = normalize_required_text(&agent_id, "agent id")?;

        with_tx!(self, |db_tx| {
            let wallet = self
                .upsert_sub_account_in(&db_tx, codes::AGENTS, &agent_id, "")
                .await?;
            let mut entry = NewJournalEntry::new(
                EntryKind::Deposit,
                format!("Wallet deposit for agent {agent_id}"),
                created_by,
                occurred_at,
            )
            .line(JournalLine::debit(codes::CASH, amount_minor))
            .line(JournalLine::credit(wallet.code, amount_minor));
            if let Some(key) = idempotency_key {
                entry = entry.idempotency_key(key);
            }
            self.post_entry_in(&db_tx, &entry).await
        })
    }

    /// Current wallet balance of an agent; zero before the first deposit.
    pub async fn agent_balance(&self, agent_id: &str) -> ResultEngine<i64> {
        let code = sub_account_code(codes::AGENTS, agent_id.trim());
        Ok(accounts::Entity::find_by_id(code)
            .one(&self.database)
            .await?
            .map(|m| m.balance_minor)
            .unwrap_or_default())
    }
}

async fn find_by_key(
    db_tx: &DatabaseTransaction,
    key: &str,
) -> ResultEngine<Option<journal::Model>> {
    Ok(journal::Entity::find()
        .filter(journal::Column::IdempotencyKey.eq(key))
        .one(db_tx)
        .await?)
}

pub(super) async fn load_entry(
    db_tx: &DatabaseTransaction,
    entry_id: Uuid,
) -> ResultEngine<JournalEntry> {
    let entry = journal::Entity::find_by_id(entry_id.to_string())
        .one(db_tx)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound(format!("journal entry {entry_id}")))?;
    let lines = journal_lines::Entity::find()
        .filter(journal_lines::Column::EntryId.eq(entry.id.as_str()))
        .order_by_asc(journal_lines::Column::Position)
        .all(db_tx)
        .await?;
    JournalEntry::try_from((entry, lines))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(code: &str, debit: i64, credit: i64) -> journal_lines::Model {
        journal_lines::Model {
            id: Uuid::new_v4().to_string(),
            entry_id: "e".to_string(),
            position: 0,
            account_code: code.to_string(),
            debit_minor: debit,
            credit_minor: credit,
        }
    }

    #[test]
    fn replay_follows_account_types() {
        let types = HashMap::from([
            ("1102".to_string(), AccountType::Asset),
            ("4100".to_string(), AccountType::Revenue),
            ("2200-a".to_string(), AccountType::Liability),
        ]);
        let lines = [
            line("1102", 50_000, 0),
            line("2200-a", 0, 50_000),
            line("2200-a", 35_000, 2_500),
            line("4100", 0, 35_000),
        ];
        let balances = replay_balances(&types, &lines).unwrap();
        assert_eq!(balances["1102"], 50_000);
        assert_eq!(balances["2200-a"], 17_500);
        assert_eq!(balances["4100"], 35_000);
    }

    #[test]
    fn replay_rejects_unknown_accounts() {
        let types = HashMap::from([("1102".to_string(), AccountType::Asset)]);
        let err = replay_balances(&types, &[line("9999", 1, 0)]).unwrap_err();
        assert_eq!(err, EngineError::UnknownAccount("9999".to_string()));
    }
}
