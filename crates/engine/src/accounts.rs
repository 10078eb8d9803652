//! Chart of accounts.
//!
//! An [`Account`] is a node of the chart, keyed by a stable string code
//! (`"4100"`). System accounts are seeded when the engine starts; per-agent
//! and per-airline sub-accounts are created on first use as
//! `"{parent_code}-{owner_id}"` and are never deleted.
//!
//! Balances are denormalized: the journal is the source of truth and
//! [`Engine::recompute_balances`](crate::Engine::recompute_balances) can
//! rebuild them at any time.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

/// Codes of the seeded system accounts.
pub mod codes {
    pub const ASSETS: &str = "1000";
    pub const CASH: &str = "1102";
    pub const LIABILITIES: &str = "2000";
    pub const SUPPLIERS: &str = "2100";
    pub const AGENTS: &str = "2200";
    pub const EQUITY: &str = "3000";
    pub const REVENUE: &str = "4000";
    pub const SALES: &str = "4100";
    pub const SYSTEM_PROFIT: &str = "4300";
    pub const PROFIT_CLEARING: &str = "4900";
    pub const EXPENSES: &str = "5000";
    pub const COST_OF_SALES: &str = "5100";
    pub const AGENT_COMMISSION: &str = "5200";
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Asset,
    Liability,
    Revenue,
    Expense,
    Equity,
}

impl AccountType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Liability => "liability",
            Self::Revenue => "revenue",
            Self::Expense => "expense",
            Self::Equity => "equity",
        }
    }

    /// `true` for accounts that grow on the debit side.
    pub fn is_debit_normal(self) -> bool {
        matches!(self, Self::Asset | Self::Expense)
    }

    /// Balance change produced by one posting on an account of this type.
    ///
    /// ASSET/EXPENSE: `debit - credit`; LIABILITY/REVENUE/EQUITY:
    /// `credit - debit`.
    pub fn balance_delta(self, debit_minor: i64, credit_minor: i64) -> i64 {
        if self.is_debit_normal() {
            debit_minor - credit_minor
        } else {
            credit_minor - debit_minor
        }
    }
}

impl TryFrom<&str> for AccountType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "asset" => Ok(Self::Asset),
            "liability" => Ok(Self::Liability),
            "revenue" => Ok(Self::Revenue),
            "expense" => Ok(Self::Expense),
            "equity" => Ok(Self::Equity),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid account type: {other}"
            ))),
        }
    }
}

/// Balance-sheet grouping, used for liquidity ratios.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountCategory {
    Current,
    Fixed,
    Operating,
}

impl AccountCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Fixed => "fixed",
            Self::Operating => "operating",
        }
    }
}

impl TryFrom<&str> for AccountCategory {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "current" => Ok(Self::Current),
            "fixed" => Ok(Self::Fixed),
            "operating" => Ok(Self::Operating),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid account category: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub category: AccountCategory,
    pub balance_minor: i64,
    pub parent_code: Option<String>,
    pub owner_id: Option<String>,
    pub is_system: bool,
}

impl Account {
    pub(crate) fn system(
        code: &str,
        name: &str,
        account_type: AccountType,
        category: AccountCategory,
        parent_code: Option<&str>,
    ) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            account_type,
            category,
            balance_minor: 0,
            parent_code: parent_code.map(ToString::to_string),
            owner_id: None,
            is_system: true,
        }
    }

    /// Builds the sub-account of `parent` owned by `owner_id`.
    pub(crate) fn sub_account_of(parent: &Account, owner_id: &str, name: String) -> Self {
        Self {
            code: sub_account_code(&parent.code, owner_id),
            name,
            account_type: parent.account_type,
            category: parent.category,
            balance_minor: 0,
            parent_code: Some(parent.code.clone()),
            owner_id: Some(owner_id.to_string()),
            is_system: false,
        }
    }
}

pub fn sub_account_code(parent_code: &str, owner_id: &str) -> String {
    format!("{parent_code}-{owner_id}")
}

/// The chart seeded on every start (missing rows only).
pub(crate) fn system_chart() -> Vec<Account> {
    use AccountCategory::{Current, Fixed, Operating};
    use AccountType::{Asset, Equity, Expense, Liability, Revenue};

    vec![
        Account::system(codes::ASSETS, "Assets", Asset, Fixed, None),
        Account::system(codes::CASH, "Cash and gateway wallets", Asset, Current, Some(codes::ASSETS)),
        Account::system(codes::LIABILITIES, "Liabilities", Liability, Current, None),
        Account::system(codes::SUPPLIERS, "Airline suppliers", Liability, Current, Some(codes::LIABILITIES)),
        Account::system(codes::AGENTS, "Agent wallets", Liability, Current, Some(codes::LIABILITIES)),
        Account::system(codes::EQUITY, "Equity", Equity, Fixed, None),
        Account::system(codes::REVENUE, "Revenue", Revenue, Operating, None),
        Account::system(codes::SALES, "Ticket sales", Revenue, Operating, Some(codes::REVENUE)),
        Account::system(codes::SYSTEM_PROFIT, "System net profit", Revenue, Operating, Some(codes::REVENUE)),
        Account::system(codes::PROFIT_CLEARING, "Profit clearing", Revenue, Operating, Some(codes::REVENUE)),
        Account::system(codes::EXPENSES, "Expenses", Expense, Operating, None),
        Account::system(codes::COST_OF_SALES, "Cost of sales", Expense, Operating, Some(codes::EXPENSES)),
        Account::system(codes::AGENT_COMMISSION, "Agent commissions", Expense, Operating, Some(codes::EXPENSES)),
    ]
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub code: String,
    pub name: String,
    pub account_type: String,
    pub category: String,
    pub balance_minor: i64,
    pub parent_code: Option<String>,
    pub owner_id: Option<String>,
    pub is_system: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Account> for ActiveModel {
    fn from(account: &Account) -> Self {
        Self {
            code: ActiveValue::Set(account.code.clone()),
            name: ActiveValue::Set(account.name.clone()),
            account_type: ActiveValue::Set(account.account_type.as_str().to_string()),
            category: ActiveValue::Set(account.category.as_str().to_string()),
            balance_minor: ActiveValue::Set(account.balance_minor),
            parent_code: ActiveValue::Set(account.parent_code.clone()),
            owner_id: ActiveValue::Set(account.owner_id.clone()),
            is_system: ActiveValue::Set(account.is_system),
        }
    }
}

impl TryFrom<Model> for Account {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            account_type: AccountType::try_from(model.account_type.as_str())?,
            category: AccountCategory::try_from(model.category.as_str())?,
            code: model.code,
            name: model.name,
            balance_minor: model.balance_minor,
            parent_code: model.parent_code,
            owner_id: model.owner_id,
            is_system: model.is_system,
        })
    }
}
