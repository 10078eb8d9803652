//! Report projections.
//!
//! These are plain values computed from the journal and the bookings on
//! every call (see `ops::reports`). Nothing is cached or stored.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{AccountCategory, AccountType};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DailyReport {
    pub date: NaiveDate,
    /// Credits minus debits on 4100, so same-day cancellations net out.
    pub sales_minor: i64,
    /// Credits minus debits on 4300.
    pub net_profit_minor: i64,
    /// Cash and agent-wallet debits of settlements, less their reversals.
    pub receivables_minor: i64,
    /// Credits minus debits on airline supplier sub-accounts.
    pub payables_minor: i64,
    pub entries: u64,
    /// Paid that day and not cancelled since.
    pub bookings_paid: u64,
    pub average_booking_minor: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedTotal {
    pub id: String,
    pub name: String,
    pub total_minor: i64,
    pub count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentTotal {
    pub agent_id: String,
    pub total_minor: i64,
    pub commission_minor: i64,
    pub count: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CostAnalysis {
    pub cost_minor: i64,
    pub commission_minor: i64,
    /// `cost / revenue * 100`.
    pub cost_ratio_pct: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonthlyReport {
    pub year: i32,
    pub month: u32,
    pub bookings: u64,
    pub revenue_minor: i64,
    pub previous_revenue_minor: i64,
    pub growth_pct: Option<f64>,
    pub top_airlines: Vec<RankedTotal>,
    pub top_agents: Vec<AgentTotal>,
    pub costs: CostAnalysis,
    pub net_profit_minor: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub category: AccountCategory,
    pub balance_minor: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheetReport {
    pub accounts: Vec<AccountBalance>,
    pub assets_minor: i64,
    pub liabilities_minor: i64,
    pub equity_minor: i64,
    pub revenue_minor: i64,
    pub expenses_minor: i64,
    pub current_assets_minor: i64,
    pub current_liabilities_minor: i64,
    /// Current assets / current liabilities.
    pub liquidity_ratio: Option<f64>,
    /// Liabilities / assets.
    pub debt_ratio: Option<f64>,
    /// (sales - cost of sales) / cost of sales * 100.
    pub roi_pct: Option<f64>,
}

/// `numerator / denominator`, `None` when the denominator is zero.
pub(crate) fn ratio(numerator: i64, denominator: i64) -> Option<f64> {
    (denominator != 0).then(|| numerator as f64 / denominator as f64)
}

pub(crate) fn pct(numerator: i64, denominator: i64) -> Option<f64> {
    ratio(numerator, denominator).map(|r| r * 100.0)
}
