use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use sea_orm::{QueryFilter, prelude::*};

use crate::{
    Account, AccountBalance, AccountCategory, AccountType, AgentTotal, BalanceSheetReport,
    Booking, BookingStatus, CostAnalysis, DailyReport, EngineError, EntryKind, JournalFilter,
    MonthlyReport, RankedTotal, ResultEngine, accounts, bookings, codes, flights, journal_lines,
    reports::{pct, ratio},
};

use super::{Engine, ledger::replay_balances};

const TOP_N: usize = 5;

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

fn month_start(year: i32, month: u32) -> ResultEngine<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| EngineError::InvalidAmount(format!("invalid month: {year}-{month:02}")))
}

fn next_month(date: NaiveDate) -> ResultEngine<NaiveDate> {
    date.checked_add_months(Months::new(1))
        .ok_or_else(|| EngineError::InvalidAmount("month out of range".to_string()))
}

fn prev_month(date: NaiveDate) -> ResultEngine<NaiveDate> {
    date.checked_sub_months(Months::new(1))
        .ok_or_else(|| EngineError::InvalidAmount("month out of range".to_string()))
}

fn is_sub_account_of(code: &str, parent: &str) -> bool {
    code.strip_prefix(parent)
        .is_some_and(|rest| rest.starts_with('-'))
}

impl Engine {
    /// Totals of one UTC day, re-derived from the journal and bookings.
    pub async fn daily_report(&self, date: NaiveDate) -> ResultEngine<DailyReport> {
        let from = day_start(date);
        let to = day_start(date + chrono::Days::new(1));
        let entries = self
            .journal_entries(JournalFilter {
                from: Some(from),
                to: Some(to),
                ..JournalFilter::default()
            })
            .await?;

        let mut report = DailyReport {
            date,
            sales_minor: 0,
            net_profit_minor: 0,
            receivables_minor: 0,
            payables_minor: 0,
            entries: entries.len() as u64,
            bookings_paid: 0,
            average_booking_minor: None,
        };
        for entry in &entries {
            for line in &entry.lines {
                let code = line.account_code.as_str();
                if code == codes::SALES {
                    report.sales_minor += line.credit_minor - line.debit_minor;
                }
                if code == codes::SYSTEM_PROFIT {
                    report.net_profit_minor += line.credit_minor - line.debit_minor;
                }
                if code == codes::CASH || is_sub_account_of(code, codes::AGENTS) {
                    // Only what bookings brought in; deposits are not sales.
                    match entry.kind {
                        EntryKind::Settlement => report.receivables_minor += line.debit_minor,
                        EntryKind::Reversal => report.receivables_minor -= line.credit_minor,
                        EntryKind::Deposit | EntryKind::Manual => {}
                    }
                }
                if is_sub_account_of(code, codes::SUPPLIERS) {
                    report.payables_minor += line.credit_minor - line.debit_minor;
                }
            }
        }

        let paid: Vec<Booking> = self
            .bookings_paid_between(from, to)
            .await?
            .into_iter()
            .filter(|b| b.status != BookingStatus::Cancelled)
            .collect();
        let totals: Vec<i64> = paid
            .iter()
            .filter_map(|b| b.financials.map(|f| f.total_minor))
            .collect();
        report.bookings_paid = paid.len() as u64;
        if !totals.is_empty() {
            report.average_booking_minor = Some(totals.iter().sum::<i64>() / totals.len() as i64);
        }
        Ok(report)
    }

    /// Revenue, growth, rankings and costs of the bookings paid in a month
    /// and not cancelled.
    pub async fn monthly_report(&self, year: i32, month: u32) -> ResultEngine<MonthlyReport> {
        let start = month_start(year, month)?;
        let end = next_month(start)?;
        let previous = prev_month(start)?;

        let current: Vec<Booking> = self
            .bookings_paid_between(day_start(start), day_start(end))
            .await?
            .into_iter()
            .filter(|b| b.status != BookingStatus::Cancelled)
            .collect();
        let previous_revenue_minor: i64 = self
            .bookings_paid_between(day_start(previous), day_start(start))
            .await?
            .iter()
            .filter(|b| b.status != BookingStatus::Cancelled)
            .filter_map(|b| b.financials.map(|f| f.total_minor))
            .sum();

        let flight_ids: Vec<String> = current.iter().map(|b| b.flight_id.to_string()).collect();
        let airlines: HashMap<String, (String, String)> = flights::Entity::find()
            .filter(flights::Column::Id.is_in(flight_ids))
            .all(&self.database)
            .await?
            .into_iter()
            .map(|f| (f.id, (f.airline_id, f.airline_name)))
            .collect();

        let mut revenue_minor = 0i64;
        let mut cost_minor = 0i64;
        let mut commission_minor = 0i64;
        let mut net_profit_minor = 0i64;
        let mut by_airline: BTreeMap<String, RankedTotal> = BTreeMap::new();
        let mut by_agent: BTreeMap<String, AgentTotal> = BTreeMap::new();

        for booking in &current {
            let Some(fin) = booking.financials else {
                continue;
            };
            revenue_minor += fin.total_minor;
            cost_minor += fin.cost_minor;
            commission_minor += fin.commission_minor;
            net_profit_minor += fin.net_profit_minor;

            if let Some((airline_id, airline_name)) = airlines.get(&booking.flight_id.to_string()) {
                let ranked = by_airline
                    .entry(airline_id.clone())
                    .or_insert_with(|| RankedTotal {
                        id: airline_id.clone(),
                        name: airline_name.clone(),
                        total_minor: 0,
                        count: 0,
                    });
                ranked.total_minor += fin.total_minor;
                ranked.count += 1;
            }
            if let Some(agent_id) = &booking.agent_id {
                let agent = by_agent
                    .entry(agent_id.clone())
                    .or_insert_with(|| AgentTotal {
                        agent_id: agent_id.clone(),
                        total_minor: 0,
                        commission_minor: 0,
                        count: 0,
                    });
                agent.total_minor += fin.total_minor;
                agent.commission_minor += fin.commission_minor;
                agent.count += 1;
            }
        }

        let mut top_airlines: Vec<RankedTotal> = by_airline.into_values().collect();
        top_airlines.sort_by(|a, b| b.total_minor.cmp(&a.total_minor).then(a.id.cmp(&b.id)));
        top_airlines.truncate(TOP_N);
        let mut top_agents: Vec<AgentTotal> = by_agent.into_values().collect();
        top_agents.sort_by(|a, b| {
            b.total_minor
                .cmp(&a.total_minor)
                .then(a.agent_id.cmp(&b.agent_id))
        });
        top_agents.truncate(TOP_N);

        Ok(MonthlyReport {
            year,
            month: start.month(),
            bookings: current.len() as u64,
            revenue_minor,
            previous_revenue_minor,
            growth_pct: pct(revenue_minor - previous_revenue_minor, previous_revenue_minor),
            top_airlines,
            top_agents,
            costs: CostAnalysis {
                cost_minor,
                commission_minor,
                cost_ratio_pct: pct(cost_minor, revenue_minor),
            },
            net_profit_minor,
        })
    }

    /// Balances re-derived by scanning every journal line, with totals and
    /// ratios. Stored balances are not read.
    pub async fn balance_sheet(&self) -> ResultEngine<BalanceSheetReport> {
        let accounts: Vec<Account> = accounts::Entity::find()
            .all(&self.database)
            .await?
            .into_iter()
            .map(Account::try_from)
            .collect::<ResultEngine<_>>()?;
        let types: HashMap<String, AccountType> = accounts
            .iter()
            .map(|a| (a.code.clone(), a.account_type))
            .collect();
        let lines = journal_lines::Entity::find().all(&self.database).await?;
        let balances = replay_balances(&types, &lines)?;

        let mut report = BalanceSheetReport {
            accounts: Vec::with_capacity(accounts.len()),
            assets_minor: 0,
            liabilities_minor: 0,
            equity_minor: 0,
            revenue_minor: 0,
            expenses_minor: 0,
            current_assets_minor: 0,
            current_liabilities_minor: 0,
            liquidity_ratio: None,
            debt_ratio: None,
            roi_pct: None,
        };
        for account in accounts {
            let balance_minor = balances.get(&account.code).copied().unwrap_or_default();
            let current = account.category == AccountCategory::Current;
            match account.account_type {
                AccountType::Asset => {
                    report.assets_minor += balance_minor;
                    if current {
                        report.current_assets_minor += balance_minor;
                    }
                }
                AccountType::Liability => {
                    report.liabilities_minor += balance_minor;
                    if current {
                        report.current_liabilities_minor += balance_minor;
                    }
                }
                AccountType::Equity => report.equity_minor += balance_minor,
                AccountType::Revenue => report.revenue_minor += balance_minor,
                AccountType::Expense => report.expenses_minor += balance_minor,
            }
            report.accounts.push(AccountBalance {
                code: account.code,
                name: account.name,
                account_type: account.account_type,
                category: account.category,
                balance_minor,
            });
        }
        report.accounts.sort_by(|a, b| a.code.cmp(&b.code));

        let sales = balances.get(codes::SALES).copied().unwrap_or_default();
        let cost_of_sales = balances.get(codes::COST_OF_SALES).copied().unwrap_or_default();
        report.liquidity_ratio = ratio(report.current_assets_minor, report.current_liabilities_minor);
        report.debt_ratio = ratio(report.liabilities_minor, report.assets_minor);
        report.roi_pct = pct(sales - cost_of_sales, cost_of_sales);
        Ok(report)
    }

    async fn bookings_paid_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> ResultEngine<Vec<Booking>> {
        bookings::Entity::find()
            .filter(bookings::Column::PaidAt.gte(from))
            .filter(bookings::Column::PaidAt.lt(to))
            .all(&self.database)
            .await?
            .into_iter()
            .map(Booking::try_from)
            .collect()
    }
}
