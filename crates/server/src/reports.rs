//! Report endpoints

use api_types::reports::{DailyQuery, MonthlyQuery};
use axum::{
    Json,
    extract::{Query, State},
};
use chrono::Utc;
use engine::{BalanceSheetReport, DailyReport, MonthlyReport};

use crate::{ServerError, server::ServerState};

/// Parses `YYYY-MM`.
fn parse_month(value: &str) -> Result<(i32, u32), ServerError> {
    let invalid = || ServerError::Generic(format!("invalid month {value:?}, expected YYYY-MM"));
    let (year, month) = value.trim().split_once('-').ok_or_else(invalid)?;
    let year = year.parse().map_err(|_| invalid())?;
    let month = month.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }
    Ok((year, month))
}

pub async fn daily(
    State(state): State<ServerState>,
    Query(query): Query<DailyQuery>,
) -> Result<Json<DailyReport>, ServerError> {
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    Ok(Json(state.engine.daily_report(date).await?))
}

pub async fn monthly(
    State(state): State<ServerState>,
    Query(query): Query<MonthlyQuery>,
) -> Result<Json<MonthlyReport>, ServerError> {
    let (year, month) = parse_month(&query.month)?;
    Ok(Json(state.engine.monthly_report(year, month).await?))
}

pub async fn balance_sheet(
    State(state): State<ServerState>,
) -> Result<Json<BalanceSheetReport>, ServerError> {
    Ok(Json(state.engine.balance_sheet().await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_must_be_year_dash_month() {
        assert_eq!(parse_month("2026-03").ok(), Some((2026, 3)));
        assert!(parse_month("2026-13").is_err());
        assert!(parse_month("202603").is_err());
        assert!(parse_month("march").is_err());
    }
}
