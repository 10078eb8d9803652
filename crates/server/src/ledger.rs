//! Ledger read endpoints

use api_types::ledger::{AccountView, JournalQuery, JournalResponse};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use engine::{EntryKind, JournalFilter};

use crate::{ServerError, server::ServerState, views};

const MAX_JOURNAL_LIMIT: u64 = 500;

pub async fn accounts(
    State(state): State<ServerState>,
) -> Result<Json<Vec<AccountView>>, ServerError> {
    let accounts = state.engine.accounts().await?;
    Ok(Json(accounts.into_iter().map(views::account_view).collect()))
}

pub async fn account(
    State(state): State<ServerState>,
    Path(code): Path<String>,
) -> Result<Json<AccountView>, ServerError> {
    Ok(Json(views::account_view(state.engine.account(&code).await?)))
}

/// Journal entries in `[from, to)`, oldest first.
pub async fn journal(
    State(state): State<ServerState>,
    Query(query): Query<JournalQuery>,
) -> Result<Json<JournalResponse>, ServerError> {
    let kind = query
        .kind
        .as_deref()
        .map(EntryKind::try_from)
        .transpose()?;
    let filter = JournalFilter {
        from: query.from,
        to: query.to,
        reference: query.reference,
        kind,
        limit: Some(query.limit.unwrap_or(MAX_JOURNAL_LIMIT).min(MAX_JOURNAL_LIMIT)),
    };

    let entries = state.engine.journal_entries(filter).await?;
    Ok(Json(JournalResponse {
        entries: entries.into_iter().map(views::journal_entry_view).collect(),
    }))
}
