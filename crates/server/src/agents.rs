//! Agent wallet endpoints

use api_types::agent::{AgentBalance, DepositCreated, DepositNew};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::DepositCmd;

use crate::{ServerError, server::ServerState};

pub async fn deposit(
    State(state): State<ServerState>,
    Path(agent_id): Path<String>,
    Json(payload): Json<DepositNew>,
) -> Result<(StatusCode, Json<DepositCreated>), ServerError> {
    let mut cmd = DepositCmd::new(agent_id.as_str(), payload.amount_minor).created_by("api");
    if let Some(key) = payload.idempotency_key {
        cmd = cmd.idempotency_key(key);
    }

    let entry_id = state.engine.deposit_agent_funds(cmd).await?;
    let balance_minor = state.engine.agent_balance(&agent_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(DepositCreated {
            entry_id,
            balance_minor,
        }),
    ))
}

pub async fn balance(
    State(state): State<ServerState>,
    Path(agent_id): Path<String>,
) -> Result<Json<AgentBalance>, ServerError> {
    let balance_minor = state.engine.agent_balance(&agent_id).await?;
    Ok(Json(AgentBalance {
        agent_id,
        balance_minor,
    }))
}
