use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use std::sync::Arc;

use crate::{agents, bookings, flights, issuance, ledger, payments, reports};
use engine::Engine;

/// Listener and auth settings.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// When set, every request must carry `Authorization: Bearer <token>`.
    pub api_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3000,
            api_token: None,
        }
    }
}

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub api_token: Option<Arc<str>>,
}

impl ServerState {
    pub fn new(engine: Arc<Engine>, api_token: Option<String>) -> Self {
        Self {
            engine,
            api_token: api_token.filter(|t| !t.is_empty()).map(Arc::from),
        }
    }
}

async fn auth(
    auth_header: Option<TypedHeader<Authorization<Bearer>>>,
    State(state): State<ServerState>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if let Some(expected) = state.api_token.as_deref() {
        let Some(TypedHeader(header)) = auth_header else {
            return Err(StatusCode::UNAUTHORIZED);
        };
        if header.token() != expected {
            tracing::warn!("rejected request with a wrong api token");
            return Err(StatusCode::UNAUTHORIZED);
        }
    }

    Ok(next.run(request).await)
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/payments/confirm", post(payments::confirm))
        .route("/issuance", post(issuance::resolve))
        .route("/webhooks/whatsapp", post(issuance::whatsapp_webhook))
        .route("/bookings", post(bookings::create))
        .route("/bookings/{booking}", get(bookings::get))
        .route("/bookings/{booking}/cancel", post(bookings::cancel))
        .route("/flights", post(flights::create))
        .route("/flights/{id}/seats/{class}", put(flights::upsert_seats))
        .route("/agents/{agent_id}/deposit", post(agents::deposit))
        .route("/agents/{agent_id}/balance", get(agents::balance))
        .route("/accounts", get(ledger::accounts))
        .route("/accounts/{code}", get(ledger::account))
        .route("/journal", get(ledger::journal))
        .route("/reports/daily", get(reports::daily))
        .route("/reports/monthly", get(reports::monthly))
        .route("/reports/balance-sheet", get(reports::balance_sheet))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run(engine: Arc<Engine>, config: ServerConfig) {
    let addr = format!("{}:{}", config.bind, config.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {addr}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, config.api_token, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Arc<Engine>,
    api_token: Option<String>,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(ServerState::new(engine, api_token))).await
}
