use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{ServerConfig, ServerState, router, run, run_with_listener};

mod agents;
mod bookings;
mod flights;
mod issuance;
mod ledger;
mod payments;
mod reports;
mod server;
mod views;

pub mod types {
    pub mod booking {
        pub use api_types::booking::{
            BookingCancel, BookingNew, BookingStatus, BookingView, Financials, Passenger,
        };
    }

    pub mod payment {
        pub use api_types::payment::{PaymentConfirm, PaymentConfirmed};
    }

    pub mod issuance {
        pub use api_types::issuance::{IssuanceReply, IssuanceResult, IssuanceStatus};
        pub use api_types::whatsapp::{WebhookAck, WebhookPayload};
    }

    pub mod flight {
        pub use api_types::flight::{FlightCreated, FlightNew, Pricing, SeatPoolUpsert, SeatPoolView};
    }

    pub mod agent {
        pub use api_types::agent::{AgentBalance, DepositCreated, DepositNew};
    }

    pub mod ledger {
        pub use api_types::ledger::{
            AccountView, JournalEntryView, JournalLineView, JournalQuery, JournalResponse,
        };
    }

    pub mod reports {
        pub use api_types::reports::{DailyQuery, MonthlyQuery};
        pub use engine::{BalanceSheetReport, DailyReport, MonthlyReport};
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::BookingNotFound(_)
        | EngineError::KeyNotFound(_)
        | EngineError::UnknownAccount(_) => StatusCode::NOT_FOUND,
        EngineError::AlreadySettled(_)
        | EngineError::InvalidTransition(_)
        | EngineError::ExistingKey(_) => StatusCode::CONFLICT,
        EngineError::LowConfidenceExtraction(_) => StatusCode::ACCEPTED,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::UnbalancedEntry(_)
        | EngineError::InsufficientInventory(_)
        | EngineError::InsufficientFunds(_)
        | EngineError::InvalidAmount(_)
        | EngineError::InvalidId(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), message_for_engine_error(err)),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::BookingNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let res = ServerError::from(EngineError::UnknownAccount("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_conflict_maps_to_409() {
        let res = ServerError::from(EngineError::InvalidTransition("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn engine_validation_maps_to_422() {
        let res =
            ServerError::from(EngineError::InsufficientInventory("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let res = ServerError::from(EngineError::InvalidAmount("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn database_errors_are_hidden() {
        let res = ServerError::from(EngineError::Database(sea_orm::DbErr::Custom(
            "secret".to_string(),
        )))
        .into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
