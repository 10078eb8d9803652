//! Payment confirmation endpoint

use api_types::payment::{PaymentConfirm, PaymentConfirmed};
use axum::{Json, extract::State};
use engine::{EngineError, SettlePaymentCmd};

use crate::{ServerError, server::ServerState, views};

/// Settles a draft booking.
///
/// A confirmation for a booking that is already settled is answered with
/// `already_settled: true`, so gateways can retry safely.
pub async fn confirm(
    State(state): State<ServerState>,
    Json(payload): Json<PaymentConfirm>,
) -> Result<Json<PaymentConfirmed>, ServerError> {
    let mut cmd = SettlePaymentCmd::new(
        payload.booking_id,
        views::payment_method(payload.payment_method),
    )
    .created_by("api");
    if let Some(amount_minor) = payload.amount_minor {
        cmd = cmd.amount_minor(amount_minor);
    }

    match state.engine.settle_payment(cmd).await {
        Ok(booking) => Ok(Json(PaymentConfirmed {
            already_settled: false,
            booking: Some(views::booking_view(booking)),
        })),
        Err(EngineError::AlreadySettled(reference)) => {
            tracing::debug!("duplicate payment confirmation for {reference}");
            let booking = state.engine.booking(payload.booking_id).await?;
            Ok(Json(PaymentConfirmed {
                already_settled: true,
                booking: Some(views::booking_view(booking)),
            }))
        }
        Err(err) => Err(err.into()),
    }
}
