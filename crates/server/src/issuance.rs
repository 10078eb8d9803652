//! Issuance endpoints: staff replies and the WhatsApp webhook

use api_types::{
    issuance::{IssuanceReply, IssuanceResult, IssuanceStatus},
    whatsapp::{WebhookAck, WebhookPayload},
};
use axum::{Json, extract::State, http::StatusCode};
use engine::EngineError;

use crate::{ServerError, server::ServerState, views};

/// Completes a booking from a staff reply.
///
/// A reply that cannot be read with confidence is answered `202` with
/// `needs_review` and changes nothing.
pub async fn resolve(
    State(state): State<ServerState>,
    Json(payload): Json<IssuanceReply>,
) -> Result<(StatusCode, Json<IssuanceResult>), ServerError> {
    match state
        .engine
        .resolve_issuance(&payload.text, payload.booking_ref.as_deref())
        .await
    {
        Ok(booking) => Ok((
            StatusCode::OK,
            Json(IssuanceResult {
                status: IssuanceStatus::Ready,
                booking: Some(views::booking_view(booking)),
                reason: None,
            }),
        )),
        Err(EngineError::LowConfidenceExtraction(reason)) => Ok((
            StatusCode::ACCEPTED,
            Json(IssuanceResult {
                status: IssuanceStatus::NeedsReview,
                booking: None,
                reason: Some(reason),
            }),
        )),
        Err(err) => Err(err.into()),
    }
}

/// Inbound WhatsApp messages.
///
/// Always answers `200` so the provider does not redeliver; each message
/// outcome is logged and counted in the ack.
///
/// Messages carry no booking hint, so only bodies that quote a `RES-`
/// reference can resolve. A bare `PNR TICKET` template reply is counted as
/// `needs_review` and staff finish it through `POST /issuance`.
pub async fn whatsapp_webhook(
    State(state): State<ServerState>,
    Json(payload): Json<WebhookPayload>,
) -> Json<WebhookAck> {
    let mut ack = WebhookAck::default();
    for body in payload.text_bodies() {
        match state.engine.resolve_issuance(body, None).await {
            Ok(booking) => ack.ready.push(booking.reference),
            Err(err) if err.is_soft() => ack.needs_review += 1,
            Err(err) => {
                tracing::warn!("whatsapp message not applied: {err}");
                ack.rejected += 1;
            }
        }
    }
    Json(ack)
}
