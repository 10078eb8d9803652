//! Booking API endpoints

use api_types::booking::{BookingCancel, BookingNew, BookingView};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{Booking, NewDraftBookingCmd};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, views};

/// Resolves a path segment holding either a booking id or a reference.
async fn find(state: &ServerState, key: &str) -> Result<Booking, ServerError> {
    let booking = match Uuid::parse_str(key) {
        Ok(id) => state.engine.booking(id).await?,
        Err(_) => state.engine.booking_by_reference(key).await?,
    };
    Ok(booking)
}

/// Handle requests for creating a draft booking
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<BookingNew>,
) -> Result<(StatusCode, Json<BookingView>), ServerError> {
    let mut cmd = NewDraftBookingCmd::new(payload.flight_id, payload.customer_id);
    if let Some(class) = payload.cabin_class {
        cmd = cmd.cabin_class(views::cabin_class(class));
    }
    if let Some(agent_id) = payload.agent_id {
        cmd = cmd.agent(agent_id);
    }
    for passenger in payload.passengers {
        cmd = cmd.passenger(views::passenger(passenger));
    }

    let booking = state.engine.create_draft_booking(cmd).await?;
    Ok((StatusCode::CREATED, Json(views::booking_view(booking))))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(key): Path<String>,
) -> Result<Json<BookingView>, ServerError> {
    Ok(Json(views::booking_view(find(&state, &key).await?)))
}

pub async fn cancel(
    State(state): State<ServerState>,
    Path(key): Path<String>,
    payload: Option<Json<BookingCancel>>,
) -> Result<Json<BookingView>, ServerError> {
    let booking = find(&state, &key).await?;
    let reason = payload.and_then(|Json(p)| p.reason);
    let booking = state
        .engine
        .cancel_booking(booking.id, reason.as_deref())
        .await?;
    Ok(Json(views::booking_view(booking)))
}
