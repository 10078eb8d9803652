//! Flight catalog endpoints

use api_types::flight::{FlightCreated, FlightNew, SeatPoolUpsert, SeatPoolView};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{CabinClass, NewFlightCmd, SeatPoolCmd};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, views};

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<FlightNew>,
) -> Result<(StatusCode, Json<FlightCreated>), ServerError> {
    let mut cmd = NewFlightCmd::new(
        payload.airline_id,
        payload.flight_number,
        payload.departure_at,
        views::pricing(payload.pricing),
    )
    .route(payload.origin, payload.destination);
    if let Some(name) = payload.airline_name {
        cmd = cmd.airline_name(name);
    }

    let id = state.engine.new_flight(cmd).await?;
    Ok((StatusCode::CREATED, Json(FlightCreated { id })))
}

pub async fn upsert_seats(
    State(state): State<ServerState>,
    Path((flight_id, class)): Path<(Uuid, String)>,
    Json(payload): Json<SeatPoolUpsert>,
) -> Result<Json<SeatPoolView>, ServerError> {
    let class: CabinClass = class.parse()?;
    let mut cmd = SeatPoolCmd::new(flight_id, class, payload.seats_available);
    if let Some(pricing) = payload.pricing {
        cmd = cmd.pricing(views::pricing(pricing));
    }

    let pool = state.engine.upsert_seat_pool(cmd).await?;
    Ok(Json(views::seat_pool_view(pool)))
}
