use sea_orm::{DatabaseTransaction, TransactionTrait, prelude::*, sea_query::OnConflict};
use uuid::Uuid;

use crate::{
    EngineError, Flight, NewFlightCmd, ResultEngine, SeatPool, SeatPoolCmd, flights, seat_pools,
    util::normalize_required_text,
};

use super::{Engine, inventory::find_pool, with_tx};

impl Engine {
    /// Adds a flight to the catalog.
    pub async fn new_flight(&self, cmd: NewFlightCmd) -> ResultEngine<Uuid> {
        cmd.pricing.validate()?;
        let flight = Flight {
            id: Uuid::new_v4(),
            airline_id: normalize_required_text(&cmd.airline_id, "airline id")?,
            airline_name: normalize_required_text(&cmd.airline_name, "airline name")?,
            flight_number: normalize_required_text(&cmd.flight_number, "flight number")?,
            origin: cmd.origin.trim().to_ascii_uppercase(),
            destination: cmd.destination.trim().to_ascii_uppercase(),
            departure_at: cmd.departure_at,
            pricing: cmd.pricing,
        };
        with_tx!(self, |db_tx| {
            flights::ActiveModel::from(&flight).insert(&db_tx).await?;
            tracing::info!("flight {} {} added", flight.flight_number, flight.id);
            Ok(flight.id)
        })
    }

    pub async fn flight(&self, flight_id: Uuid) -> ResultEngine<Flight> {
        with_tx!(self, |db_tx| find_flight(&db_tx, flight_id).await)
    }

    /// Creates or replaces a seat pool. Without explicit pricing the pool
    /// inherits the flight's headline pricing.
    pub async fn upsert_seat_pool(&self, cmd: SeatPoolCmd) -> ResultEngine<SeatPool> {
        if cmd.seats_available < 0 {
            return Err(EngineError::InvalidAmount(
                "seats_available must be >= 0".to_string(),
            ));
        }
        if let Some(pricing) = &cmd.pricing {
            pricing.validate()?;
        }

        with_tx!(self, |db_tx| {
            let flight = find_flight(&db_tx, cmd.flight_id).await?;
            let pool = SeatPool {
                flight_id: flight.id,
                cabin_class: cmd.cabin_class,
                seats_available: cmd.seats_available,
                pricing: cmd.pricing.unwrap_or(flight.pricing),
            };
            seat_pools::Entity::insert(seat_pools::ActiveModel::from(&pool))
                .on_conflict(
                    OnConflict::columns([
                        seat_pools::Column::FlightId,
                        seat_pools::Column::CabinClass,
                    ])
                    .update_columns([
                        seat_pools::Column::SeatsAvailable,
                        seat_pools::Column::SellingMinor,
                        seat_pools::Column::CostMinor,
                        seat_pools::Column::AgentCommissionMinor,
                    ])
                    .to_owned(),
                )
                .exec_without_returning(&db_tx)
                .await?;
            find_pool(&db_tx, pool.flight_id, pool.cabin_class).await
        })
    }
}

pub(super) async fn find_flight(
    db_tx: &DatabaseTransaction,
    flight_id: Uuid,
) -> ResultEngine<Flight> {
    let model = flights::Entity::find_by_id(flight_id.to_string())
        .one(db_tx)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound(format!("flight {flight_id}")))?;
    Flight::try_from(model)
}
