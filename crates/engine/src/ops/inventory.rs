use sea_orm::{DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{CabinClass, EngineError, ResultEngine, SeatPool, SeatReservation, seat_pools};

use super::{Engine, with_tx};

impl Engine {
    /// Atomically takes `count` seats from a pool.
    ///
    /// The decrement is a single conditional update, so two requests for the
    /// last seat can never both succeed.
    pub async fn reserve_seats(
        &self,
        flight_id: Uuid,
        cabin_class: CabinClass,
        count: i32,
    ) -> ResultEngine<SeatReservation> {
        with_tx!(self, |db_tx| {
            self.reserve_seats_in(&db_tx, flight_id, cabin_class, count)
                .await
        })
    }

    pub(super) async fn reserve_seats_in(
        &self,
        db_tx: &DatabaseTransaction,
        flight_id: Uuid,
        cabin_class: CabinClass,
        count: i32,
    ) -> ResultEngine<SeatReservation> {
        if count <= 0 {
            return Err(EngineError::InvalidAmount(
                "seat count must be > 0".to_string(),
            ));
        }
        let updated = seat_pools::Entity::update_many()
            .col_expr(
                seat_pools::Column::SeatsAvailable,
                Expr::col(seat_pools::Column::SeatsAvailable).sub(count),
            )
            .filter(seat_pools::Column::FlightId.eq(flight_id.to_string()))
            .filter(seat_pools::Column::CabinClass.eq(cabin_class.as_str()))
            .filter(seat_pools::Column::SeatsAvailable.gte(count))
            .exec(db_tx)
            .await?
            .rows_affected;

        if updated == 0 {
            let pool = find_pool(db_tx, flight_id, cabin_class).await?;
            return Err(EngineError::InsufficientInventory(format!(
                "{flight_id} {cabin_class}: {} left, {count} requested",
                pool.seats_available
            )));
        }

        tracing::debug!("reserved {count} {cabin_class} seats on {flight_id}");
        Ok(SeatReservation {
            flight_id,
            cabin_class,
            count,
        })
    }

    /// Gives reserved seats back to their pool.
    pub async fn release_seats(&self, reservation: SeatReservation) -> ResultEngine<()> {
        with_tx!(self, |db_tx| self.release_seats_in(&db_tx, &reservation).await)
    }

    pub(super) async fn release_seats_in(
        &self,
        db_tx: &DatabaseTransaction,
        reservation: &SeatReservation,
    ) -> ResultEngine<()> {
        if reservation.count <= 0 {
            return Err(EngineError::InvalidAmount(
                "seat count must be > 0".to_string(),
            ));
        }
        let updated = seat_pools::Entity::update_many()
            .col_expr(
                seat_pools::Column::SeatsAvailable,
                Expr::col(seat_pools::Column::SeatsAvailable).add(reservation.count),
            )
            .filter(seat_pools::Column::FlightId.eq(reservation.flight_id.to_string()))
            .filter(seat_pools::Column::CabinClass.eq(reservation.cabin_class.as_str()))
            .exec(db_tx)
            .await?
            .rows_affected;
        if updated == 0 {
            return Err(missing_pool(reservation.flight_id, reservation.cabin_class));
        }
        tracing::debug!(
            "released {} {} seats on {}",
            reservation.count,
            reservation.cabin_class,
            reservation.flight_id
        );
        Ok(())
    }

    pub async fn seat_pool(
        &self,
        flight_id: Uuid,
        cabin_class: CabinClass,
    ) -> ResultEngine<SeatPool> {
        with_tx!(self, |db_tx| find_pool(&db_tx, flight_id, cabin_class).await)
    }
}

fn missing_pool(flight_id: Uuid, cabin_class: CabinClass) -> EngineError {
    EngineError::KeyNotFound(format!("seat pool {flight_id} {cabin_class}"))
}

pub(super) async fn find_pool(
    db_tx: &DatabaseTransaction,
    flight_id: Uuid,
    cabin_class: CabinClass,
) -> ResultEngine<SeatPool> {
    let model = seat_pools::Entity::find_by_id((
        flight_id.to_string(),
        cabin_class.as_str().to_string(),
    ))
    .one(db_tx)
    .await?
    .ok_or_else(|| missing_pool(flight_id, cabin_class))?;
    SeatPool::try_from(model)
}
