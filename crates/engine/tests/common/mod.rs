#![allow(dead_code)]

use chrono::{Duration, Utc};
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

use engine::{
    Booking, CabinClass, DepositCmd, Engine, NewDraftBookingCmd, NewFlightCmd, PassengerSnapshot,
    PostingPoint, Pricing, SeatPoolCmd,
};
use migration::MigratorTrait;

pub const AIRLINE: &str = "ms";

pub async fn engine_with_db() -> (Engine, DatabaseConnection) {
    engine_with_posting(PostingPoint::Payment).await
}

pub async fn engine_with_posting(posting_point: PostingPoint) -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .posting_point(posting_point)
        .build()
        .await
        .unwrap();
    (engine, db)
}

/// A flight selling at 350.00 with cost 200.00 and 25.00 agent commission,
/// with `seats` economy seats.
pub async fn flight_with_seats(engine: &Engine, seats: i32) -> Uuid {
    let flight_id = engine
        .new_flight(
            NewFlightCmd::new(
                AIRLINE,
                "MS 915",
                Utc::now() + Duration::days(30),
                Pricing::new(35_000, 20_000, 2_500),
            )
            .airline_name("EgyptAir")
            .route("cai", "jed"),
        )
        .await
        .unwrap();
    engine
        .upsert_seat_pool(SeatPoolCmd::new(flight_id, CabinClass::Economy, seats))
        .await
        .unwrap();
    flight_id
}

pub fn passenger(name: &str) -> PassengerSnapshot {
    PassengerSnapshot::new(name).passport("A1234567", None)
}

pub async fn direct_draft(engine: &Engine, flight_id: Uuid) -> Booking {
    engine
        .create_draft_booking(
            NewDraftBookingCmd::new(flight_id, "cust-1").passenger(passenger("Sara Ali")),
        )
        .await
        .unwrap()
}

pub async fn agent_draft(engine: &Engine, flight_id: Uuid, agent_id: &str) -> Booking {
    engine
        .create_draft_booking(
            NewDraftBookingCmd::new(flight_id, "cust-2")
                .agent(agent_id)
                .passenger(passenger("Omar Said")),
        )
        .await
        .unwrap()
}

pub async fn fund_agent(engine: &Engine, agent_id: &str, amount_minor: i64) {
    engine
        .deposit_agent_funds(DepositCmd::new(agent_id, amount_minor))
        .await
        .unwrap();
}

pub async fn seats_left(engine: &Engine, flight_id: Uuid) -> i32 {
    engine
        .seat_pool(flight_id, CabinClass::Economy)
        .await
        .unwrap()
        .seats_available
}
