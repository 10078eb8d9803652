//! Seat inventory per flight and cabin class.
//!
//! `seats_available` never goes below zero: every decrement is a conditional
//! update guarded by `seats_available >= count` (see
//! [`Engine::reserve_seats`](crate::Engine::reserve_seats)).

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

use crate::{EngineError, Pricing, ResultEngine, util::parse_uuid};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CabinClass {
    #[default]
    Economy,
    Business,
    First,
}

impl CabinClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Economy => "economy",
            Self::Business => "business",
            Self::First => "first",
        }
    }
}

impl fmt::Display for CabinClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for CabinClass {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "economy" => Ok(Self::Economy),
            "business" => Ok(Self::Business),
            "first" => Ok(Self::First),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid cabin class: {other}"
            ))),
        }
    }
}

impl FromStr for CabinClass {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatPool {
    pub flight_id: Uuid,
    pub cabin_class: CabinClass,
    pub seats_available: i32,
    pub pricing: Pricing,
}

/// Seats taken out of a pool. Giving it back to
/// [`Engine::release_seats`](crate::Engine::release_seats) returns them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatReservation {
    pub flight_id: Uuid,
    pub cabin_class: CabinClass,
    pub count: i32,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "seat_pools")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub flight_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub cabin_class: String,
    pub seats_available: i32,
    pub selling_minor: i64,
    pub cost_minor: i64,
    pub agent_commission_minor: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::flights::Entity",
        from = "Column::FlightId",
        to = "super::flights::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Flights,
}

impl Related<super::flights::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Flights.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&SeatPool> for ActiveModel {
    fn from(pool: &SeatPool) -> Self {
        Self {
            flight_id: ActiveValue::Set(pool.flight_id.to_string()),
            cabin_class: ActiveValue::Set(pool.cabin_class.as_str().to_string()),
            seats_available: ActiveValue::Set(pool.seats_available),
            selling_minor: ActiveValue::Set(pool.pricing.selling_minor),
            cost_minor: ActiveValue::Set(pool.pricing.cost_minor),
            agent_commission_minor: ActiveValue::Set(pool.pricing.agent_commission_minor),
        }
    }
}

impl TryFrom<Model> for SeatPool {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            flight_id: parse_uuid(&model.flight_id, "flight")?,
            cabin_class: CabinClass::try_from(model.cabin_class.as_str())?,
            seats_available: model.seats_available,
            pricing: Pricing::new(
                model.selling_minor,
                model.cost_minor,
                model.agent_commission_minor,
            ),
        })
    }
}
