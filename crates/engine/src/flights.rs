//! Flight catalog records, read by settlement for airline and pricing.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, util::parse_uuid};

/// Per-seat prices in minor units.
///
/// `agent_commission_minor` is only paid when the booking is made by an
/// agent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pricing {
    pub selling_minor: i64,
    pub cost_minor: i64,
    pub agent_commission_minor: i64,
}

impl Pricing {
    pub fn new(selling_minor: i64, cost_minor: i64, agent_commission_minor: i64) -> Self {
        Self {
            selling_minor,
            cost_minor,
            agent_commission_minor,
        }
    }

    pub(crate) fn validate(&self) -> ResultEngine<()> {
        crate::util::ensure_non_negative(self.selling_minor, "selling price")?;
        crate::util::ensure_non_negative(self.cost_minor, "cost price")?;
        crate::util::ensure_non_negative(self.agent_commission_minor, "agent commission")?;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flight {
    pub id: Uuid,
    pub airline_id: String,
    pub airline_name: String,
    pub flight_number: String,
    pub origin: String,
    pub destination: String,
    pub departure_at: DateTime<Utc>,
    pub pricing: Pricing,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "flights")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub airline_id: String,
    pub airline_name: String,
    pub flight_number: String,
    pub origin: String,
    pub destination: String,
    pub departure_at: DateTimeUtc,
    pub selling_minor: i64,
    pub cost_minor: i64,
    pub agent_commission_minor: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::seat_pools::Entity")]
    SeatPools,
}

impl Related<super::seat_pools::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SeatPools.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Flight> for ActiveModel {
    fn from(flight: &Flight) -> Self {
        Self {
            id: ActiveValue::Set(flight.id.to_string()),
            airline_id: ActiveValue::Set(flight.airline_id.clone()),
            airline_name: ActiveValue::Set(flight.airline_name.clone()),
            flight_number: ActiveValue::Set(flight.flight_number.clone()),
            origin: ActiveValue::Set(flight.origin.clone()),
            destination: ActiveValue::Set(flight.destination.clone()),
            departure_at: ActiveValue::Set(flight.departure_at),
            selling_minor: ActiveValue::Set(flight.pricing.selling_minor),
            cost_minor: ActiveValue::Set(flight.pricing.cost_minor),
            agent_commission_minor: ActiveValue::Set(flight.pricing.agent_commission_minor),
        }
    }
}

impl TryFrom<Model> for Flight {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "flight")?,
            airline_id: model.airline_id,
            airline_name: model.airline_name,
            flight_number: model.flight_number,
            origin: model.origin,
            destination: model.destination,
            departure_at: model.departure_at,
            pricing: Pricing::new(
                model.selling_minor,
                model.cost_minor,
                model.agent_commission_minor,
            ),
        })
    }
}
