//! Bookings and their issuance state machine.
//!
//! ```text
//! DRAFT ──settle──▶ AWAITING_ISSUANCE ──issue──▶ READY
//!   │                      │
//!   └──────cancel──────────┴──▶ CANCELLED
//! ```
//!
//! Rows are never deleted. The financial snapshot is written once, when the
//! booking enters `AWAITING_ISSUANCE`, and never recomputed afterwards.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CabinClass, EngineError, ResultEngine, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Draft,
    AwaitingIssuance,
    Ready,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::AwaitingIssuance => "awaiting_issuance",
            Self::Ready => "ready",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::AwaitingIssuance)
                | (Self::AwaitingIssuance, Self::Ready)
                | (Self::Draft, Self::Cancelled)
                | (Self::AwaitingIssuance, Self::Cancelled)
        )
    }

    /// Returns `next` if the move is allowed, `InvalidTransition` otherwise.
    pub fn transition(self, next: BookingStatus) -> ResultEngine<BookingStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(EngineError::InvalidTransition(format!(
                "{} -> {}",
                self.as_str(),
                next.as_str()
            )))
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ready | Self::Cancelled)
    }
}

impl TryFrom<&str> for BookingStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "draft" => Ok(Self::Draft),
            "awaiting_issuance" => Ok(Self::AwaitingIssuance),
            "ready" => Ok(Self::Ready),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid booking status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    BankTransfer,
    AgentWallet,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::BankTransfer => "bank_transfer",
            Self::AgentWallet => "agent_wallet",
        }
    }
}

impl TryFrom<&str> for PaymentMethod {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "card" => Ok(Self::Card),
            "bank_transfer" => Ok(Self::BankTransfer),
            "agent_wallet" => Ok(Self::AgentWallet),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid payment method: {other}"
            ))),
        }
    }
}

/// Passenger data copied onto the booking at creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassengerSnapshot {
    pub full_name: String,
    #[serde(default)]
    pub passport_number: Option<String>,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub passport_expiry: Option<NaiveDate>,
}

impl PassengerSnapshot {
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            passport_number: None,
            nationality: None,
            passport_expiry: None,
        }
    }

    #[must_use]
    pub fn passport(mut self, number: impl Into<String>, expiry: Option<NaiveDate>) -> Self {
        self.passport_number = Some(number.into());
        self.passport_expiry = expiry;
        self
    }

    #[must_use]
    pub fn nationality(mut self, nationality: impl Into<String>) -> Self {
        self.nationality = Some(nationality.into());
        self
    }
}

/// Amounts frozen when the payment is settled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialSnapshot {
    pub total_minor: i64,
    pub cost_minor: i64,
    pub commission_minor: i64,
    pub net_profit_minor: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub reference: String,
    pub flight_id: Uuid,
    pub cabin_class: Option<CabinClass>,
    pub customer_id: String,
    pub agent_id: Option<String>,
    pub passengers: Vec<PassengerSnapshot>,
    pub payment_method: Option<PaymentMethod>,
    pub payment_confirmed: bool,
    pub status: BookingStatus,
    pub financials: Option<FinancialSnapshot>,
    pub seats_reserved: i32,
    pub journal_entry_id: Option<Uuid>,
    pub pnr: Option<String>,
    pub ticket_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub issued_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancel_reason: Option<String>,
}

impl Booking {
    pub(crate) fn draft(
        reference: String,
        flight_id: Uuid,
        cabin_class: Option<CabinClass>,
        customer_id: String,
        agent_id: Option<String>,
        passengers: Vec<PassengerSnapshot>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            reference,
            flight_id,
            cabin_class,
            customer_id,
            agent_id,
            passengers,
            payment_method: None,
            payment_confirmed: false,
            status: BookingStatus::Draft,
            financials: None,
            seats_reserved: 0,
            journal_entry_id: None,
            pnr: None,
            ticket_number: None,
            created_at,
            paid_at: None,
            issued_at: None,
            cancelled_at: None,
            cancel_reason: None,
        }
    }

    /// Seats a settlement of this booking takes from the pool.
    pub fn passenger_count(&self) -> i32 {
        i32::try_from(self.passengers.len()).unwrap_or(i32::MAX)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub reference: String,
    pub flight_id: String,
    pub cabin_class: Option<String>,
    pub customer_id: String,
    pub agent_id: Option<String>,
    pub passengers: String,
    pub payment_method: Option<String>,
    pub payment_confirmed: bool,
    pub status: String,
    pub total_minor: Option<i64>,
    pub cost_minor: Option<i64>,
    pub commission_minor: Option<i64>,
    pub net_profit_minor: Option<i64>,
    pub seats_reserved: i32,
    pub journal_entry_id: Option<String>,
    pub pnr: Option<String>,
    pub ticket_number: Option<String>,
    pub created_at: DateTimeUtc,
    pub paid_at: Option<DateTimeUtc>,
    pub issued_at: Option<DateTimeUtc>,
    pub cancelled_at: Option<DateTimeUtc>,
    pub cancel_reason: Option<String>,
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

impl TryFrom<&Booking> for ActiveModel {
    type Error = EngineError;

    fn try_from(booking: &Booking) -> ResultEngine<Self> {
        let passengers = serde_json::to_string(&booking.passengers)
            .map_err(|err| EngineError::InvalidAmount(format!("invalid passengers: {err}")))?;
        let financials = booking.financials;
        Ok(Self {
            id: ActiveValue::Set(booking.id.to_string()),
            reference: ActiveValue::Set(booking.reference.clone()),
            flight_id: ActiveValue::Set(booking.flight_id.to_string()),
            cabin_class: ActiveValue::Set(booking.cabin_class.map(|c| c.as_str().to_string())),
            customer_id: ActiveValue::Set(booking.customer_id.clone()),
            agent_id: ActiveValue::Set(booking.agent_id.clone()),
            passengers: ActiveValue::Set(passengers),
            payment_method: ActiveValue::Set(
                booking.payment_method.map(|m| m.as_str().to_string()),
            ),
            payment_confirmed: ActiveValue::Set(booking.payment_confirmed),
            status: ActiveValue::Set(booking.status.as_str().to_string()),
            total_minor: ActiveValue::Set(financials.map(|f| f.total_minor)),
            cost_minor: ActiveValue::Set(financials.map(|f| f.cost_minor)),
            commission_minor: ActiveValue::Set(financials.map(|f| f.commission_minor)),
            net_profit_minor: ActiveValue::Set(financials.map(|f| f.net_profit_minor)),
            seats_reserved: ActiveValue::Set(booking.seats_reserved),
            journal_entry_id: ActiveValue::Set(booking.journal_entry_id.map(|id| id.to_string())),
            pnr: ActiveValue::Set(booking.pnr.clone()),
            ticket_number: ActiveValue::Set(booking.ticket_number.clone()),
            created_at: ActiveValue::Set(booking.created_at),
            paid_at: ActiveValue::Set(booking.paid_at),
            issued_at: ActiveValue::Set(booking.issued_at),
            cancelled_at: ActiveValue::Set(booking.cancelled_at),
            cancel_reason: ActiveValue::Set(booking.cancel_reason.clone()),
        })
    }
}

impl TryFrom<Model> for Booking {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        let passengers: Vec<PassengerSnapshot> = serde_json::from_str(&model.passengers)
            .map_err(|err| EngineError::InvalidAmount(format!("invalid passengers: {err}")))?;
        let financials = match (
            model.total_minor,
            model.cost_minor,
            model.commission_minor,
            model.net_profit_minor,
        ) {
            (Some(total_minor), Some(cost_minor), Some(commission_minor), Some(net_profit_minor)) => {
                Some(FinancialSnapshot {
                    total_minor,
                    cost_minor,
                    commission_minor,
                    net_profit_minor,
                })
            }
            _ => None,
        };
        Ok(Self {
            id: parse_uuid(&model.id, "booking")?,
            reference: model.reference,
            flight_id: parse_uuid(&model.flight_id, "flight")?,
            cabin_class: model
                .cabin_class
                .as_deref()
                .map(CabinClass::try_from)
                .transpose()?,
            customer_id: model.customer_id,
            agent_id: model.agent_id,
            passengers,
            payment_method: model
                .payment_method
                .as_deref()
                .map(PaymentMethod::try_from)
                .transpose()?,
            payment_confirmed: model.payment_confirmed,
            status: BookingStatus::try_from(model.status.as_str())?,
            financials,
            seats_reserved: model.seats_reserved,
            journal_entry_id: model
                .journal_entry_id
                .as_deref()
                .map(|id| parse_uuid(id, "journal entry"))
                .transpose()?,
            pnr: model.pnr,
            ticket_number: model.ticket_number,
            created_at: model.created_at,
            paid_at: model.paid_at,
            issued_at: model.issued_at,
            cancelled_at: model.cancelled_at,
            cancel_reason: model.cancel_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_transitions() {
        let s = BookingStatus::Draft
            .transition(BookingStatus::AwaitingIssuance)
            .unwrap();
        let s = s.transition(BookingStatus::Ready).unwrap();
        assert!(s.is_terminal());
    }

    #[test]
    fn both_open_states_can_be_cancelled() {
        assert!(BookingStatus::Draft.can_transition_to(BookingStatus::Cancelled));
        assert!(BookingStatus::AwaitingIssuance.can_transition_to(BookingStatus::Cancelled));
    }

    #[test]
    fn illegal_transitions_are_rejected() {
        let illegal = [
            (BookingStatus::Draft, BookingStatus::Ready),
            (BookingStatus::Ready, BookingStatus::Cancelled),
            (BookingStatus::Ready, BookingStatus::AwaitingIssuance),
            (BookingStatus::Cancelled, BookingStatus::Draft),
            (BookingStatus::Cancelled, BookingStatus::AwaitingIssuance),
            (BookingStatus::AwaitingIssuance, BookingStatus::Draft),
            (BookingStatus::Draft, BookingStatus::Draft),
        ];
        for (from, to) in illegal {
            assert!(
                matches!(from.transition(to), Err(EngineError::InvalidTransition(_))),
                "{from:?} -> {to:?} must fail"
            );
        }
    }

    #[test]
    fn passenger_snapshot_json_is_stable() {
        let p = PassengerSnapshot::new("Sara Ali")
            .passport("P1234567", NaiveDate::from_ymd_opt(2030, 1, 31))
            .nationality("EG");
        let json = serde_json::to_string(&vec![p.clone()]).unwrap();
        let back: Vec<PassengerSnapshot> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vec![p]);

        let minimal: Vec<PassengerSnapshot> =
            serde_json::from_str(r#"[{"full_name":"Omar"}]"#).unwrap();
        assert_eq!(minimal[0].passport_number, None);
    }
}
