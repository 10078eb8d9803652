//! Command structs for engine operations.
//!
//! These types group parameters for write operations (settlement, intake,
//! catalog, deposits), keeping call sites readable and avoiding long
//! argument lists.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{CabinClass, PassengerSnapshot, PaymentMethod, Pricing};

/// Confirm the payment of a draft booking.
#[derive(Clone, Debug)]
pub struct SettlePaymentCmd {
    pub booking_id: Uuid,
    pub payment_method: PaymentMethod,
    /// Amount signalled by the payment source; checked against the quote.
    pub amount_minor: Option<i64>,
    pub created_by: String,
}

impl SettlePaymentCmd {
    #[must_use]
    pub fn new(booking_id: Uuid, payment_method: PaymentMethod) -> Self {
        Self {
            booking_id,
            payment_method,
            amount_minor: None,
            created_by: "system".to_string(),
        }
    }

    #[must_use]
    pub fn amount_minor(mut self, amount_minor: i64) -> Self {
        self.amount_minor = Some(amount_minor);
        self
    }

    #[must_use]
    pub fn created_by(mut self, user: impl Into<String>) -> Self {
        self.created_by = user.into();
        self
    }
}

/// Create a booking in `DRAFT`.
#[derive(Clone, Debug)]
pub struct NewDraftBookingCmd {
    pub flight_id: Uuid,
    pub cabin_class: Option<CabinClass>,
    pub customer_id: String,
    pub agent_id: Option<String>,
    pub passengers: Vec<PassengerSnapshot>,
}

impl NewDraftBookingCmd {
    #[must_use]
    pub fn new(flight_id: Uuid, customer_id: impl Into<String>) -> Self {
        Self {
            flight_id,
            cabin_class: None,
            customer_id: customer_id.into(),
            agent_id: None,
            passengers: Vec::new(),
        }
    }

    #[must_use]
    pub fn cabin_class(mut self, cabin_class: CabinClass) -> Self {
        self.cabin_class = Some(cabin_class);
        self
    }

    #[must_use]
    pub fn agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    #[must_use]
    pub fn passenger(mut self, passenger: PassengerSnapshot) -> Self {
        self.passengers.push(passenger);
        self
    }
}

/// Add a flight to the catalog.
#[derive(Clone, Debug)]
pub struct NewFlightCmd {
    pub airline_id: String,
    pub airline_name: String,
    pub flight_number: String,
    pub origin: String,
    pub destination: String,
    pub departure_at: DateTime<Utc>,
    pub pricing: Pricing,
}

impl NewFlightCmd {
    #[must_use]
    pub fn new(
        airline_id: impl Into<String>,
        flight_number: impl Into<String>,
        departure_at: DateTime<Utc>,
        pricing: Pricing,
    ) -> Self {
        let airline_id = airline_id.into();
        Self {
            airline_name: airline_id.clone(),
            airline_id,
            flight_number: flight_number.into(),
            origin: String::new(),
            destination: String::new(),
            departure_at,
            pricing,
        }
    }

    #[must_use]
    pub fn airline_name(mut self, name: impl Into<String>) -> Self {
        self.airline_name = name.into();
        self
    }

    #[must_use]
    pub fn route(mut self, origin: impl Into<String>, destination: impl Into<String>) -> Self {
        self.origin = origin.into();
        self.destination = destination.into();
        self
    }
}

/// Create or replace the seat pool of one cabin class.
#[derive(Clone, Debug)]
pub struct SeatPoolCmd {
    pub flight_id: Uuid,
    pub cabin_class: CabinClass,
    pub seats_available: i32,
    /// Falls back to the flight's headline pricing when `None`.
    pub pricing: Option<Pricing>,
}

impl SeatPoolCmd {
    #[must_use]
    pub fn new(flight_id: Uuid, cabin_class: CabinClass, seats_available: i32) -> Self {
        Self {
            flight_id,
            cabin_class,
            seats_available,
            pricing: None,
        }
    }

    #[must_use]
    pub fn pricing(mut self, pricing: Pricing) -> Self {
        self.pricing = Some(pricing);
        self
    }
}

/// Top up an agent wallet.
#[derive(Clone, Debug)]
pub struct DepositCmd {
    pub agent_id: String,
    pub amount_minor: i64,
    pub idempotency_key: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub created_by: String,
}

impl DepositCmd {
    #[must_use]
    pub fn new(agent_id: impl Into<String>, amount_minor: i64) -> Self {
        Self {
            agent_id: agent_id.into(),
            amount_minor,
            idempotency_key: None,
            occurred_at: Utc::now(),
            created_by: "system".to_string(),
        }
    }

    #[must_use]
    pub fn idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn occurred_at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = occurred_at;
        self
    }

    #[must_use]
    pub fn created_by(mut self, user: impl Into<String>) -> Self {
        self.created_by = user.into();
        self
    }
}
