//! Domain events published after a booking transaction commits.
//!
//! Subscribers get them through [`Engine::subscribe`](crate::Engine::subscribe).
//! Delivery is best effort: a slow receiver may observe
//! `RecvError::Lagged` and nothing is persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::PaymentMethod;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BookingEvent {
    PaymentSettled {
        booking_id: Uuid,
        reference: String,
        payment_method: PaymentMethod,
        total_minor: i64,
        journal_entry_id: Option<Uuid>,
        at: DateTime<Utc>,
    },
    IssuanceCompleted {
        booking_id: Uuid,
        reference: String,
        pnr: String,
        ticket_number: String,
        at: DateTime<Utc>,
    },
    BookingCancelled {
        booking_id: Uuid,
        reference: String,
        reason: Option<String>,
        reversal_entry_id: Option<Uuid>,
        at: DateTime<Utc>,
    },
}

impl BookingEvent {
    pub fn reference(&self) -> &str {
        match self {
            Self::PaymentSettled { reference, .. }
            | Self::IssuanceCompleted { reference, .. }
            | Self::BookingCancelled { reference, .. } => reference,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_tagged() {
        let ev = BookingEvent::IssuanceCompleted {
            booking_id: Uuid::nil(),
            reference: "RES-887766".to_string(),
            pnr: "ABC123".to_string(),
            ticket_number: "0019988".to_string(),
            at: Utc::now(),
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["event"], "issuance_completed");
        assert_eq!(ev.reference(), "RES-887766");
    }
}
