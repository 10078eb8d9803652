use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    BankTransfer,
    AgentWallet,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CabinClass {
    #[default]
    Economy,
    Business,
    First,
}

pub mod booking {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum BookingStatus {
        Draft,
        AwaitingIssuance,
        Ready,
        Cancelled,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct Passenger {
        pub full_name: String,
        pub passport_number: Option<String>,
        pub nationality: Option<String>,
        pub passport_expiry: Option<NaiveDate>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BookingNew {
        pub flight_id: Uuid,
        pub cabin_class: Option<CabinClass>,
        pub customer_id: String,
        pub agent_id: Option<String>,
        pub passengers: Vec<Passenger>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct BookingCancel {
        pub reason: Option<String>,
    }

    /// Amounts frozen at payment, in minor units.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Financials {
        pub total_minor: i64,
        pub cost_minor: i64,
        pub commission_minor: i64,
        pub net_profit_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BookingView {
        pub id: Uuid,
        pub reference: String,
        pub flight_id: Uuid,
        pub cabin_class: Option<CabinClass>,
        pub customer_id: String,
        pub agent_id: Option<String>,
        pub passengers: Vec<Passenger>,
        pub status: BookingStatus,
        pub payment_method: Option<PaymentMethod>,
        pub payment_confirmed: bool,
        pub financials: Option<Financials>,
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
}

pub mod payment {
    use super::*;

    /// Payment confirmation from a gateway or an operator.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaymentConfirm {
        pub booking_id: Uuid,
        pub payment_method: PaymentMethod,
        /// Amount reported by the payment source; must match the quote.
        pub amount_minor: Option<i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaymentConfirmed {
        /// `true` when the booking had been settled by an earlier call.
        pub already_settled: bool,
        pub booking: Option<super::booking::BookingView>,
    }
}

pub mod issuance {
    use super::*;

    /// A staff reply to be matched to a booking.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct IssuanceReply {
        pub text: String,
        pub booking_ref: Option<String>,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum IssuanceStatus {
        Ready,
        NeedsReview,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct IssuanceResult {
        pub status: IssuanceStatus,
        pub booking: Option<super::booking::BookingView>,
        /// Why the reply needs a human, when it does.
        pub reason: Option<String>,
    }
}

/// Inbound payload of the WhatsApp Cloud API webhook.
///
/// Only the fields needed to read text messages are modelled; everything
/// else in the payload is ignored.
pub mod whatsapp {
    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct WebhookPayload {
        #[serde(default)]
        pub entry: Vec<WebhookEntry>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct WebhookEntry {
        #[serde(default)]
        pub changes: Vec<WebhookChange>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct WebhookChange {
        #[serde(default)]
        pub value: WebhookValue,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct WebhookValue {
        #[serde(default)]
        pub messages: Vec<WebhookMessage>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WebhookMessage {
        pub from: Option<String>,
        #[serde(rename = "type")]
        pub kind: Option<String>,
        pub text: Option<WebhookText>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WebhookText {
        pub body: String,
    }

    impl WebhookPayload {
        /// Bodies of every text message, in payload order.
        pub fn text_bodies(&self) -> impl Iterator<Item = &str> {
            self.entry
                .iter()
                .flat_map(|e| &e.changes)
                .flat_map(|c| &c.value.messages)
                .filter_map(|m| m.text.as_ref().map(|t| t.body.as_str()))
        }
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct WebhookAck {
        pub ready: Vec<String>,
        pub needs_review: u64,
        pub rejected: u64,
    }
}

pub mod flight {
    use super::*;

    #[derive(Clone, Copy, Debug, Serialize, Deserialize)]
    pub struct Pricing {
        pub selling_minor: i64,
        pub cost_minor: i64,
        pub agent_commission_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FlightNew {
        pub airline_id: String,
        pub airline_name: Option<String>,
        pub flight_number: String,
        pub origin: String,
        pub destination: String,
        pub departure_at: DateTime<Utc>,
        pub pricing: Pricing,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FlightCreated {
        pub id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SeatPoolUpsert {
        pub seats_available: i32,
        /// Falls back to the flight's pricing when absent.
        pub pricing: Option<Pricing>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SeatPoolView {
        pub flight_id: Uuid,
        pub cabin_class: CabinClass,
        pub seats_available: i32,
        pub pricing: Pricing,
    }
}

pub mod agent {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DepositNew {
        pub amount_minor: i64,
        /// Optional idempotency key for safely retrying the same deposit.
        pub idempotency_key: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DepositCreated {
        pub entry_id: Uuid,
        pub balance_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AgentBalance {
        pub agent_id: String,
        pub balance_minor: i64,
    }
}

pub mod ledger {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountView {
        pub code: String,
        pub name: String,
        pub account_type: String,
        pub category: String,
        pub balance_minor: i64,
        pub parent_code: Option<String>,
        pub owner_id: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct JournalQuery {
        /// Inclusive lower bound.
        pub from: Option<DateTime<Utc>>,
        /// Exclusive upper bound.
        pub to: Option<DateTime<Utc>>,
        pub reference: Option<String>,
        pub kind: Option<String>,
        pub limit: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct JournalLineView {
        pub account_code: String,
        pub debit_minor: i64,
        pub credit_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct JournalEntryView {
        pub id: Uuid,
        pub occurred_at: DateTime<Utc>,
        pub description: String,
        pub reference: Option<String>,
        pub kind: String,
        pub created_by: String,
        pub lines: Vec<JournalLineView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct JournalResponse {
        pub entries: Vec<JournalEntryView>,
    }
}

pub mod reports {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DailyQuery {
        /// Defaults to today (UTC).
        pub date: Option<NaiveDate>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MonthlyQuery {
        /// `YYYY-MM`.
        pub month: String,
    }
}
