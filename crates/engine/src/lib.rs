//! Booking settlement engine.
//!
//! The engine takes a paid booking and, inside one database transaction,
//! reserves its seats, posts a balanced journal entry and moves the booking
//! to `AWAITING_ISSUANCE`. A later free-text staff reply carrying the PNR
//! and ticket number completes it exactly once.
//!
//! All state lives in the database handed to [`EngineBuilder::database`];
//! the engine itself only holds configuration and the event channel, so it
//! can be shared behind an `Arc` by any number of tasks.

pub use accounts::{Account, AccountCategory, AccountType, codes, sub_account_code};
pub use bookings::{Booking, BookingStatus, FinancialSnapshot, PassengerSnapshot, PaymentMethod};
pub use commands::{DepositCmd, NewDraftBookingCmd, NewFlightCmd, SeatPoolCmd, SettlePaymentCmd};
pub use error::EngineError;
pub use events::BookingEvent;
pub use flights::{Flight, Pricing};
pub use issuance::{Extraction, IssuanceParser};
pub use journal::{EntryKind, JournalEntry, NewJournalEntry};
pub use journal_lines::JournalLine;
pub use money::Money;
pub use ops::{BalanceDrift, Engine, EngineBuilder, JournalFilter, PostingPoint};
pub use reports::{
    AccountBalance, AgentTotal, BalanceSheetReport, CostAnalysis, DailyReport, MonthlyReport,
    RankedTotal,
};
pub use seat_pools::{CabinClass, SeatPool, SeatReservation};
pub use settlement::{Payer, quote, settlement_lines};

mod accounts;
mod bookings;
mod commands;
mod error;
mod events;
mod flights;
mod issuance;
mod journal;
mod journal_lines;
mod money;
mod ops;
mod reports;
mod seat_pools;
mod settlement;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;
