//! The module contains the errors the engine can throw.
//!
//! Settlement and issuance failures have their own variants so callers can
//! decide what to do next:
//!
//! - [`InsufficientInventory`]: offer another flight or class.
//! - [`AlreadySettled`]: the payment was already applied, treat as success.
//! - [`LowConfidenceExtraction`]: ask staff to enter the issuance by hand.
//!
//!  [`InsufficientInventory`]: EngineError::InsufficientInventory
//!  [`AlreadySettled`]: EngineError::AlreadySettled
//!  [`LowConfidenceExtraction`]: EngineError::LowConfidenceExtraction
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Unbalanced entry: {0}")]
    UnbalancedEntry(String),
    #[error("Unknown account: {0}")]
    UnknownAccount(String),
    #[error("Insufficient inventory: {0}")]
    InsufficientInventory(String),
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("Already settled: {0}")]
    AlreadySettled(String),
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
    #[error("Booking not found: {0}")]
    BookingNotFound(String),
    #[error("Low confidence extraction: {0}")]
    LowConfidenceExtraction(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// Soft failures leave every record untouched and only ask for a retry or
    /// a manual follow-up.
    #[must_use]
    pub fn is_soft(&self) -> bool {
        matches!(self, Self::LowConfidenceExtraction(_))
    }

    /// `true` when the same request may succeed later without changes on the
    /// caller side (e.g. seats freed by a cancellation, a clearer message).
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::InsufficientInventory(_)
                | Self::InsufficientFunds(_)
                | Self::LowConfidenceExtraction(_)
                | Self::Database(_)
        )
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::UnbalancedEntry(a), Self::UnbalancedEntry(b)) => a == b,
            (Self::UnknownAccount(a), Self::UnknownAccount(b)) => a == b,
            (Self::InsufficientInventory(a), Self::InsufficientInventory(b)) => a == b,
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::AlreadySettled(a), Self::AlreadySettled(b)) => a == b,
            (Self::InvalidTransition(a), Self::InvalidTransition(b)) => a == b,
            (Self::BookingNotFound(a), Self::BookingNotFound(b)) => a == b,
            (Self::LowConfidenceExtraction(a), Self::LowConfidenceExtraction(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
