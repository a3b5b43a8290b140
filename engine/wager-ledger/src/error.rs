//! Error types for the wager ledger

use crate::wager::WagerStatus;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// Closed error taxonomy for ledger operations.
///
/// Callers match on the variant, never on message text. Every variant except
/// `TransientStorage` guarantees that no state was mutated; `TransientStorage`
/// means the outcome is unknown and a blind retry may double-spend unless the
/// caller supplies an idempotency key.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid {field}")]
    Validation { field: &'static str },

    #[error("User not found: {user_id}")]
    UserNotFound { user_id: String },

    #[error("Not enough balance: required {required}, available {available}")]
    InsufficientFunds { required: Decimal, available: Decimal },

    #[error("Wager not found: {bet_id}")]
    WagerNotFound { bet_id: Uuid },

    #[error("Wager {bet_id} already settled: {status}")]
    AlreadySettled { bet_id: Uuid, status: WagerStatus },

    #[error("Transient storage error: {message}")]
    TransientStorage { message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl LedgerError {
    /// Whether the underlying store reported a conflict or timeout that the
    /// atomic step may retry from the top.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientStorage { .. })
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    pub(crate) fn transient(message: impl Into<String>) -> Self {
        Self::TransientStorage { message: message.into() }
    }
}
