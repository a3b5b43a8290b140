//! WagerLedger - balance accounting and atomic bet placement
//!
//! This crate provides the wagering ledger core: durable per-user balances,
//! bet records, the transaction coordinator that debits a balance and creates
//! a bet in one atomic step, and the read-only query service for bet history.

pub mod config;
pub mod error;
pub mod placement;
pub mod query;
pub mod settlement;
pub mod store;
pub mod wager;

pub use config::LedgerConfig;
pub use error::LedgerError;
pub use placement::{parse_amount, PlaceWagerRequest, TransactionCoordinator};
pub use query::QueryService;
pub use settlement::SettlementService;
pub use store::{memory::MemoryStore, postgres::PgStore, AtomicTxn, Store, WagerQuery};

// Re-export commonly used types
pub use wager::{
    Outcome, PlacementReceipt, SettlementReceipt, UserBalance, Wager, WagerDraft, WagerStatus,
};

// Result type alias
pub type Result<T> = std::result::Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        let status: WagerStatus = "pending".parse().unwrap();
        assert_eq!(status, WagerStatus::Pending);
        assert_eq!(status.as_str(), "pending");
    }

    #[test]
    fn test_unknown_status_is_validation_error() {
        let err = "settled".parse::<WagerStatus>().unwrap_err();
        assert!(matches!(err, LedgerError::Validation { field: "status" }));
    }
}
