//! Configuration for the wager ledger stores

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tuning for store transactions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Upper bound on attempts of one atomic step before the conflict is
    /// surfaced as a transient storage error.
    pub max_txn_attempts: u32,
    /// Timeout applied to each store interaction.
    pub op_timeout_secs: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self { max_txn_attempts: 5, op_timeout_secs: 10 }
    }
}

impl LedgerConfig {
    /// Create config from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, crate::LedgerError> {
        let defaults = Self::default();

        let max_txn_attempts = std::env::var("LEDGER_TXN_ATTEMPTS")
            .map(|v| v.parse::<u32>())
            .unwrap_or(Ok(defaults.max_txn_attempts))
            .map_err(|_| crate::LedgerError::InvalidConfig {
                message: "Invalid LEDGER_TXN_ATTEMPTS".to_string(),
            })?;

        let op_timeout_secs = std::env::var("LEDGER_OP_TIMEOUT_SECS")
            .map(|v| v.parse::<u64>())
            .unwrap_or(Ok(defaults.op_timeout_secs))
            .map_err(|_| crate::LedgerError::InvalidConfig {
                message: "Invalid LEDGER_OP_TIMEOUT_SECS".to_string(),
            })?;

        if max_txn_attempts == 0 {
            return Err(crate::LedgerError::InvalidConfig {
                message: "LEDGER_TXN_ATTEMPTS must be at least 1".to_string(),
            });
        }

        Ok(Self { max_txn_attempts, op_timeout_secs })
    }

    pub fn op_timeout(&self) -> Duration {
        Duration::from_secs(self.op_timeout_secs)
    }
}
