//! Wager and balance data model

use crate::LedgerError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Market assigned when the caller does not name one.
pub const DEFAULT_MARKET: &str = "winner";

/// Lifecycle status of a wager.
///
/// Created as `Pending`; moved to a terminal status exactly once by
/// settlement. The placement path never writes any other status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WagerStatus {
    Pending,
    Won,
    Lost,
    Void,
}

impl WagerStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Won => "won",
            Self::Lost => "lost",
            Self::Void => "void",
        }
    }

    pub fn is_terminal(self) -> bool {
        self != Self::Pending
    }
}

impl FromStr for WagerStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "won" => Ok(Self::Won),
            "lost" => Ok(Self::Lost),
            "void" => Ok(Self::Void),
            _ => Err(LedgerError::Validation { field: "status" }),
        }
    }
}

impl std::fmt::Display for WagerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome a settlement run assigns to a pending wager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Won,
    Lost,
    Void,
}

impl Outcome {
    pub fn status(self) -> WagerStatus {
        match self {
            Self::Won => WagerStatus::Won,
            Self::Lost => WagerStatus::Lost,
            Self::Void => WagerStatus::Void,
        }
    }
}

impl FromStr for Outcome {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "won" => Ok(Self::Won),
            "lost" => Ok(Self::Lost),
            "void" => Ok(Self::Void),
            _ => Err(LedgerError::Validation { field: "outcome" }),
        }
    }
}

/// Per-user balance record.
///
/// Mutated only inside the coordinator's atomic step (debit on placement,
/// credit on a won settlement); readable by anyone between transactions and
/// never negative at those points.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserBalance {
    pub user_id: String,
    pub balance: Decimal,
}

/// A placed bet. Historical record; never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wager {
    /// Store-assigned at creation, immutable.
    pub bet_id: Uuid,
    pub user_id: String,
    pub sport: String,
    pub event_id: String,
    pub market: String,
    pub selection: String,
    pub odds: Decimal,
    pub stake: Decimal,
    /// Exactly `stake * odds`, fixed at creation.
    pub potential_win: Decimal,
    pub status: WagerStatus,
    /// Store-assigned, monotonic per store; the listing sort key.
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_event_info: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

/// Fields the coordinator hands to the store. `bet_id`, `created_at`, and the
/// initial `Pending` status are assigned by the store at insert time.
#[derive(Debug, Clone)]
pub struct WagerDraft {
    pub user_id: String,
    pub sport: String,
    pub event_id: String,
    pub market: String,
    pub selection: String,
    pub odds: Decimal,
    pub stake: Decimal,
    pub potential_win: Decimal,
    pub extra_event_info: Option<serde_json::Value>,
    pub idempotency_key: Option<String>,
}

/// Result of a successful (or idempotently replayed) placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementReceipt {
    pub bet_id: Uuid,
    /// Balance after the debit. On an idempotent replay this is the balance
    /// at replay time, which may have moved since the original placement.
    pub new_balance: Decimal,
    pub potential_win: Decimal,
}

/// Result of settling a pending wager.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementReceipt {
    pub bet_id: Uuid,
    pub status: WagerStatus,
    /// `potential_win`, present only on a won settlement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credited: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_balance: Option<Decimal>,
}
