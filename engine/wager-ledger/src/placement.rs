//! Atomic wager placement
//!
//! The coordinator validates input before touching any store, then runs one
//! atomic read-modify-write cycle: read balance, check funds, debit, insert
//! the pending wager. Either both writes commit or neither does.

use crate::store::{AtomicTxn, Store};
use crate::wager::{PlacementReceipt, WagerDraft, DEFAULT_MARKET};
use crate::{LedgerError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

/// Placement input as supplied by the caller.
///
/// `sport` and `event_id` are opaque identifiers from the event data gateway;
/// the ledger does not validate them against it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceWagerRequest {
    pub user_id: String,
    pub sport: String,
    pub event_id: String,
    #[serde(default)]
    pub market: Option<String>,
    pub selection: String,
    pub odds: Decimal,
    pub stake: Decimal,
    #[serde(default)]
    pub extra_event_info: Option<serde_json::Value>,
    /// Optional caller-supplied key; a placement replayed with the same key
    /// returns the original receipt instead of debiting again.
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

impl PlaceWagerRequest {
    /// Fail fast on malformed input. No store is touched when this errors.
    fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("userId", &self.user_id),
            ("sport", &self.sport),
            ("eventId", &self.event_id),
            ("selection", &self.selection),
        ] {
            if value.trim().is_empty() {
                return Err(LedgerError::Validation { field });
            }
        }
        if self.stake <= Decimal::ZERO {
            return Err(LedgerError::Validation { field: "stake" });
        }
        if self.odds <= Decimal::ONE {
            return Err(LedgerError::Validation { field: "odds" });
        }
        Ok(())
    }

    fn market(&self) -> String {
        match self.market.as_deref() {
            Some(m) if !m.trim().is_empty() => m.to_string(),
            _ => DEFAULT_MARKET.to_string(),
        }
    }
}

/// Parse a caller-supplied amount that may arrive as a JSON number or a
/// numeric string. Anything else is a validation error naming `field`.
pub fn parse_amount(field: &'static str, value: &serde_json::Value) -> Result<Decimal> {
    let text = match value {
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.trim().to_string(),
        _ => return Err(LedgerError::Validation { field }),
    };

    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| LedgerError::Validation { field })
}

/// Orchestrates the atomic "place wager" operation across the ledger and
/// wager stores.
#[derive(Debug, Clone)]
pub struct TransactionCoordinator<S> {
    store: S,
}

impl<S: Store> TransactionCoordinator<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Place a wager: debit `stake` from the user's balance and create the
    /// pending bet record in one serializable transaction.
    ///
    /// Concurrent placements for one user serialize on the balance key, so
    /// two wagers whose combined stake exceeds the balance can never both
    /// succeed. Conflicted attempts are retried from the top by the store.
    pub async fn place_wager(&self, request: &PlaceWagerRequest) -> Result<PlacementReceipt> {
        request.validate()?;

        let receipt = self
            .store
            .run_atomic(&request.user_id, |txn: &mut dyn AtomicTxn| {
                // Each attempt's future owns its input, so a retry never
                // borrows past the attempt boundary.
                let request = request.clone();
                Box::pin(async move {
                    if let Some(key) = request.idempotency_key.as_deref() {
                        if let Some(existing) = txn.wager_by_key(&request.user_id, key).await? {
                            let balance =
                                txn.balance(&request.user_id).await?.ok_or_else(|| {
                                    LedgerError::UserNotFound { user_id: request.user_id.clone() }
                                })?;
                            return Ok(PlacementReceipt {
                                bet_id: existing.bet_id,
                                new_balance: balance,
                                potential_win: existing.potential_win,
                            });
                        }
                    }

                    let balance = txn.balance(&request.user_id).await?.ok_or_else(|| {
                        LedgerError::UserNotFound { user_id: request.user_id.clone() }
                    })?;

                    if balance < request.stake {
                        return Err(LedgerError::InsufficientFunds {
                            required: request.stake,
                            available: balance,
                        });
                    }

                    let new_balance = balance - request.stake;
                    let potential_win = request.stake * request.odds;

                    txn.set_balance(&request.user_id, new_balance).await?;
                    let wager = txn
                        .insert_wager(WagerDraft {
                            user_id: request.user_id.clone(),
                            sport: request.sport.clone(),
                            event_id: request.event_id.clone(),
                            market: request.market(),
                            selection: request.selection.clone(),
                            odds: request.odds,
                            stake: request.stake,
                            potential_win,
                            extra_event_info: request.extra_event_info.clone(),
                            idempotency_key: request.idempotency_key.clone(),
                        })
                        .await?;

                    Ok(PlacementReceipt { bet_id: wager.bet_id, new_balance, potential_win })
                })
            })
            .await?;

        tracing::info!(
            bet_id = %receipt.bet_id,
            user_id = %request.user_id,
            stake = %request.stake,
            odds = %request.odds,
            "wager placed"
        );
        Ok(receipt)
    }
}
