//! Settlement of pending wagers
//!
//! Resolves a pending wager to a terminal status exactly once. A won wager is
//! credited its `potential_win` in the same atomic step as the status
//! transition; lost and void wagers only transition, and never re-debit.

use crate::store::{AtomicTxn, Store};
use crate::wager::{Outcome, SettlementReceipt, WagerStatus};
use crate::{LedgerError, Result};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct SettlementService<S> {
    store: S,
}

impl<S: Store> SettlementService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Settle the wager `bet_id` with `outcome`.
    ///
    /// Fails `WagerNotFound` for an unknown id and `AlreadySettled` when the
    /// wager is no longer pending, so a repeated settlement call can never
    /// credit twice.
    pub async fn settle_wager(&self, bet_id: Uuid, outcome: Outcome) -> Result<SettlementReceipt> {
        // The owner scopes the transaction; re-read and re-check inside it.
        let owner = self
            .store
            .get_wager(bet_id)
            .await?
            .ok_or(LedgerError::WagerNotFound { bet_id })?
            .user_id;

        let receipt = self
            .store
            .run_atomic(&owner, move |txn: &mut dyn AtomicTxn| {
                Box::pin(async move {
                    let wager =
                        txn.wager(bet_id).await?.ok_or(LedgerError::WagerNotFound { bet_id })?;
                    if wager.status != WagerStatus::Pending {
                        return Err(LedgerError::AlreadySettled { bet_id, status: wager.status });
                    }

                    let status = outcome.status();
                    let mut credited = None;
                    let mut new_balance = None;

                    if outcome == Outcome::Won {
                        let balance = txn.balance(&wager.user_id).await?.ok_or_else(|| {
                            LedgerError::UserNotFound { user_id: wager.user_id.clone() }
                        })?;
                        let updated = balance + wager.potential_win;
                        txn.set_balance(&wager.user_id, updated).await?;
                        credited = Some(wager.potential_win);
                        new_balance = Some(updated);
                    }

                    txn.set_status(bet_id, status).await?;
                    Ok(SettlementReceipt { bet_id, status, credited, new_balance })
                })
            })
            .await?;

        tracing::info!(bet_id = %bet_id, status = %receipt.status, "wager settled");
        Ok(receipt)
    }
}
