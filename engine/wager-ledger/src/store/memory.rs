//! In-memory store
//!
//! Backs tests and local development with the same transactional semantics as
//! the Postgres store: placement and settlement serialize per user behind an
//! async mutex, and a transaction's writes are staged and applied to the
//! shared state in one move at commit, so readers never observe a debit
//! without its wager.

use crate::store::{AtomicTxn, Store, TxnOp, WagerQuery};
use crate::wager::{Wager, WagerDraft, WagerStatus};
use crate::{LedgerConfig, LedgerError, Result};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Default)]
struct Shared {
    balances: HashMap<String, Decimal>,
    /// Insertion order doubles as the `created_at` sort order.
    wagers: Vec<Wager>,
}

/// In-memory [`Store`] implementation.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    config: LedgerConfig,
    shared: Arc<RwLock<Shared>>,
    user_locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl MemoryStore {
    pub fn new(config: LedgerConfig) -> Self {
        Self { config, shared: Arc::default(), user_locks: Arc::default() }
    }

    /// Create or overwrite a balance record. Account provisioning is owned by
    /// an external identity process; this stands in for it.
    pub fn seed_user(&self, user_id: &str, balance: Decimal) {
        self.write().balances.insert(user_id.to_string(), balance);
    }

    fn read(&self) -> RwLockReadGuard<'_, Shared> {
        self.shared.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Shared> {
        self.shared.write().unwrap_or_else(|e| e.into_inner())
    }

    async fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.user_locks.lock().await;
        locks.entry(user_id.to_string()).or_default().clone()
    }
}

/// Writes staged by one transaction attempt.
struct MemoryTxn<'s> {
    shared: &'s RwLock<Shared>,
    staged_balances: HashMap<String, Decimal>,
    staged_wagers: Vec<Wager>,
    staged_statuses: HashMap<Uuid, WagerStatus>,
}

impl<'s> MemoryTxn<'s> {
    fn new(shared: &'s RwLock<Shared>) -> Self {
        Self {
            shared,
            staged_balances: HashMap::new(),
            staged_wagers: Vec::new(),
            staged_statuses: HashMap::new(),
        }
    }

    fn committed(&self) -> RwLockReadGuard<'_, Shared> {
        self.shared.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Committed view of a wager with this transaction's writes folded in.
    fn find_wager(&self, bet_id: Uuid) -> Option<Wager> {
        let mut found = self
            .staged_wagers
            .iter()
            .chain(self.committed().wagers.iter())
            .find(|w| w.bet_id == bet_id)
            .cloned()?;
        if let Some(status) = self.staged_statuses.get(&bet_id) {
            found.status = *status;
        }
        Some(found)
    }

    fn commit(self) {
        let mut shared = self.shared.write().unwrap_or_else(|e| e.into_inner());
        for (user_id, balance) in self.staged_balances {
            shared.balances.insert(user_id, balance);
        }
        shared.wagers.extend(self.staged_wagers);
        for (bet_id, status) in self.staged_statuses {
            if let Some(wager) = shared.wagers.iter_mut().find(|w| w.bet_id == bet_id) {
                wager.status = status;
            }
        }
    }
}

#[async_trait]
impl AtomicTxn for MemoryTxn<'_> {
    async fn balance(&mut self, user_id: &str) -> Result<Option<Decimal>> {
        if let Some(balance) = self.staged_balances.get(user_id) {
            return Ok(Some(*balance));
        }
        Ok(self.committed().balances.get(user_id).copied())
    }

    async fn set_balance(&mut self, user_id: &str, amount: Decimal) -> Result<()> {
        self.staged_balances.insert(user_id.to_string(), amount);
        Ok(())
    }

    async fn insert_wager(&mut self, draft: WagerDraft) -> Result<Wager> {
        let wager = Wager {
            bet_id: Uuid::new_v4(),
            user_id: draft.user_id,
            sport: draft.sport,
            event_id: draft.event_id,
            market: draft.market,
            selection: draft.selection,
            odds: draft.odds,
            stake: draft.stake,
            potential_win: draft.potential_win,
            status: WagerStatus::Pending,
            created_at: Utc::now(),
            extra_event_info: draft.extra_event_info,
            idempotency_key: draft.idempotency_key,
        };
        self.staged_wagers.push(wager.clone());
        Ok(wager)
    }

    async fn wager(&mut self, bet_id: Uuid) -> Result<Option<Wager>> {
        Ok(self.find_wager(bet_id))
    }

    async fn wager_by_key(&mut self, user_id: &str, key: &str) -> Result<Option<Wager>> {
        let staged = self
            .staged_wagers
            .iter()
            .find(|w| w.user_id == user_id && w.idempotency_key.as_deref() == Some(key))
            .cloned();
        if staged.is_some() {
            return Ok(staged);
        }
        Ok(self
            .committed()
            .wagers
            .iter()
            .find(|w| w.user_id == user_id && w.idempotency_key.as_deref() == Some(key))
            .cloned())
    }

    async fn set_status(&mut self, bet_id: Uuid, status: WagerStatus) -> Result<()> {
        if self.find_wager(bet_id).is_none() {
            return Err(LedgerError::WagerNotFound { bet_id });
        }
        self.staged_statuses.insert(bet_id, status);
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn run_atomic<T, F>(&self, user_id: &str, op: F) -> Result<T>
    where
        T: Send,
        F: for<'t> Fn(&'t mut dyn AtomicTxn) -> TxnOp<'t, T> + Send + Sync,
    {
        let lock = self.user_lock(user_id).await;
        let _guard = tokio::time::timeout(self.config.op_timeout(), lock.lock())
            .await
            .map_err(|_| LedgerError::transient("timed out waiting for balance lock"))?;

        let mut attempts = 0;
        loop {
            attempts += 1;
            let mut txn = MemoryTxn::new(&self.shared);
            match tokio::time::timeout(self.config.op_timeout(), op(&mut txn)).await {
                Err(_) => return Err(LedgerError::transient("transaction timed out")),
                Ok(Ok(value)) => {
                    txn.commit();
                    return Ok(value);
                }
                Ok(Err(err)) if err.is_transient() && attempts < self.config.max_txn_attempts => {
                    tracing::debug!(user_id, attempts, "retrying atomic step after conflict");
                    continue;
                }
                Ok(Err(err)) => return Err(err),
            }
        }
    }

    async fn get_balance(&self, user_id: &str) -> Result<Option<Decimal>> {
        Ok(self.read().balances.get(user_id).copied())
    }

    async fn get_wager(&self, bet_id: Uuid) -> Result<Option<Wager>> {
        Ok(self.read().wagers.iter().find(|w| w.bet_id == bet_id).cloned())
    }

    async fn query_wagers(&self, query: WagerQuery<'_>) -> Result<Vec<Wager>> {
        let shared = self.read();
        Ok(shared
            .wagers
            .iter()
            .rev()
            .filter(|w| w.user_id == query.user_id)
            .filter(|w| query.status.map_or(true, |s| w.status == s))
            .take(query.limit)
            .cloned()
            .collect())
    }
}
