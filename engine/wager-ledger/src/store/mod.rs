//! Store contracts: ledger (balances), wagers, and the atomic-step primitive
//!
//! The coordinator never talks to a database driver directly. It runs its
//! read-modify-write cycle through [`Store::run_atomic`], which executes the
//! given operation as one serializable transaction scoped to a single user's
//! balance and transparently retries bounded write conflicts. Listing goes
//! through the plain read methods and only ever observes committed state.

pub mod memory;
pub mod postgres;

use crate::wager::{Wager, WagerDraft, WagerStatus};
use crate::Result;
use async_trait::async_trait;
use futures::future::BoxFuture;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Hard cap on the number of wagers a single listing returns.
pub const WAGER_LIST_LIMIT: usize = 100;

/// Filtered, ordered range query over a user's wagers.
#[derive(Debug, Clone, Copy)]
pub struct WagerQuery<'a> {
    pub user_id: &'a str,
    pub status: Option<WagerStatus>,
    /// Capped at [`WAGER_LIST_LIMIT`] by the query service.
    pub limit: usize,
}

impl<'a> WagerQuery<'a> {
    pub fn for_user(user_id: &'a str) -> Self {
        Self { user_id, status: None, limit: WAGER_LIST_LIMIT }
    }

    pub fn with_status(mut self, status: Option<WagerStatus>) -> Self {
        self.status = status;
        self
    }
}

/// Operations available inside one atomic step.
///
/// Reads see the transaction's own uncommitted writes; nothing outside the
/// transaction does. Errors abort the transaction with no partial effect.
#[async_trait]
pub trait AtomicTxn: Send {
    /// Balance for `user_id`, locked for the remainder of the transaction.
    /// `None` when the user does not exist.
    async fn balance(&mut self, user_id: &str) -> Result<Option<Decimal>>;

    /// Overwrite the balance (and any legacy alias field) for `user_id`.
    async fn set_balance(&mut self, user_id: &str, amount: Decimal) -> Result<()>;

    /// Insert a new pending wager; the store assigns `bet_id` and `created_at`.
    async fn insert_wager(&mut self, draft: WagerDraft) -> Result<Wager>;

    /// Fetch a wager by id, locked for the remainder of the transaction.
    async fn wager(&mut self, bet_id: Uuid) -> Result<Option<Wager>>;

    /// Fetch a user's wager carrying the given idempotency key, if any.
    async fn wager_by_key(&mut self, user_id: &str, key: &str) -> Result<Option<Wager>>;

    /// Transition a wager's status.
    async fn set_status(&mut self, bet_id: Uuid, status: WagerStatus) -> Result<()>;
}

/// One attempt of an atomic operation, borrowing the live transaction.
pub type TxnOp<'t, T> = BoxFuture<'t, Result<T>>;

/// Durable storage for balances and wagers.
#[async_trait]
pub trait Store: Send + Sync {
    /// Execute `op` as a single serializable transaction scoped to
    /// `user_id`'s balance key.
    ///
    /// On a write conflict the whole operation is re-run from the top with no
    /// externally visible partial effect; attempts are bounded by
    /// [`crate::LedgerConfig::max_txn_attempts`] and exhaustion (or a timeout)
    /// surfaces [`crate::LedgerError::TransientStorage`]. Transactions for
    /// different users never block each other.
    async fn run_atomic<T, F>(&self, user_id: &str, op: F) -> Result<T>
    where
        T: Send,
        F: for<'t> Fn(&'t mut dyn AtomicTxn) -> TxnOp<'t, T> + Send + Sync;

    /// Committed balance for `user_id`; `None` when the user does not exist.
    async fn get_balance(&self, user_id: &str) -> Result<Option<Decimal>>;

    /// Committed wager by id.
    async fn get_wager(&self, bet_id: Uuid) -> Result<Option<Wager>>;

    /// Committed wagers matching `query`, newest first.
    async fn query_wagers(&self, query: WagerQuery<'_>) -> Result<Vec<Wager>>;
}
