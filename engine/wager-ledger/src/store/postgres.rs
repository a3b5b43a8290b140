//! Postgres-backed store
//!
//! Placement and settlement run inside a serializable sqlx transaction with
//! the balance row locked via `SELECT ... FOR UPDATE`, so concurrent steps
//! against one user queue on that row while other users proceed unhindered.
//! Serialization failures and deadlocks are reported as transient and retried
//! by `run_atomic`.

use crate::store::{AtomicTxn, Store, TxnOp, WagerQuery};
use crate::wager::{Wager, WagerDraft, WagerStatus};
use crate::{LedgerConfig, LedgerError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

const WAGER_COLUMNS: &str = "bet_id, user_id, sport, event_id, market, selection, odds, stake, \
                             potential_win, status, created_at, extra_event_info, idempotency_key";

/// Postgres [`Store`] implementation.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
    config: LedgerConfig,
}

impl PgStore {
    /// Connect to the database at `url`.
    pub async fn connect(url: &str, config: LedgerConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await
            .map_err(db_err)?;
        Ok(Self { pool, config })
    }

    pub fn from_pool(pool: PgPool, config: LedgerConfig) -> Self {
        Self { pool, config }
    }

    /// Run schema migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| LedgerError::internal(format!("migration failed: {e}")))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Map a driver error into the closed taxonomy. Serialization failures,
/// deadlocks, and pool/connection trouble are transient; everything else is
/// internal and never shown to callers verbatim.
fn db_err(err: sqlx::Error) -> LedgerError {
    if is_retryable(&err) {
        LedgerError::transient(err.to_string())
    } else {
        LedgerError::internal(err.to_string())
    }
}

fn is_retryable(err: &sqlx::Error) -> bool {
    match err {
        // 40001 serialization_failure, 40P01 deadlock_detected
        sqlx::Error::Database(db) => matches!(db.code().as_deref(), Some("40001") | Some("40P01")),
        sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => true,
        _ => false,
    }
}

fn row_to_wager(row: &PgRow) -> Result<Wager> {
    let status_text: String = row.try_get("status").map_err(db_err)?;
    let status = status_text
        .parse::<WagerStatus>()
        .map_err(|_| LedgerError::internal(format!("unknown wager status in store: {status_text}")))?;

    Ok(Wager {
        bet_id: row.try_get("bet_id").map_err(db_err)?,
        user_id: row.try_get("user_id").map_err(db_err)?,
        sport: row.try_get("sport").map_err(db_err)?,
        event_id: row.try_get("event_id").map_err(db_err)?,
        market: row.try_get("market").map_err(db_err)?,
        selection: row.try_get("selection").map_err(db_err)?,
        odds: row.try_get("odds").map_err(db_err)?,
        stake: row.try_get("stake").map_err(db_err)?,
        potential_win: row.try_get("potential_win").map_err(db_err)?,
        status,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(db_err)?,
        extra_event_info: row.try_get("extra_event_info").map_err(db_err)?,
        idempotency_key: row.try_get("idempotency_key").map_err(db_err)?,
    })
}

/// One live sqlx transaction.
struct PgTxn<'c> {
    tx: Transaction<'c, Postgres>,
}

#[async_trait]
impl AtomicTxn for PgTxn<'_> {
    async fn balance(&mut self, user_id: &str) -> Result<Option<Decimal>> {
        let row = sqlx::query("SELECT balance FROM user_balances WHERE user_id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(db_err)?;

        row.map(|r| r.try_get("balance").map_err(db_err)).transpose()
    }

    async fn set_balance(&mut self, user_id: &str, amount: Decimal) -> Result<()> {
        // `coins` is the legacy alias of `balance`; kept in sync on every write.
        let result = sqlx::query(
            "UPDATE user_balances SET balance = $2, coins = $2, last_updated = now() \
             WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(amount)
        .execute(&mut *self.tx)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::UserNotFound { user_id: user_id.to_string() });
        }
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

        sqlx::query(
            "INSERT INTO wagers (bet_id, user_id, sport, event_id, market, selection, odds, \
             stake, potential_win, status, created_at, extra_event_info, idempotency_key) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(wager.bet_id)
        .bind(&wager.user_id)
        .bind(&wager.sport)
        .bind(&wager.event_id)
        .bind(&wager.market)
        .bind(&wager.selection)
        .bind(wager.odds)
        .bind(wager.stake)
        .bind(wager.potential_win)
        .bind(wager.status.as_str())
        .bind(wager.created_at)
        .bind(&wager.extra_event_info)
        .bind(&wager.idempotency_key)
        .execute(&mut *self.tx)
        .await
        .map_err(db_err)?;

        Ok(wager)
    }

    async fn wager(&mut self, bet_id: Uuid) -> Result<Option<Wager>> {
        let row = sqlx::query(&format!(
            "SELECT {WAGER_COLUMNS} FROM wagers WHERE bet_id = $1 FOR UPDATE"
        ))
        .bind(bet_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err)?;

        row.as_ref().map(row_to_wager).transpose()
    }

    async fn wager_by_key(&mut self, user_id: &str, key: &str) -> Result<Option<Wager>> {
        let row = sqlx::query(&format!(
            "SELECT {WAGER_COLUMNS} FROM wagers \
             WHERE user_id = $1 AND idempotency_key = $2 LIMIT 1"
        ))
        .bind(user_id)
        .bind(key)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err)?;

        row.as_ref().map(row_to_wager).transpose()
    }

    async fn set_status(&mut self, bet_id: Uuid, status: WagerStatus) -> Result<()> {
        let result = sqlx::query("UPDATE wagers SET status = $2 WHERE bet_id = $1")
            .bind(bet_id)
            .bind(status.as_str())
            .execute(&mut *self.tx)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::WagerNotFound { bet_id });
        }
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn run_atomic<T, F>(&self, user_id: &str, op: F) -> Result<T>
    where
        T: Send,
        F: for<'t> Fn(&'t mut dyn AtomicTxn) -> TxnOp<'t, T> + Send + Sync,
    {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let outcome = tokio::time::timeout(self.config.op_timeout(), async {
                let tx = self.pool.begin().await.map_err(db_err)?;
                let mut txn = PgTxn { tx };
                sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
                    .execute(&mut *txn.tx)
                    .await
                    .map_err(db_err)?;

                match op(&mut txn).await {
                    Ok(value) => {
                        txn.tx.commit().await.map_err(db_err)?;
                        Ok(value)
                    }
                    Err(err) => {
                        let _ = txn.tx.rollback().await;
                        Err(err)
                    }
                }
            })
            .await;

            match outcome {
                Err(_) => return Err(LedgerError::transient("transaction timed out")),
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(err)) if err.is_transient() && attempts < self.config.max_txn_attempts => {
                    tracing::debug!(user_id, attempts, "retrying atomic step after conflict");
                    continue;
                }
                Ok(Err(err)) => return Err(err),
            }
        }
    }

    async fn get_balance(&self, user_id: &str) -> Result<Option<Decimal>> {
        let row = sqlx::query("SELECT balance FROM user_balances WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.map(|r| r.try_get("balance").map_err(db_err)).transpose()
    }

    async fn get_wager(&self, bet_id: Uuid) -> Result<Option<Wager>> {
        let row = sqlx::query(&format!("SELECT {WAGER_COLUMNS} FROM wagers WHERE bet_id = $1"))
            .bind(bet_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(row_to_wager).transpose()
    }

    async fn query_wagers(&self, query: WagerQuery<'_>) -> Result<Vec<Wager>> {
        let rows = if let Some(status) = query.status {
            sqlx::query(&format!(
                "SELECT {WAGER_COLUMNS} FROM wagers \
                 WHERE user_id = $1 AND status = $2 \
                 ORDER BY created_at DESC, seq DESC LIMIT $3"
            ))
            .bind(query.user_id)
            .bind(status.as_str())
            .bind(query.limit as i64)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query(&format!(
                "SELECT {WAGER_COLUMNS} FROM wagers \
                 WHERE user_id = $1 \
                 ORDER BY created_at DESC, seq DESC LIMIT $2"
            ))
            .bind(query.user_id)
            .bind(query.limit as i64)
            .fetch_all(&self.pool)
            .await
        }
        .map_err(db_err)?;

        rows.iter().map(row_to_wager).collect()
    }
}
