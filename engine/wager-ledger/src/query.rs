//! Read-only wager listing

use crate::store::{Store, WagerQuery};
use crate::wager::{Wager, WagerStatus};
use crate::{LedgerError, Result};

/// Lists a user's wagers with an optional status filter, newest first,
/// capped at [`crate::store::WAGER_LIST_LIMIT`]. Never mutates anything.
#[derive(Debug, Clone)]
pub struct QueryService<S> {
    store: S,
}

impl<S: Store> QueryService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// List up to 100 wagers owned by `user_id`, most recent first.
    ///
    /// An empty result is success, not an error.
    pub async fn list_wagers(
        &self,
        user_id: &str,
        status: Option<WagerStatus>,
    ) -> Result<Vec<Wager>> {
        if user_id.trim().is_empty() {
            return Err(LedgerError::Validation { field: "userId" });
        }

        self.store
            .query_wagers(WagerQuery::for_user(user_id).with_status(status))
            .await
    }
}
