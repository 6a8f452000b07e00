use std::sync::Arc;

use crate::error::LedgerError;
use crate::store::UserStore;
use crate::types::{UsageDelta, UsageRecord, UserAccount};

/// Applies the usage of finished turns to user accounts
///
/// Each call appends a record; callers apply a turn's usage once.
#[derive(Clone)]
pub struct TokenLedger {
    store: Arc<dyn UserStore>,
    request_type: String,
}

impl TokenLedger {
    pub fn new(store: Arc<dyn UserStore>, request_type: impl Into<String>) -> Self {
        Self {
            store,
            request_type: request_type.into(),
        }
    }

    pub fn store(&self) -> &Arc<dyn UserStore> {
        &self.store
    }

    /// Whether the user may start a turn estimated at `estimate` tokens
    pub async fn check_budget(&self, user_id: &str, estimate: u64) -> Result<bool, LedgerError> {
        self.store.check_token_available(user_id, estimate).await
    }

    /// Add `usage` to the user's totals and record it
    ///
    /// An unknown user is logged and skipped.
    pub async fn apply_usage(&self, user_id: &str, usage: UsageDelta) -> Result<Option<UserAccount>, LedgerError> {
        let record = UsageRecord::new(user_id, usage, self.request_type.clone());
        let record_id = record.id;

        match self.store.apply_usage(record).await {
            Ok(Some(account)) => {
                tracing::debug!(
                    user_id,
                    %record_id,
                    total_tokens = usage.total_tokens,
                    token_used = account.token_used,
                    "usage recorded"
                );
                Ok(Some(account))
            }
            Ok(None) => {
                tracing::warn!(user_id, "usage for unknown user not recorded");
                Ok(None)
            }
            Err(e) => {
                tracing::error!(user_id, error = %e, "failed to record usage");
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for TokenLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenLedger")
            .field("request_type", &self.request_type)
            .finish_non_exhaustive()
    }
}
