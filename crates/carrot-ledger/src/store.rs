use std::collections::HashMap;

use async_trait::async_trait;
use carrot_config::LedgerConfig;
use tokio::sync::RwLock;

use crate::error::LedgerError;
use crate::types::{UsageRecord, UserAccount};

/// Persistence for user accounts and usage records
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, user_id: &str) -> Result<Option<UserAccount>, LedgerError>;

    /// Whether the user exists and `estimate` more tokens fit in their budget
    async fn check_token_available(&self, user_id: &str, estimate: u64) -> Result<bool, LedgerError> {
        Ok(self
            .get_user(user_id)
            .await?
            .is_some_and(|account| account.has_budget_for(estimate)))
    }

    /// Add the record's usage to the account and append the record in one unit
    ///
    /// Returns the updated account, or `None` when the user does not exist.
    async fn apply_usage(&self, record: UsageRecord) -> Result<Option<UserAccount>, LedgerError>;
}

#[derive(Debug, Default)]
struct State {
    users: HashMap<String, UserAccount>,
    records: Vec<UsageRecord>,
}

/// Store kept in process memory, seeded from configuration
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    state: RwLock<State>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &LedgerConfig) -> Self {
        let users = config
            .users
            .iter()
            .map(|(id, seed)| (id.clone(), UserAccount::new(id.clone(), seed.token_limit)))
            .collect();

        Self {
            state: RwLock::new(State {
                users,
                records: Vec::new(),
            }),
        }
    }

    /// Add or replace an account
    pub async fn insert_user(&self, account: UserAccount) {
        self.state.write().await.users.insert(account.id.clone(), account);
    }

    /// Snapshot of every record written so far
    pub async fn records(&self) -> Vec<UsageRecord> {
        self.state.read().await.records.clone()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<UserAccount>, LedgerError> {
        Ok(self.state.read().await.users.get(user_id).cloned())
    }

    async fn apply_usage(&self, record: UsageRecord) -> Result<Option<UserAccount>, LedgerError> {
        let mut state = self.state.write().await;

        let Some(account) = state.users.get_mut(&record.user_id) else {
            return Ok(None);
        };

        account.apply(&record.usage)?;
        let updated = account.clone();
        state.records.push(record);

        Ok(Some(updated))
    }
}
