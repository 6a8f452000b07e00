use carrot_core::UserId;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LedgerError;

/// Token counts of one chat turn
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageDelta {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    pub prompt_cache_hit_tokens: u64,
    pub prompt_cache_miss_tokens: u64,
}

/// A user's quota and running totals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub token_limit: u64,
    /// Running total of all tokens, compared against `token_limit`
    pub token_used: u64,
    pub prompt_tokens_used: u64,
    pub completion_tokens_used: u64,
    pub prompt_cache_hit_tokens_used: u64,
    pub prompt_cache_miss_tokens_used: u64,
}

impl UserAccount {
    pub fn new(id: impl Into<UserId>, token_limit: u64) -> Self {
        Self {
            id: id.into(),
            token_limit,
            token_used: 0,
            prompt_tokens_used: 0,
            completion_tokens_used: 0,
            prompt_cache_hit_tokens_used: 0,
            prompt_cache_miss_tokens_used: 0,
        }
    }

    /// Whether `estimate` more tokens fit in the remaining budget
    pub const fn has_budget_for(&self, estimate: u64) -> bool {
        match self.token_used.checked_add(estimate) {
            Some(needed) => needed <= self.token_limit,
            None => false,
        }
    }

    /// Add a delta to every running total
    ///
    /// Nothing is changed when any counter would overflow.
    pub fn apply(&mut self, delta: &UsageDelta) -> Result<(), LedgerError> {
        let overflow = || LedgerError::Overflow { user_id: self.id.clone() };

        let token_used = self.token_used.checked_add(delta.total_tokens).ok_or_else(overflow)?;
        let prompt = self.prompt_tokens_used.checked_add(delta.prompt_tokens).ok_or_else(overflow)?;
        let completion = self
            .completion_tokens_used
            .checked_add(delta.completion_tokens)
            .ok_or_else(overflow)?;
        let cache_hit = self
            .prompt_cache_hit_tokens_used
            .checked_add(delta.prompt_cache_hit_tokens)
            .ok_or_else(overflow)?;
        let cache_miss = self
            .prompt_cache_miss_tokens_used
            .checked_add(delta.prompt_cache_miss_tokens)
            .ok_or_else(overflow)?;

        self.token_used = token_used;
        self.prompt_tokens_used = prompt;
        self.completion_tokens_used = completion;
        self.prompt_cache_hit_tokens_used = cache_hit;
        self.prompt_cache_miss_tokens_used = cache_miss;

        Ok(())
    }
}

/// Append-only entry written once per applied delta
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub id: Uuid,
    pub user_id: UserId,
    #[serde(flatten)]
    pub usage: UsageDelta,
    pub request_type: String,
    pub created_at: Timestamp,
}

impl UsageRecord {
    pub fn new(user_id: impl Into<UserId>, usage: UsageDelta, request_type: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            usage,
            request_type: request_type.into(),
            created_at: Timestamp::now(),
        }
    }
}
