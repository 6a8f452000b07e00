use std::time::Duration;

use serde::Deserialize;

/// Defaults applied to every chat turn
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatConfig {
    /// System prompt placed first in every prepared message list
    #[serde(default)]
    pub system_prompt: String,
    /// Number of trailing context messages kept when the request omits it
    #[serde(default = "default_context_length")]
    pub default_context_length: usize,
    /// Tokens a user must have left before a turn may start
    #[serde(default = "default_token_estimate")]
    pub token_estimate: u64,
    /// Tag stored on every usage record
    #[serde(default = "default_request_type")]
    pub request_type: String,
    /// Longest wait for the next piece of a model stream, as a duration string
    #[serde(default = "default_stream_idle_timeout")]
    pub stream_idle_timeout: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            system_prompt: String::new(),
            default_context_length: default_context_length(),
            token_estimate: default_token_estimate(),
            request_type: default_request_type(),
            stream_idle_timeout: default_stream_idle_timeout(),
        }
    }
}

impl ChatConfig {
    /// # Errors
    ///
    /// Returns an error if the value is not a valid duration
    pub fn stream_idle_timeout(&self) -> anyhow::Result<Duration> {
        let value = &self.stream_idle_timeout;
        let timeout = duration_str::parse(value)
            .map_err(|e| anyhow::anyhow!("invalid chat.stream_idle_timeout '{value}': {e}"))?;

        if timeout.is_zero() {
            anyhow::bail!("chat.stream_idle_timeout must be greater than zero");
        }

        Ok(timeout)
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_context_length() -> usize {
    5
}

#[allow(clippy::missing_const_for_fn)]
fn default_token_estimate() -> u64 {
    10
}

fn default_request_type() -> String {
    "chat".to_string()
}

fn default_stream_idle_timeout() -> String {
    "120s".to_string()
}
