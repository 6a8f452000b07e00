use serde::{Deserialize, Serialize};

/// A decoded piece of a streaming completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkEvent {
    /// Visible answer text
    Content(String),
    /// Chain-of-thought text from reasoning models
    Reasoning(String),
    /// Fragment of one tool call
    ToolCall(ToolCallDelta),
    /// The model stopped generating
    Finish(FinishReason),
    /// Token accounting for the whole stream
    Usage(Usage),
    /// The upstream sent its terminal marker
    Done,
}

/// Partial tool call data, keyed by its position in the call list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolCallDelta {
    pub index: u32,
    /// Present on the first fragment only
    pub id: Option<String>,
    /// Present on the first fragment only
    pub name: Option<String>,
    /// Next slice of the JSON argument text
    pub arguments: Option<String>,
}

/// Reason the model stopped generating
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
    Other(String),
}

impl FinishReason {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "stop" => Self::Stop,
            "length" => Self::Length,
            "tool_calls" => Self::ToolCalls,
            "content_filter" => Self::ContentFilter,
            other => Self::Other(other.to_owned()),
        }
    }
}

/// Token usage reported at the end of a stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
    /// Prompt tokens served from the provider's context cache
    #[serde(default)]
    pub prompt_cache_hit_tokens: u64,
    #[serde(default)]
    pub prompt_cache_miss_tokens: u64,
}

impl Usage {
    /// Add another stream's usage to this one, saturating at `u64::MAX`
    pub const fn accumulate(&mut self, other: &Self) {
        self.prompt_tokens = self.prompt_tokens.saturating_add(other.prompt_tokens);
        self.completion_tokens = self.completion_tokens.saturating_add(other.completion_tokens);
        self.total_tokens = self.total_tokens.saturating_add(other.total_tokens);
        self.prompt_cache_hit_tokens = self.prompt_cache_hit_tokens.saturating_add(other.prompt_cache_hit_tokens);
        self.prompt_cache_miss_tokens = self
            .prompt_cache_miss_tokens
            .saturating_add(other.prompt_cache_miss_tokens);
    }
}
