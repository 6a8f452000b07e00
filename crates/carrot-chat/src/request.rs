use carrot_config::ToolServerConfig;
use carrot_llm::{Message, Role};
use indexmap::IndexMap;
use serde::Deserialize;

/// A message as sent by the client
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

impl From<&ChatMessage> for Message {
    fn from(message: &ChatMessage) -> Self {
        Self::new(message.role, message.content.clone())
    }
}

/// Input of one chat turn
#[derive(Debug, Clone, Deserialize)]
pub struct ChatTurnRequest {
    pub current_message: ChatMessage,
    #[serde(default)]
    pub context_messages: Vec<ChatMessage>,
    /// Requested model; empty or `deepseek` means the configured chat model
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub use_deep_thinking: bool,
    #[serde(default, alias = "use_mcp")]
    pub use_tools: bool,
    #[serde(default)]
    pub use_base_tools: bool,
    /// Tool servers supplied with the request, keyed by server name
    #[serde(default, alias = "user_mcp_config")]
    pub user_tool_servers: Option<IndexMap<String, ToolServerConfig>>,
    #[serde(default)]
    pub temperature: Option<f32>,
    /// Static tool server to use instead of all of them
    #[serde(default, alias = "mcp_server_name")]
    pub tool_server_name: Option<String>,
    /// Number of trailing context messages to keep
    #[serde(default)]
    pub context_length: Option<usize>,
}

impl ChatTurnRequest {
    pub fn new(current_message: ChatMessage) -> Self {
        Self {
            current_message,
            context_messages: Vec::new(),
            model: String::new(),
            use_deep_thinking: false,
            use_tools: false,
            use_base_tools: false,
            user_tool_servers: None,
            temperature: None,
            tool_server_name: None,
            context_length: None,
        }
    }

    /// The most recent context messages, at most `context_length` of them
    pub fn truncated_context(&self, default_length: usize) -> &[ChatMessage] {
        let length = self.context_length.unwrap_or(default_length);
        let start = self.context_messages.len().saturating_sub(length);
        &self.context_messages[start..]
    }

    pub fn has_user_tool_servers(&self) -> bool {
        self.user_tool_servers.as_ref().is_some_and(|servers| !servers.is_empty())
    }

    /// Whether this turn should offer tools to the model
    pub fn wants_tools(&self) -> bool {
        self.use_tools && (self.use_base_tools || self.has_user_tool_servers())
    }
}
