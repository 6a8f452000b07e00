use super::{message::Message, tool::ToolDefinition};

/// One streaming completion call
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: Option<f32>,
    /// Tools the model may call; `None` disables tool calling
    pub tools: Option<Vec<ToolDefinition>>,
}
