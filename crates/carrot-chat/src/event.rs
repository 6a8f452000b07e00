use carrot_llm::ToolCall;
use serde_json::{Value, json};

/// One event of a chat turn's output stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// Answer text and, for the reasoning model, reasoning text
    Content { content: String, reasoning: String },
    ToolCallStarted(ToolCall),
    ToolCallResult { call: ToolCall, result: String },
    /// A failure that ended the turn
    Error(String),
    /// Always the last event
    Done,
}

impl ChatEvent {
    pub fn content(text: impl Into<String>) -> Self {
        Self::Content {
            content: text.into(),
            reasoning: String::new(),
        }
    }

    pub fn reasoning(text: impl Into<String>) -> Self {
        Self::Content {
            content: String::new(),
            reasoning: text.into(),
        }
    }

    pub const fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Payload of the server-sent event carrying this event
    pub fn to_sse_data(&self) -> String {
        let payload = match self {
            Self::Content { content, reasoning } => payload(content, reasoning, Vec::new()),
            Self::ToolCallStarted(call) => payload("", "", vec![tool_call(call, None)]),
            Self::ToolCallResult { call, result } => payload("", "", vec![tool_call(call, Some(result))]),
            Self::Error(message) => json!({
                "error": message,
                "content": "",
                "reasoning_content": "",
                "tool_calls": [],
            }),
            Self::Done => return "[DONE]".to_string(),
        };

        payload.to_string()
    }
}

fn payload(content: &str, reasoning: &str, tool_calls: Vec<Value>) -> Value {
    json!({
        "content": content,
        "reasoning_content": reasoning,
        "tool_calls": tool_calls,
    })
}

fn tool_call(call: &ToolCall, result: Option<&str>) -> Value {
    let mut value = json!({
        "id": call.id,
        "type": "function",
        "function": {
            "name": call.function.name,
            "arguments": call.function.arguments,
        },
    });

    if let (Some(result), Some(object)) = (result, value.as_object_mut()) {
        object.insert("result".to_string(), Value::from(result));
    }

    value
}
