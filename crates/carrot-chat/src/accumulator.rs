//! Reassembly of streamed tool calls
//!
//! The model streams each tool call as fragments tagged with the call's
//! index. Fragments are folded into one call per index; argument text is
//! only ever appended.

use std::collections::{BTreeMap, HashSet};

use carrot_llm::{FunctionCall, ToolCall, ToolCallDelta};
use carrot_mcp::{JsonObject, McpError, ToolServerManager};

#[derive(Debug, Default)]
struct PendingCall {
    id: Option<String>,
    name: String,
    arguments: String,
}

/// Tool calls of the current model round
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    calls: BTreeMap<u32, PendingCall>,
    /// Ids already announced, across rounds
    announced: HashSet<String>,
}

impl ToolCallAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the calls of the previous round, keeping announced ids
    pub fn start_round(&mut self) {
        self.calls.clear();
    }

    pub fn update(&mut self, delta: &ToolCallDelta) {
        let call = self.calls.entry(delta.index).or_default();

        if call.id.is_none()
            && let Some(id) = delta.id.as_deref().filter(|id| !id.is_empty())
        {
            call.id = Some(id.to_string());
        }

        if call.name.is_empty()
            && let Some(name) = delta.name.as_deref()
        {
            call.name.push_str(name);
        }

        if let Some(arguments) = &delta.arguments {
            call.arguments.push_str(arguments);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Every call of this round, in index order
    ///
    /// Calls whose id never arrived get `call_<index>`.
    pub fn completed(&self) -> Vec<ToolCall> {
        self.calls
            .iter()
            .map(|(index, call)| ToolCall {
                id: call.id.clone().unwrap_or_else(|| format!("call_{index}")),
                function: FunctionCall {
                    name: call.name.clone(),
                    arguments: call.arguments.clone(),
                },
            })
            .collect()
    }

    /// Completed calls that were not announced before
    pub fn announce(&mut self) -> Vec<ToolCall> {
        self.completed()
            .into_iter()
            .filter(|call| self.announced.insert(call.id.clone()))
            .collect()
    }
}

/// Parse accumulated argument text into a JSON object
///
/// Empty text means no arguments.
pub fn parse_arguments(raw: &str) -> Result<JsonObject, McpError> {
    if raw.trim().is_empty() {
        return Ok(JsonObject::new());
    }

    match serde_json::from_str(raw) {
        Ok(serde_json::Value::Object(arguments)) => Ok(arguments),
        Ok(other) => Err(McpError::InvalidArguments(format!(
            "expected a JSON object, got {other}"
        ))),
        Err(e) => Err(McpError::InvalidArguments(e.to_string())),
    }
}

/// Run one call and render its outcome as the text handed back to the model
///
/// Failures become `Error: ...` text and never abort the turn.
pub async fn execute(call: &ToolCall, tools: &mut ToolServerManager) -> String {
    let name = &call.function.name;

    let outcome = match parse_arguments(&call.function.arguments) {
        Ok(arguments) => tools.call_tool(name, Some(arguments)).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(output) => {
            tracing::debug!(tool = %name, id = %call.id, "tool call succeeded");
            output
        }
        Err(e) => {
            tracing::warn!(tool = %name, id = %call.id, error = %e, "tool call failed");
            format!("Error: {e}")
        }
    }
}
