use carrot_ledger::LedgerError;
use carrot_llm::LlmError;
use carrot_mcp::McpError;

use crate::sequence::SequencingError;

/// Failures that end a chat turn
///
/// Each one is reported to the client as a single error event. Failed tool
/// calls are not errors of the turn; their text is handed back to the model.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("cannot prepare messages for the reasoning model: {0}")]
    Sequencing(#[from] SequencingError),

    #[error("insufficient token balance")]
    BudgetExceeded,

    #[error("the reasoning model does not support tool calls, disable tools or switch models")]
    ToolsUnsupported,

    #[error("failed to set up tools: {0}")]
    ToolConnection(#[source] McpError),

    #[error("model request failed: {0}")]
    Upstream(#[from] LlmError),

    #[error("failed to record token usage: {0}")]
    UsageRecording(#[source] LedgerError),

    #[error("failed to load user: {0}")]
    Store(#[source] LedgerError),
}
