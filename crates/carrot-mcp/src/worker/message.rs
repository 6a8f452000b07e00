use crate::error::McpError;
use crate::session::JsonObject;
use crate::types::ToolDescriptor;

/// Owner to worker
#[derive(Debug)]
pub(super) enum WorkerRequest {
    ListTools {
        id: u64,
    },
    CallTool {
        id: u64,
        name: String,
        arguments: Option<JsonObject>,
    },
    Shutdown,
}

/// Worker to owner
#[derive(Debug)]
pub(super) enum WorkerResponse {
    /// Session is open and the first catalog was fetched
    Ready { tools: Vec<ToolDescriptor> },
    ConnectFailed { error: McpError },
    Tools {
        id: u64,
        result: Result<Vec<ToolDescriptor>, McpError>,
    },
    ToolResult {
        id: u64,
        result: Result<String, McpError>,
    },
}

impl WorkerResponse {
    /// Correlation id of the request this answers
    pub(super) const fn request_id(&self) -> Option<u64> {
        match self {
            Self::Tools { id, .. } | Self::ToolResult { id, .. } => Some(*id),
            Self::Ready { .. } | Self::ConnectFailed { .. } => None,
        }
    }
}
