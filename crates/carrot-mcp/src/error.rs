use std::time::Duration;

use thiserror::Error;

/// Tool server errors
#[derive(Debug, Error)]
pub enum McpError {
    /// The worker could not establish a session and discover tools
    #[error("failed to connect to tool server '{server}': {reason}")]
    Connect { server: String, reason: String },

    /// A bounded worker operation ran out of time
    #[error("tool server '{server}' did not finish {operation} within {after:?}")]
    Timeout {
        server: String,
        operation: &'static str,
        after: Duration,
    },

    /// The worker is not running
    #[error("tool server '{server}' is not running")]
    WorkerUnavailable { server: String },

    /// The worker's catalog does not list the tool
    #[error("tool '{tool}' is not offered by tool server '{server}'")]
    ToolNotFound { server: String, tool: String },

    /// No connected server offers the tool
    #[error("no server for tool: {tool}")]
    NoServerForTool { tool: String },

    /// No tool server could be connected
    #[error("no tool server available")]
    NoServerAvailable,

    /// The tool call arguments are unusable
    #[error("invalid tool arguments: {0}")]
    InvalidArguments(String),

    /// The tool ran and reported a failure
    #[error("tool execution failed: {0}")]
    Execution(String),

    /// Connection or protocol failure talking to the server
    #[error("transport error: {0}")]
    Transport(String),

    /// The worker runtime could not be started
    #[error("failed to start worker for '{server}': {reason}")]
    Spawn { server: String, reason: String },

    /// Timeout settings could not be parsed
    #[error("invalid tool server configuration: {0}")]
    InvalidConfig(String),
}
