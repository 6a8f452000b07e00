//! Tool server workers for Carrot
//!
//! Every tool server is driven by a [`ToolWorker`]: an actor that owns the
//! MCP session on a dedicated single-threaded runtime and talks to its owner
//! through request/response channels. A [`ToolServerManager`] holds the
//! workers of one chat turn and routes tool calls to them by tool name.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod error;
mod manager;
mod session;
#[cfg(test)]
mod testing;
mod types;
mod worker;

pub use error::McpError;
pub use manager::ToolServerManager;
pub use session::{JsonObject, RmcpConnector, SessionConnector, ToolSession};
pub use types::ToolDescriptor;
pub use worker::{ToolWorker, WorkerState, WorkerTimeouts};
