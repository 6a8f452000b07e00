#![allow(clippy::must_use_candidate)]

mod chat;
mod env;
mod health;
mod ledger;
mod loader;
mod mcp;
mod model;
mod server;
pub mod telemetry;

use serde::Deserialize;

pub use chat::ChatConfig;
pub use health::HealthConfig;
pub use ledger::{LedgerConfig, SeedUser};
pub use mcp::{McpConfig, McpTimeoutsConfig, ToolServerConfig, TransportKind};
pub use model::ModelConfig;
pub use server::ServerConfig;
pub use telemetry::{LogFormat, TelemetryConfig};

/// Top-level Carrot configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Upstream chat model configuration
    #[serde(default)]
    pub model: ModelConfig,
    /// Chat turn defaults
    #[serde(default)]
    pub chat: ChatConfig,
    /// Tool server configuration
    #[serde(default)]
    pub mcp: McpConfig,
    /// Token ledger configuration
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Telemetry configuration
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}
