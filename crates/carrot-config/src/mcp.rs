use std::{collections::HashMap, time::Duration};

use indexmap::IndexMap;
use serde::Deserialize;
use url::Url;

/// Tool server configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct McpConfig {
    /// Statically configured tool servers keyed by name
    #[serde(default)]
    pub servers: IndexMap<String, ToolServerConfig>,
    /// Bounds on worker operations
    #[serde(default)]
    pub timeouts: McpTimeoutsConfig,
}

/// Connection details for one tool server
///
/// Shared by the static configuration and the per-request tool server
/// map, so it also accepts the `transportType` spelling used by clients.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ToolServerConfig {
    /// Endpoint of the tool server
    pub url: Url,
    /// Transport spoken by the server
    #[serde(default, alias = "transportType", alias = "transport_type")]
    pub transport: TransportKind,
    /// Values forwarded to the server as HTTP headers
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl ToolServerConfig {
    pub fn new(url: Url, transport: TransportKind) -> Self {
        Self {
            url,
            transport,
            env: HashMap::new(),
        }
    }

    /// Environment entries with blank keys removed
    pub fn sanitized_env(&self) -> impl Iterator<Item = (&str, &str)> {
        self.env.iter().filter_map(|(key, value)| {
            let key = key.trim();
            if key.is_empty() {
                tracing::warn!(url = %self.url, "dropping tool server env entry with an empty key");
                None
            } else {
                Some((key, value.as_str()))
            }
        })
    }

    /// Whether any environment key is blank
    pub fn has_blank_env_key(&self) -> bool {
        self.env.keys().any(|key| key.trim().is_empty())
    }
}

/// Tool server transport
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// HTTP with server-sent events
    #[default]
    Sse,
    /// Streamable HTTP
    #[serde(alias = "streamable-http")]
    StreamableHttp,
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sse => f.write_str("sse"),
            Self::StreamableHttp => f.write_str("streamable_http"),
        }
    }
}

/// Worker operation bounds, written as duration strings (e.g. "15s", "500ms")
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct McpTimeoutsConfig {
    /// Time allowed for a worker to connect and discover its tools
    #[serde(default = "default_connect")]
    pub connect: String,
    /// Time allowed for a tool catalog refresh
    #[serde(default = "default_list_tools")]
    pub list_tools: String,
    /// Time allowed for a single tool call
    #[serde(default = "default_call")]
    pub call: String,
    /// Time a worker gets to exit after a shutdown request before it is killed
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace: String,
    /// Time allowed per worker during end-of-turn cleanup
    #[serde(default = "default_cleanup")]
    pub cleanup: String,
}

impl Default for McpTimeoutsConfig {
    fn default() -> Self {
        Self {
            connect: default_connect(),
            list_tools: default_list_tools(),
            call: default_call(),
            shutdown_grace: default_shutdown_grace(),
            cleanup: default_cleanup(),
        }
    }
}

impl McpTimeoutsConfig {
    /// # Errors
    ///
    /// Returns an error if the value is not a valid duration
    pub fn connect_timeout(&self) -> anyhow::Result<Duration> {
        parse_duration("connect", &self.connect)
    }

    /// # Errors
    ///
    /// Returns an error if the value is not a valid duration
    pub fn list_tools_timeout(&self) -> anyhow::Result<Duration> {
        parse_duration("list_tools", &self.list_tools)
    }

    /// # Errors
    ///
    /// Returns an error if the value is not a valid duration
    pub fn call_timeout(&self) -> anyhow::Result<Duration> {
        parse_duration("call", &self.call)
    }

    /// # Errors
    ///
    /// Returns an error if the value is not a valid duration
    pub fn shutdown_grace(&self) -> anyhow::Result<Duration> {
        parse_duration("shutdown_grace", &self.shutdown_grace)
    }

    /// # Errors
    ///
    /// Returns an error if the value is not a valid duration
    pub fn cleanup_timeout(&self) -> anyhow::Result<Duration> {
        parse_duration("cleanup", &self.cleanup)
    }
}

fn parse_duration(field: &str, value: &str) -> anyhow::Result<Duration> {
    duration_str::parse(value).map_err(|e| anyhow::anyhow!("invalid mcp.timeouts.{field} '{value}': {e}"))
}

fn default_connect() -> String {
    "15s".to_string()
}

fn default_list_tools() -> String {
    "3s".to_string()
}

fn default_call() -> String {
    "60s".to_string()
}

fn default_shutdown_grace() -> String {
    "2s".to_string()
}

fn default_cleanup() -> String {
    "5s".to_string()
}
