//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;

use carrot_config::{
    ChatConfig, Config, HealthConfig, LedgerConfig, McpConfig, McpTimeoutsConfig, ModelConfig, SeedUser,
    ServerConfig, TelemetryConfig, ToolServerConfig, TransportKind,
};
use secrecy::SecretString;

/// User seeded with a generous budget
pub const TEST_USER: &str = "user-1";

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder pointed at a mock model backend
    pub fn new(model_base_url: &str) -> Self {
        let mut ledger = LedgerConfig::default();
        ledger.users.insert(TEST_USER.to_owned(), SeedUser { token_limit: 10_000 });

        Self {
            config: Config {
                server: ServerConfig {
                    listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                    health: HealthConfig {
                        enabled: true,
                        ..HealthConfig::default()
                    },
                    ..ServerConfig::default()
                },
                model: ModelConfig {
                    base_url: model_base_url.parse().expect("valid URL"),
                    api_key: Some(SecretString::from("test-key")),
                    ..ModelConfig::default()
                },
                chat: ChatConfig {
                    system_prompt: "You are a test assistant".to_owned(),
                    ..ChatConfig::default()
                },
                mcp: McpConfig {
                    servers: Default::default(),
                    timeouts: McpTimeoutsConfig {
                        connect: "2s".to_owned(),
                        list_tools: "1s".to_owned(),
                        call: "2s".to_owned(),
                        shutdown_grace: "200ms".to_owned(),
                        cleanup: "1s".to_owned(),
                    },
                },
                ledger,
                telemetry: TelemetryConfig::default(),
            },
        }
    }

    /// Add a user with the given token limit
    pub fn with_user(mut self, id: &str, token_limit: u64) -> Self {
        self.config.ledger.users.insert(id.to_owned(), SeedUser { token_limit });
        self
    }

    /// Add a static tool server
    pub fn with_tool_server(mut self, name: &str, url: &str) -> Self {
        self.config.mcp.servers.insert(
            name.to_owned(),
            ToolServerConfig::new(url.parse().expect("valid URL"), TransportKind::Sse),
        );
        self
    }

    /// Add a static tool server speaking streamable HTTP
    pub fn with_streamable_tool_server(mut self, name: &str, url: &str) -> Self {
        self.config.mcp.servers.insert(
            name.to_owned(),
            ToolServerConfig::new(url.parse().expect("valid URL"), TransportKind::StreamableHttp),
        );
        self
    }

    /// Disable health endpoint
    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }
}
