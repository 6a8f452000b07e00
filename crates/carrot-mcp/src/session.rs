use std::borrow::Cow;
use std::sync::Arc;

use async_trait::async_trait;
use carrot_config::{ToolServerConfig, TransportKind};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use rmcp::model::{CallToolRequestParam, RawContent};
use rmcp::service::{RoleClient, RunningService, ServiceExt as _};

use crate::error::McpError;
use crate::types::ToolDescriptor;

/// JSON object passed as tool arguments
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

/// A live session with one tool server
///
/// Sessions are owned by exactly one worker and only used from its
/// runtime, so methods take `&mut self`.
#[async_trait]
pub trait ToolSession: Send {
    /// Ask the server for its current tool catalog
    async fn list_tools(&mut self) -> Result<Vec<ToolDescriptor>, McpError>;

    /// Run one tool and render its output as text
    async fn call_tool(&mut self, name: &str, arguments: Option<JsonObject>) -> Result<String, McpError>;

    /// End the session
    async fn close(self: Box<Self>);
}

/// Opens sessions to tool servers
#[async_trait]
pub trait SessionConnector: Send + Sync + 'static {
    async fn connect(&self, server: &str, config: &ToolServerConfig) -> Result<Box<dyn ToolSession>, McpError>;
}

/// Connector speaking MCP over SSE or streamable HTTP
#[derive(Debug, Default, Clone, Copy)]
pub struct RmcpConnector;

#[async_trait]
impl SessionConnector for RmcpConnector {
    async fn connect(&self, server: &str, config: &ToolServerConfig) -> Result<Box<dyn ToolSession>, McpError> {
        let client = build_reqwest_client(config)?;

        let service = match config.transport {
            TransportKind::Sse => connect_sse(client, config).await?,
            TransportKind::StreamableHttp => connect_streamable_http(client, config).await?,
        };

        tracing::info!(server, url = %config.url, transport = %config.transport, "connected to tool server");

        Ok(Box::new(RmcpSession {
            service,
            server: server.to_string(),
        }))
    }
}

async fn connect_sse(
    client: reqwest::Client,
    config: &ToolServerConfig,
) -> Result<RunningService<RoleClient, ()>, McpError> {
    use rmcp::transport::SseClientTransport;
    use rmcp::transport::sse_client::SseClientConfig;

    let sse_config = SseClientConfig {
        sse_endpoint: Arc::from(config.url.as_str()),
        ..Default::default()
    };

    let transport = SseClientTransport::start_with_client(client, sse_config)
        .await
        .map_err(|e| McpError::Transport(format!("SSE connection failed: {e}")))?;

    ().serve(transport)
        .await
        .map_err(|e| McpError::Transport(format!("SSE handshake failed: {e}")))
}

async fn connect_streamable_http(
    client: reqwest::Client,
    config: &ToolServerConfig,
) -> Result<RunningService<RoleClient, ()>, McpError> {
    use rmcp::transport::StreamableHttpClientTransport;
    use rmcp::transport::streamable_http_client::StreamableHttpClientTransportConfig;

    let transport = StreamableHttpClientTransport::with_client(
        client,
        StreamableHttpClientTransportConfig::with_uri(config.url.as_str()),
    );

    ().serve(transport)
        .await
        .map_err(|e| McpError::Transport(format!("streamable HTTP handshake failed: {e}")))
}

/// HTTP client that sends the server's env mapping as request headers
fn build_reqwest_client(config: &ToolServerConfig) -> Result<reqwest::Client, McpError> {
    let mut headers = HeaderMap::new();

    for (key, value) in config.sanitized_env() {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|e| McpError::Transport(format!("invalid header name '{key}': {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| McpError::Transport(format!("invalid value for header '{key}': {e}")))?;
        headers.insert(name, value);
    }

    reqwest::Client::builder()
        .default_headers(headers)
        .build()
        .map_err(|e| McpError::Transport(format!("failed to build HTTP client: {e}")))
}

struct RmcpSession {
    service: RunningService<RoleClient, ()>,
    server: String,
}

#[async_trait]
impl ToolSession for RmcpSession {
    async fn list_tools(&mut self) -> Result<Vec<ToolDescriptor>, McpError> {
        let tools = self
            .service
            .list_all_tools()
            .await
            .map_err(|e| McpError::Transport(format!("list_tools failed on {}: {e}", self.server)))?;

        Ok(tools.into_iter().map(ToolDescriptor::from).collect())
    }

    async fn call_tool(&mut self, name: &str, arguments: Option<JsonObject>) -> Result<String, McpError> {
        let result = self
            .service
            .call_tool(CallToolRequestParam {
                name: Cow::Owned(name.to_string()),
                arguments,
            })
            .await
            .map_err(|e| McpError::Transport(format!("call to '{name}' failed on {}: {e}", self.server)))?;

        let text = render_content(result.content.into_iter().map(|content| content.raw));

        if result.is_error.unwrap_or(false) {
            return Err(McpError::Execution(text));
        }

        Ok(text)
    }

    async fn close(self: Box<Self>) {
        let Self { service, server } = *self;
        if let Err(e) = service.cancel().await {
            tracing::debug!(server = %server, error = %e, "tool server session did not close cleanly");
        }
    }
}

/// Join text blocks with newlines; other blocks are rendered as JSON
fn render_content(blocks: impl Iterator<Item = RawContent>) -> String {
    blocks
        .map(|block| match block {
            RawContent::Text(text) => text.text,
            other => serde_json::to_string(&other).unwrap_or_default(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
