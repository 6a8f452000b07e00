//! In-process MCP tool server for integration tests
//!
//! Serves a small arithmetic catalog over streamable HTTP and records the
//! `x-api-key` header of every request it receives.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::Request;
use axum::middleware::{self, Next};
use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, JsonObject, ListToolsResult, PaginatedRequestParam,
    ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::RequestContext;
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::streamable_http_server::{StreamableHttpServerConfig, StreamableHttpService};
use rmcp::{ErrorData, RoleServer, ServerHandler};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Tool server offering `add`, `divide` and `chart`
pub struct MockMcp {
    addr: SocketAddr,
    shutdown: CancellationToken,
    api_keys: Arc<Mutex<Vec<String>>>,
}

impl MockMcp {
    pub async fn start() -> anyhow::Result<Self> {
        let service = StreamableHttpService::new(
            || Ok(MathTools),
            Arc::new(LocalSessionManager::default()),
            StreamableHttpServerConfig::default(),
        );

        let api_keys = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&api_keys);
        let app = Router::new()
            .nest_service("/mcp", service)
            .layer(middleware::from_fn(move |req: Request, next: Next| {
                let recorded = Arc::clone(&recorded);
                async move {
                    if let Some(key) = req.headers().get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) {
                        recorded.lock().expect("api key lock").push(key.to_owned());
                    }
                    next.run(req).await
                }
            }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self {
            addr,
            shutdown,
            api_keys,
        })
    }

    /// Streamable HTTP endpoint
    pub fn url(&self) -> String {
        format!("http://{}/mcp", self.addr)
    }

    /// `x-api-key` values seen so far
    pub fn api_keys(&self) -> Vec<String> {
        self.api_keys.lock().expect("api key lock").clone()
    }
}

impl Drop for MockMcp {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[derive(Debug, Clone, Copy)]
struct MathTools;

impl ServerHandler for MathTools {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..ServerInfo::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        let pair = schema(json!({
            "type": "object",
            "properties": {"a": {"type": "number"}, "b": {"type": "number"}},
            "required": ["a", "b"]
        }));

        Ok(ListToolsResult::with_all_items(vec![
            Tool::new("add", "Add two numbers", Arc::clone(&pair)),
            Tool::new("divide", "Divide a by b", pair),
            Tool::new("chart", "Draw a chart", schema(json!({"type": "object"}))),
        ]))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let args = request.arguments.unwrap_or_default();
        let number = |key: &str| args.get(key).and_then(Value::as_f64).unwrap_or_default();

        match request.name.as_ref() {
            "add" => Ok(CallToolResult::success(vec![Content::text(
                (number("a") + number("b")).to_string(),
            )])),
            "divide" if number("b") == 0.0 => Ok(CallToolResult::error(vec![Content::text("division by zero")])),
            "divide" => Ok(CallToolResult::success(vec![Content::text(
                (number("a") / number("b")).to_string(),
            )])),
            "chart" => Ok(CallToolResult::success(vec![
                Content::text("rendered"),
                Content::image("aGk=", "image/png"),
            ])),
            other => Err(ErrorData::invalid_params(format!("unknown tool {other}"), None)),
        }
    }
}

fn schema(value: Value) -> Arc<JsonObject> {
    Arc::new(value.as_object().cloned().unwrap_or_default())
}
