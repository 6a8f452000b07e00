//! In-process tool servers for tests

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use carrot_config::{ToolServerConfig, TransportKind};

use crate::error::McpError;
use crate::session::{JsonObject, SessionConnector, ToolSession};
use crate::types::ToolDescriptor;

pub(crate) fn tool(name: &str) -> ToolDescriptor {
    ToolDescriptor {
        name: name.to_string(),
        description: Some(format!("{name} tool")),
        input_schema: serde_json::json!({"type": "object"}),
    }
}

pub(crate) fn server_config(port: u16) -> ToolServerConfig {
    ToolServerConfig::new(
        format!("http://127.0.0.1:{port}/sse").parse().expect("valid url"),
        TransportKind::Sse,
    )
}

/// How a fake tool behaves when called
#[derive(Debug, Clone)]
pub(crate) enum Behavior {
    /// Answer `name:{arguments}`
    Echo,
    Sleep(Duration),
    Fail(String),
    Panic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConnectMode {
    Ok,
    Fail,
    Hang,
}

/// Connector whose servers are keyed by URL port
#[derive(Default)]
pub(crate) struct FakeConnector {
    servers: HashMap<u16, FakeServer>,
    pub(crate) connects: AtomicUsize,
    pub(crate) closed: Arc<AtomicUsize>,
}

#[derive(Clone)]
struct FakeServer {
    mode: ConnectMode,
    tools: Vec<(ToolDescriptor, Behavior)>,
    hang_on_close: bool,
}

impl FakeConnector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn server(mut self, port: u16, tools: &[(&str, Behavior)]) -> Self {
        self.servers.insert(
            port,
            FakeServer {
                mode: ConnectMode::Ok,
                tools: tools.iter().map(|(name, behavior)| (tool(name), behavior.clone())).collect(),
                hang_on_close: false,
            },
        );
        self
    }

    pub(crate) fn failing(mut self, port: u16, mode: ConnectMode) -> Self {
        self.servers.insert(
            port,
            FakeServer {
                mode,
                tools: Vec::new(),
                hang_on_close: false,
            },
        );
        self
    }

    pub(crate) fn stubborn(mut self, port: u16, tools: &[(&str, Behavior)]) -> Self {
        self = self.server(port, tools);
        if let Some(server) = self.servers.get_mut(&port) {
            server.hang_on_close = true;
        }
        self
    }

    pub(crate) fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl SessionConnector for FakeConnector {
    async fn connect(&self, _server: &str, config: &ToolServerConfig) -> Result<Box<dyn ToolSession>, McpError> {
        self.connects.fetch_add(1, Ordering::SeqCst);

        let port = config.url.port().unwrap_or_default();
        let Some(server) = self.servers.get(&port).cloned() else {
            return Err(McpError::Transport(format!("connection refused on port {port}")));
        };

        match server.mode {
            ConnectMode::Ok => Ok(Box::new(FakeSession {
                server,
                closed: Arc::clone(&self.closed),
                open: AtomicBool::new(true),
            })),
            ConnectMode::Fail => Err(McpError::Transport("handshake rejected".to_string())),
            ConnectMode::Hang => std::future::pending().await,
        }
    }
}

struct FakeSession {
    server: FakeServer,
    closed: Arc<AtomicUsize>,
    open: AtomicBool,
}

#[async_trait]
impl ToolSession for FakeSession {
    async fn list_tools(&mut self) -> Result<Vec<ToolDescriptor>, McpError> {
        Ok(self.server.tools.iter().map(|(tool, _)| tool.clone()).collect())
    }

    async fn call_tool(&mut self, name: &str, arguments: Option<JsonObject>) -> Result<String, McpError> {
        let behavior = self
            .server
            .tools
            .iter()
            .find(|(tool, _)| tool.name == name)
            .map(|(_, behavior)| behavior.clone())
            .ok_or_else(|| McpError::Execution(format!("unknown tool {name}")))?;

        match behavior {
            Behavior::Echo => {
                let arguments = serde_json::Value::Object(arguments.unwrap_or_default());
                Ok(format!("{name}:{arguments}"))
            }
            Behavior::Sleep(duration) => {
                tokio::time::sleep(duration).await;
                Ok(format!("{name}:slept"))
            }
            Behavior::Fail(message) => Err(McpError::Execution(message)),
            Behavior::Panic => panic!("tool server session crashed"),
        }
    }

    async fn close(self: Box<Self>) {
        if self.server.hang_on_close {
            std::future::pending::<()>().await;
        }
        if self.open.swap(false, Ordering::SeqCst) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }
}
