//! Per-server tool worker
//!
//! The worker owns its MCP session on a dedicated runtime with a single
//! thread. The owner never touches the session: it sends correlated
//! requests over a channel, waits for the matching response under a
//! deadline, and can tear the runtime down if the worker stops responding.

mod message;
mod task;

use std::sync::Arc;
use std::time::Duration;

use carrot_config::{McpTimeoutsConfig, ToolServerConfig};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use self::message::{WorkerRequest, WorkerResponse};
use self::task::WorkerTask;
use crate::error::McpError;
use crate::session::{JsonObject, SessionConnector};
use crate::types::ToolDescriptor;

/// How often a pending connect checks that the worker is still alive
const LIVENESS_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How long to wait for a worker after its runtime was shut down
const FORCED_EXIT_WAIT: Duration = Duration::from_secs(1);

const CHANNEL_CAPACITY: usize = 16;

/// Bounds on worker operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerTimeouts {
    pub connect: Duration,
    pub list_tools: Duration,
    pub call: Duration,
    pub shutdown_grace: Duration,
    pub cleanup: Duration,
}

impl Default for WorkerTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(15),
            list_tools: Duration::from_secs(3),
            call: Duration::from_secs(60),
            shutdown_grace: Duration::from_secs(2),
            cleanup: Duration::from_secs(5),
        }
    }
}

impl TryFrom<&McpTimeoutsConfig> for WorkerTimeouts {
    type Error = McpError;

    fn try_from(config: &McpTimeoutsConfig) -> Result<Self, Self::Error> {
        let invalid = |e: anyhow::Error| McpError::InvalidConfig(e.to_string());

        Ok(Self {
            connect: config.connect_timeout().map_err(invalid)?,
            list_tools: config.list_tools_timeout().map_err(invalid)?,
            call: config.call_timeout().map_err(invalid)?,
            shutdown_grace: config.shutdown_grace().map_err(invalid)?,
            cleanup: config.cleanup_timeout().map_err(invalid)?,
        })
    }
}

/// Lifecycle of a worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Connecting,
    Ready,
    Executing,
    Disconnecting,
    Terminated,
}

/// Handle to the worker serving one tool server
pub struct ToolWorker {
    server: String,
    state: WorkerState,
    catalog: Vec<ToolDescriptor>,
    timeouts: WorkerTimeouts,
    next_request_id: u64,
    requests: Option<mpsc::Sender<WorkerRequest>>,
    responses: mpsc::Receiver<WorkerResponse>,
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
    runtime: Option<Runtime>,
}

impl ToolWorker {
    /// Start a worker and wait until it has connected and listed its tools
    ///
    /// A server that advertises no tools counts as a failed connection.
    pub async fn connect(
        server: &str,
        config: ToolServerConfig,
        connector: Arc<dyn SessionConnector>,
        timeouts: WorkerTimeouts,
    ) -> Result<Self, McpError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name(format!("tool-worker-{server}"))
            .enable_all()
            .build()
            .map_err(|e| McpError::Spawn {
                server: server.to_string(),
                reason: e.to_string(),
            })?;

        let (request_tx, request_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (response_tx, response_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let shutdown = CancellationToken::new();

        let task = runtime.spawn(
            WorkerTask {
                server: server.to_string(),
                config,
                connector,
                requests: request_rx,
                responses: response_tx,
                shutdown: shutdown.clone(),
            }
            .run(),
        );

        let mut worker = Self {
            server: server.to_string(),
            state: WorkerState::Connecting,
            catalog: Vec::new(),
            timeouts,
            next_request_id: 0,
            requests: Some(request_tx),
            responses: response_rx,
            shutdown,
            task: Some(task),
            runtime: Some(runtime),
        };

        match worker.await_ready().await {
            Ok(tools) => {
                tracing::info!(server, tools = tools.len(), "tool worker ready");
                worker.catalog = tools;
                worker.state = WorkerState::Ready;
                Ok(worker)
            }
            Err(e) => {
                worker.disconnect().await;
                Err(e)
            }
        }
    }

    async fn await_ready(&mut self) -> Result<Vec<ToolDescriptor>, McpError> {
        let deadline = Instant::now() + self.timeouts.connect;

        loop {
            match tokio::time::timeout(LIVENESS_POLL_INTERVAL, self.responses.recv()).await {
                Ok(Some(WorkerResponse::Ready { tools })) if tools.is_empty() => {
                    return Err(self.connect_error("server exposes no tools"));
                }
                Ok(Some(WorkerResponse::Ready { tools })) => return Ok(tools),
                Ok(Some(WorkerResponse::ConnectFailed { error })) => {
                    return Err(self.connect_error(error.to_string()));
                }
                Ok(Some(_)) => {}
                Ok(None) => return Err(self.connect_error("worker exited before connecting")),
                Err(_) => {
                    if !self.task_running() {
                        return Err(self.connect_error("worker exited before connecting"));
                    }
                    if Instant::now() >= deadline {
                        return Err(McpError::Timeout {
                            server: self.server.clone(),
                            operation: "connect",
                            after: self.timeouts.connect,
                        });
                    }
                }
            }
        }
    }

    fn connect_error(&self, reason: impl Into<String>) -> McpError {
        McpError::Connect {
            server: self.server.clone(),
            reason: reason.into(),
        }
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub const fn state(&self) -> WorkerState {
        self.state
    }

    fn task_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Whether the worker can take requests
    pub fn is_alive(&self) -> bool {
        matches!(self.state, WorkerState::Ready | WorkerState::Executing) && self.task_running()
    }

    /// Most recently discovered catalog; empty once the worker is gone
    pub fn list_tools(&self) -> &[ToolDescriptor] {
        if self.is_alive() { &self.catalog } else { &[] }
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.list_tools().iter().any(|tool| tool.name == name)
    }

    /// Ask the server for its catalog again
    pub async fn refresh_tools(&mut self) -> Result<&[ToolDescriptor], McpError> {
        self.ensure_alive()?;

        let id = self.next_id();
        self.send(WorkerRequest::ListTools { id }).await?;

        match self.await_response(id, "list_tools", self.timeouts.list_tools).await? {
            WorkerResponse::Tools { result, .. } => {
                self.catalog = result?;
                Ok(&self.catalog)
            }
            other => Err(McpError::Transport(format!("unexpected worker response: {other:?}"))),
        }
    }

    /// Run one tool on the server
    pub async fn call_tool(&mut self, name: &str, arguments: Option<JsonObject>) -> Result<String, McpError> {
        self.ensure_alive()?;

        if !self.has_tool(name) {
            return Err(McpError::ToolNotFound {
                server: self.server.clone(),
                tool: name.to_string(),
            });
        }

        let id = self.next_id();
        self.send(WorkerRequest::CallTool {
            id,
            name: name.to_string(),
            arguments,
        })
        .await?;

        self.state = WorkerState::Executing;
        let response = self.await_response(id, "call_tool", self.timeouts.call).await;
        if self.state == WorkerState::Executing {
            self.state = WorkerState::Ready;
        }

        match response? {
            WorkerResponse::ToolResult { result, .. } => result,
            other => Err(McpError::Transport(format!("unexpected worker response: {other:?}"))),
        }
    }

    fn ensure_alive(&self) -> Result<(), McpError> {
        if self.is_alive() {
            Ok(())
        } else {
            Err(McpError::WorkerUnavailable {
                server: self.server.clone(),
            })
        }
    }

    const fn next_id(&mut self) -> u64 {
        self.next_request_id += 1;
        self.next_request_id
    }

    async fn send(&mut self, request: WorkerRequest) -> Result<(), McpError> {
        let sent = match &self.requests {
            Some(requests) => requests.send(request).await.is_ok(),
            None => false,
        };

        if sent {
            Ok(())
        } else {
            self.state = WorkerState::Terminated;
            Err(McpError::WorkerUnavailable {
                server: self.server.clone(),
            })
        }
    }

    /// Wait for the response carrying `id`, dropping stale ones
    async fn await_response(
        &mut self,
        id: u64,
        operation: &'static str,
        limit: Duration,
    ) -> Result<WorkerResponse, McpError> {
        let server = self.server.as_str();
        let responses = &mut self.responses;

        let wait = async {
            while let Some(response) = responses.recv().await {
                if response.request_id() == Some(id) {
                    return Some(response);
                }
                tracing::debug!(server, "discarding stale worker response");
            }
            None
        };

        match tokio::time::timeout(limit, wait).await {
            Ok(Some(response)) => Ok(response),
            Ok(None) => {
                tracing::warn!(server = %self.server, operation, "tool worker exited unexpectedly");
                self.state = WorkerState::Terminated;
                Err(McpError::WorkerUnavailable {
                    server: self.server.clone(),
                })
            }
            Err(_) => Err(McpError::Timeout {
                server: self.server.clone(),
                operation,
                after: limit,
            }),
        }
    }

    /// Stop the worker
    ///
    /// Sends a shutdown request, gives the worker the configured grace
    /// period, then kills its runtime. Safe to call more than once.
    pub async fn disconnect(&mut self) {
        if self.task.is_none() && self.runtime.is_none() {
            self.state = WorkerState::Terminated;
            return;
        }

        self.state = WorkerState::Disconnecting;

        if let Some(requests) = self.requests.take() {
            let _ = requests.try_send(WorkerRequest::Shutdown);
        }
        self.shutdown.cancel();

        if let Some(mut task) = self.task.take()
            && tokio::time::timeout(self.timeouts.shutdown_grace, &mut task).await.is_err()
        {
            tracing::warn!(server = %self.server, "tool worker ignored shutdown, terminating it");
            if let Some(runtime) = self.runtime.take() {
                runtime.shutdown_background();
            }
            if tokio::time::timeout(FORCED_EXIT_WAIT, task).await.is_err() {
                tracing::error!(server = %self.server, "tool worker did not exit after termination");
            }
        }

        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }

        self.responses.close();
        self.catalog.clear();
        self.state = WorkerState::Terminated;
        tracing::info!(server = %self.server, "disconnected from tool server");
    }
}

impl Drop for ToolWorker {
    fn drop(&mut self) {
        self.shutdown.cancel();
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl std::fmt::Debug for ToolWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolWorker")
            .field("server", &self.server)
            .field("state", &self.state)
            .field("tools", &self.catalog.len())
            .finish_non_exhaustive()
    }
}
