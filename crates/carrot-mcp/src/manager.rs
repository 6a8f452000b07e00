use std::collections::HashMap;
use std::sync::Arc;

use carrot_config::ToolServerConfig;
use carrot_llm::ToolDefinition;
use indexmap::IndexMap;

use crate::error::McpError;
use crate::session::{JsonObject, SessionConnector};
use crate::worker::{ToolWorker, WorkerTimeouts};

/// Workers of one chat turn, with routing from tool name to server
///
/// Mutating operations take `&mut self`, so the map of workers is never
/// changed concurrently.
pub struct ToolServerManager {
    static_servers: IndexMap<String, ToolServerConfig>,
    connector: Arc<dyn SessionConnector>,
    timeouts: WorkerTimeouts,
    workers: IndexMap<String, ToolWorker>,
    /// Tool name to server name; a later server wins on collisions
    tool_routes: HashMap<String, String>,
}

impl ToolServerManager {
    pub fn new(
        static_servers: IndexMap<String, ToolServerConfig>,
        connector: Arc<dyn SessionConnector>,
        timeouts: WorkerTimeouts,
    ) -> Self {
        Self {
            static_servers,
            connector,
            timeouts,
            workers: IndexMap::new(),
            tool_routes: HashMap::new(),
        }
    }

    /// Start a worker for `name` unless a live one already exists
    pub async fn connect_server(&mut self, name: &str, config: &ToolServerConfig) -> Result<(), McpError> {
        if self.workers.get(name).is_some_and(ToolWorker::is_alive) {
            return Ok(());
        }

        if let Some(mut stale) = self.workers.shift_remove(name) {
            stale.disconnect().await;
        }

        let worker = ToolWorker::connect(name, config.clone(), Arc::clone(&self.connector), self.timeouts).await?;
        self.register(worker);

        Ok(())
    }

    fn register(&mut self, worker: ToolWorker) {
        let server = worker.server().to_string();

        for tool in worker.list_tools() {
            if let Some(previous) = self.tool_routes.insert(tool.name.clone(), server.clone())
                && previous != server
            {
                tracing::debug!(tool = %tool.name, from = %previous, to = %server, "tool name offered by several servers");
            }
        }

        self.workers.insert(server, worker);
    }

    /// Connect every server in `configs`, skipping those that fail
    ///
    /// Returns the names of the servers that are connected, in order.
    pub async fn initialize_from_configs(&mut self, configs: &IndexMap<String, ToolServerConfig>) -> Vec<String> {
        let mut connected = Vec::with_capacity(configs.len());

        for (name, config) in configs {
            match self.connect_server(name, config).await {
                Ok(()) => connected.push(name.clone()),
                Err(e) => {
                    tracing::warn!(server = %name, error = %e, "failed to connect to tool server, skipping");
                }
            }
        }

        connected
    }

    /// Pick the worker a turn should start with
    ///
    /// Sources are tried in order, each failure falling through to the next:
    /// per-request servers, then an explicitly named static server, then the
    /// first static server that connects. An unknown name connects every
    /// static server instead. Fails only when no source yields a worker.
    pub async fn resolve_active_worker(
        &mut self,
        server_name: Option<&str>,
        user_servers: Option<&IndexMap<String, ToolServerConfig>>,
    ) -> Result<&ToolWorker, McpError> {
        let name = self.resolve_active_server(server_name, user_servers).await?;
        self.workers.get(&name).ok_or(McpError::NoServerAvailable)
    }

    async fn resolve_active_server(
        &mut self,
        server_name: Option<&str>,
        user_servers: Option<&IndexMap<String, ToolServerConfig>>,
    ) -> Result<String, McpError> {
        if let Some(user_servers) = user_servers.filter(|servers| !servers.is_empty()) {
            if let Some(name) = self.initialize_from_configs(user_servers).await.into_iter().next() {
                return Ok(name);
            }
            tracing::warn!(servers = user_servers.len(), "no per-request tool server connected, trying configured servers");
        }

        let mut failed = None;

        match server_name {
            Some(name) if self.static_servers.contains_key(name) => {
                let config = self.static_servers[name].clone();
                match self.connect_server(name, &config).await {
                    Ok(()) => return Ok(name.to_string()),
                    Err(e) => {
                        tracing::warn!(server = name, error = %e, "requested tool server failed, trying the default");
                        failed = Some(name);
                    }
                }
            }
            Some(name) => {
                tracing::warn!(server = name, "unknown tool server requested, using all configured servers");
                let servers = self.static_servers.clone();
                return self
                    .initialize_from_configs(&servers)
                    .await
                    .into_iter()
                    .next()
                    .ok_or(McpError::NoServerAvailable);
            }
            None => {}
        }

        let candidates: Vec<(String, ToolServerConfig)> = self
            .static_servers
            .iter()
            .filter(|(name, _)| failed != Some(name.as_str()))
            .map(|(name, config)| (name.clone(), config.clone()))
            .collect();

        for (name, config) in candidates {
            match self.connect_server(&name, &config).await {
                Ok(()) => return Ok(name),
                Err(e) => tracing::warn!(server = %name, error = %e, "default tool server failed, trying the next one"),
            }
        }

        Err(McpError::NoServerAvailable)
    }

    /// Worker that serves `tool`
    pub fn worker_for_tool(&mut self, tool: &str) -> Result<&mut ToolWorker, McpError> {
        let no_server = || McpError::NoServerForTool { tool: tool.to_string() };

        let server = self.tool_routes.get(tool).ok_or_else(no_server)?;
        self.workers.get_mut(server).ok_or_else(no_server)
    }

    /// Route a tool call to the server that offers it
    pub async fn call_tool(&mut self, tool: &str, arguments: Option<JsonObject>) -> Result<String, McpError> {
        self.worker_for_tool(tool)?.call_tool(tool, arguments).await
    }

    /// Refresh every live worker's catalog and return the union as function definitions
    pub async fn all_tools(&mut self) -> Vec<ToolDefinition> {
        let mut definitions: IndexMap<String, ToolDefinition> = IndexMap::new();
        self.tool_routes.clear();

        for (server, worker) in &mut self.workers {
            if !worker.is_alive() {
                continue;
            }

            if let Err(e) = worker.refresh_tools().await {
                tracing::warn!(server = %server, error = %e, "tool catalog refresh failed, keeping previous catalog");
            }

            for tool in worker.list_tools() {
                self.tool_routes.insert(tool.name.clone(), server.clone());
                definitions.insert(tool.name.clone(), tool.to_definition());
            }
        }

        definitions.into_values().collect()
    }

    /// Disconnect every worker; the manager is empty afterwards
    pub async fn cleanup(&mut self) {
        for (server, mut worker) in self.workers.drain(..) {
            if tokio::time::timeout(self.timeouts.cleanup, worker.disconnect()).await.is_err() {
                tracing::warn!(server = %server, "tool worker cleanup timed out");
            }
        }

        self.tool_routes.clear();
    }

    pub fn server_count(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }
}
