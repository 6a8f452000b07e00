//! HTTP surface of Carrot

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod chat;
mod error;
mod health;
mod request_context;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use carrot_chat::{ChatOrchestrator, ChatSettings};
use carrot_config::Config;
use carrot_ledger::{InMemoryUserStore, TokenLedger, UserStore};
use carrot_llm::{ChatModel, OpenAiModel};
use carrot_mcp::WorkerTimeouts;
use http::HeaderName;
use tower_http::trace::TraceLayer;

pub use chat::CHAT_STREAM_PATH;
pub use error::ServerError;

/// Assembled server with all routes and middleware
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
}

impl Server {
    /// Build the server from configuration
    ///
    /// Uses the configured OpenAI-compatible model and the in-memory user
    /// store seeded from `[ledger]`.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let model: Arc<dyn ChatModel> = Arc::new(OpenAiModel::new(&config.model)?);
        let store: Arc<dyn UserStore> = Arc::new(InMemoryUserStore::from_config(&config.ledger));

        Self::with_backends(config, model, store)
    }

    /// Build the server around an existing model and user store
    pub fn with_backends(
        config: &Config,
        model: Arc<dyn ChatModel>,
        store: Arc<dyn UserStore>,
    ) -> anyhow::Result<Self> {
        let timeouts = WorkerTimeouts::try_from(&config.mcp.timeouts)?;
        let ledger = TokenLedger::new(store, config.chat.request_type.clone());

        let orchestrator = ChatOrchestrator::new(model, ledger, ChatSettings::from_config(&config.model, &config.chat)?)
            .with_tool_servers(config.mcp.servers.clone())
            .with_timeouts(timeouts);

        tracing::debug!(
            tool_servers = config.mcp.servers.len(),
            chat_model = %config.model.chat_model,
            "chat orchestrator ready"
        );

        Self::with_orchestrator(config, orchestrator)
    }

    pub fn with_orchestrator(config: &Config, orchestrator: ChatOrchestrator) -> anyhow::Result<Self> {
        let listen_address = config
            .server
            .listen_address
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

        let user_header = HeaderName::try_from(config.server.user_header.as_str())?;

        // Identity is required on the chat routes only
        let mut app = chat::chat_router(orchestrator).layer(axum::middleware::from_fn(move |req, next| {
            let user_header = user_header.clone();
            async move { request_context::request_context_middleware(user_header, req, next).await }
        }));

        if config.server.health.enabled {
            app = app.route(&config.server.health.path, axum::routing::get(health::health_handler));
        }

        app = app.layer(TraceLayer::new_for_http());

        Ok(Self {
            router: app,
            listen_address,
        })
    }

    /// Get the configured listen address
    #[must_use]
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Consume the server and return the inner router
    ///
    /// Useful for testing when the caller manages the listener
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Start serving requests
    ///
    /// Blocks until the cancellation token is triggered.
    pub async fn serve(self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("graceful shutdown initiated");
            })
            .await?;

        Ok(())
    }
}
