//! Test server wrapper that starts Carrot on a random port

use std::net::SocketAddr;
use std::sync::Arc;

use carrot_config::Config;
use carrot_ledger::InMemoryUserStore;
use carrot_llm::OpenAiModel;
use carrot_server::Server;
use tokio_util::sync::CancellationToken;

/// A running test server instance
pub struct TestServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    client: reqwest::Client,
    store: Arc<InMemoryUserStore>,
}

impl TestServer {
    /// Start a test server with the given configuration
    ///
    /// Binds to port 0 for automatic port assignment
    pub async fn start(config: Config) -> anyhow::Result<Self> {
        let store = Arc::new(InMemoryUserStore::from_config(&config.ledger));
        let model = Arc::new(OpenAiModel::new(&config.model)?);
        let server = Server::with_backends(&config, model, store.clone())?;

        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        // Bind the listener here so we know the actual port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        tokio::spawn(async move {
            axum::serve(listener, server.into_router())
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        let client = reqwest::Client::new();

        Ok(Self {
            addr,
            shutdown,
            client,
            store,
        })
    }

    /// Base URL of the running test server
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Get a reference to the HTTP client
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// User store backing the server
    pub fn store(&self) -> &InMemoryUserStore {
        &self.store
    }

    /// Send a chat turn as `user`
    pub async fn chat(&self, user: &str, body: &serde_json::Value) -> reqwest::Response {
        self.client
            .post(self.url(carrot_server::CHAT_STREAM_PATH))
            .header("x-user-id", user)
            .json(body)
            .send()
            .await
            .expect("chat request")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
