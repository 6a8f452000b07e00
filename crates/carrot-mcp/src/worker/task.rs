use std::sync::Arc;

use carrot_config::ToolServerConfig;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::message::{WorkerRequest, WorkerResponse};
use crate::error::McpError;
use crate::session::{SessionConnector, ToolSession};
use crate::types::ToolDescriptor;

/// Event loop running inside a worker's runtime
///
/// Requests are handled strictly one at a time.
pub(super) struct WorkerTask {
    pub(super) server: String,
    pub(super) config: ToolServerConfig,
    pub(super) connector: Arc<dyn SessionConnector>,
    pub(super) requests: mpsc::Receiver<WorkerRequest>,
    pub(super) responses: mpsc::Sender<WorkerResponse>,
    pub(super) shutdown: CancellationToken,
}

impl WorkerTask {
    pub(super) async fn run(mut self) {
        let opened = tokio::select! {
            () = self.shutdown.cancelled() => return,
            opened = self.open_session() => opened,
        };

        let mut session = match opened {
            Ok((session, tools)) => {
                if self.responses.send(WorkerResponse::Ready { tools }).await.is_err() {
                    session.close().await;
                    return;
                }
                session
            }
            Err(error) => {
                tracing::warn!(server = %self.server, error = %error, "tool worker failed to connect");
                let _ = self.responses.send(WorkerResponse::ConnectFailed { error }).await;
                return;
            }
        };

        self.serve(session.as_mut()).await;

        session.close().await;
        tracing::debug!(server = %self.server, "tool worker stopped");
    }

    async fn open_session(&self) -> Result<(Box<dyn ToolSession>, Vec<ToolDescriptor>), McpError> {
        let mut session = self.connector.connect(&self.server, &self.config).await?;

        match session.list_tools().await {
            Ok(tools) => Ok((session, tools)),
            Err(e) => {
                session.close().await;
                Err(e)
            }
        }
    }

    async fn serve(&mut self, session: &mut dyn ToolSession) {
        loop {
            let request = tokio::select! {
                () = self.shutdown.cancelled() => break,
                request = self.requests.recv() => request,
            };

            let response = match request {
                None | Some(WorkerRequest::Shutdown) => break,
                Some(WorkerRequest::ListTools { id }) => {
                    let result = tokio::select! {
                        () = self.shutdown.cancelled() => break,
                        result = session.list_tools() => result,
                    };
                    WorkerResponse::Tools { id, result }
                }
                Some(WorkerRequest::CallTool { id, name, arguments }) => {
                    tracing::debug!(server = %self.server, tool = %name, "executing tool call");
                    let result = tokio::select! {
                        () = self.shutdown.cancelled() => break,
                        result = session.call_tool(&name, arguments) => result,
                    };
                    WorkerResponse::ToolResult { id, result }
                }
            };

            if self.responses.send(response).await.is_err() {
                break;
            }
        }
    }
}
