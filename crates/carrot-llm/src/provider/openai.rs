//! OpenAI-compatible backend (DeepSeek and friends)

use std::time::Duration;

use async_trait::async_trait;
use carrot_config::ModelConfig;
use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use super::{ChatModel, ChunkStream};
use crate::convert::chunk_to_events;
use crate::error::LlmError;
use crate::protocol::{StreamOptions, WireChunk, WireRequest};
use crate::types::{ChunkEvent, CompletionRequest};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Streaming chat completions over HTTP
pub struct OpenAiModel {
    client: Client,
    base_url: Url,
    api_key: Option<SecretString>,
    include_usage: bool,
}

impl OpenAiModel {
    pub fn new(config: &ModelConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| LlmError::Upstream(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            include_usage: config.include_usage,
        })
    }

    fn completions_url(&self) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/chat/completions")
    }
}

#[async_trait]
impl ChatModel for OpenAiModel {
    fn name(&self) -> &str {
        "openai-compatible"
    }

    async fn stream_chat(&self, request: &CompletionRequest) -> Result<ChunkStream, LlmError> {
        let wire_request = WireRequest {
            model: &request.model,
            messages: request.messages.iter().map(Into::into).collect(),
            temperature: request.temperature,
            stream: true,
            tools: request.tools.as_deref().filter(|tools| !tools.is_empty()),
            stream_options: self.include_usage.then_some(StreamOptions { include_usage: true }),
        };

        let mut builder = self.client.post(self.completions_url()).json(&wire_request);

        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!(model = %request.model, error = %e, "upstream stream request failed");
            LlmError::Upstream(e.to_string())
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(model = %request.model, status = %status, "upstream returned error");
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let events = response
            .bytes_stream()
            .eventsource()
            .map(|result| match result {
                Ok(event) => {
                    let data = event.data.trim();
                    if data == "[DONE]" {
                        return vec![Ok(ChunkEvent::Done)];
                    }

                    match serde_json::from_str::<WireChunk>(data) {
                        Ok(WireChunk { error: Some(error), .. }) => {
                            tracing::warn!(error = %error, "upstream reported an error mid-stream");
                            vec![Err(LlmError::Streaming(upstream_error_message(&error)))]
                        }
                        Ok(chunk) => chunk_to_events(chunk).into_iter().map(Ok).collect(),
                        Err(e) => {
                            tracing::warn!(error = %e, data = %data, "skipping unparseable SSE chunk");
                            Vec::new()
                        }
                    }
                }
                Err(e) => vec![Err(LlmError::Streaming(e.to_string()))],
            })
            .flat_map(futures_util::stream::iter);

        Ok(Box::pin(events))
    }
}

fn upstream_error_message(error: &serde_json::Value) -> String {
    error
        .get("message")
        .and_then(serde_json::Value::as_str)
        .or_else(|| error.as_str())
        .map_or_else(|| error.to_string(), str::to_owned)
}
