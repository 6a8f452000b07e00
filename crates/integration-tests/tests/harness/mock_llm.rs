//! Mock chat model backend for integration tests
//!
//! Implements the streaming half of an OpenAI-compatible chat completions
//! API, with the DeepSeek `reasoning_content` and cache usage extensions.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

pub const REASONING_MODEL: &str = "deepseek-reasoner";

/// Mock backend that streams predictable chunks
pub struct MockLlm {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockLlmState>,
}

struct MockLlmState {
    completion_count: AtomicU32,
    requests: Mutex<Vec<Value>>,
    chunks: Vec<String>,
    /// Status returned instead of a stream
    fail_with: Option<StatusCode>,
    /// Tool call streamed whenever the request offers tools
    tool_call: Option<ScriptedToolCall>,
}

struct ScriptedToolCall {
    name: String,
    argument_parts: Vec<String>,
}

/// Id of the scripted tool call
pub const TOOL_CALL_ID: &str = "call_0";

impl MockLlm {
    /// Start a mock that answers "Hello from mock"
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_inner(&["Hello", " from", " mock"], None, None).await
    }

    /// Start a mock that streams the given content pieces
    pub async fn start_with_chunks(chunks: &[&str]) -> anyhow::Result<Self> {
        Self::start_inner(chunks, None, None).await
    }

    /// Start a mock that calls `tool` when offered tools and answers with
    /// `chunks` otherwise
    ///
    /// The arguments arrive split across one chunk per part.
    pub async fn start_with_tool_call(tool: &str, argument_parts: &[&str], chunks: &[&str]) -> anyhow::Result<Self> {
        let tool_call = ScriptedToolCall {
            name: tool.to_owned(),
            argument_parts: argument_parts.iter().map(|p| (*p).to_owned()).collect(),
        };
        Self::start_inner(chunks, None, Some(tool_call)).await
    }

    /// Start a mock that rejects every request with `status`
    pub async fn start_failing(status: StatusCode) -> anyhow::Result<Self> {
        Self::start_inner(&[], Some(status), None).await
    }

    async fn start_inner(
        chunks: &[&str],
        fail_with: Option<StatusCode>,
        tool_call: Option<ScriptedToolCall>,
    ) -> anyhow::Result<Self> {
        let state = Arc::new(MockLlmState {
            completion_count: AtomicU32::new(0),
            requests: Mutex::new(Vec::new()),
            chunks: chunks.iter().map(|c| (*c).to_owned()).collect(),
            fail_with,
            tool_call,
        });

        let app = Router::new()
            .route("/v1/chat/completions", routing::post(handle_chat_completions))
            .with_state(Arc::clone(&state));

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

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL for configuring the mock as the model endpoint
    ///
    /// Includes `/v1` since the client appends `/chat/completions`
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    /// Number of completion requests received
    pub fn completion_count(&self) -> u32 {
        self.state.completion_count.load(Ordering::Relaxed)
    }

    /// Request bodies received so far
    pub fn requests(&self) -> Vec<Value> {
        self.state.requests.lock().expect("requests lock").clone()
    }
}

impl Drop for MockLlm {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_chat_completions(State(state): State<Arc<MockLlmState>>, Json(req): Json<Value>) -> Response {
    state.completion_count.fetch_add(1, Ordering::Relaxed);
    state.requests.lock().expect("requests lock").push(req.clone());

    if let Some(status) = state.fail_with {
        return (
            status,
            Json(json!({
                "error": {
                    "message": "mock server intentional failure",
                    "type": "server_error"
                }
            })),
        )
            .into_response();
    }

    let model = req["model"].as_str().unwrap_or_default();
    let mut body = String::new();

    if model == REASONING_MODEL {
        push_chunk(&mut body, &chunk(model, json!({"role": "assistant", "reasoning_content": "Let me think"}), None));
    }

    match &state.tool_call {
        Some(call) if req.get("tools").is_some() => push_tool_call(&mut body, model, call),
        _ => {
            for content in &state.chunks {
                push_chunk(&mut body, &chunk(model, json!({"content": content}), None));
            }
            push_chunk(&mut body, &chunk(model, json!({}), Some("stop")));
        }
    }

    if req["stream_options"]["include_usage"] == json!(true) {
        push_chunk(
            &mut body,
            &json!({
                "id": "chatcmpl-test-stream",
                "object": "chat.completion.chunk",
                "model": model,
                "choices": [],
                "usage": {
                    "prompt_tokens": 10,
                    "completion_tokens": 5,
                    "total_tokens": 15,
                    "prompt_cache_hit_tokens": 4,
                    "prompt_cache_miss_tokens": 6
                }
            }),
        );
    }

    body.push_str("data: [DONE]\n\n");

    ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
}

fn push_tool_call(body: &mut String, model: &str, call: &ScriptedToolCall) {
    push_chunk(
        body,
        &chunk(
            model,
            json!({
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "index": 0,
                    "id": TOOL_CALL_ID,
                    "type": "function",
                    "function": {"name": call.name, "arguments": ""}
                }]
            }),
            None,
        ),
    );

    for part in &call.argument_parts {
        push_chunk(
            body,
            &chunk(
                model,
                json!({"tool_calls": [{"index": 0, "function": {"arguments": part}}]}),
                None,
            ),
        );
    }

    push_chunk(body, &chunk(model, json!({}), Some("tool_calls")));
}

fn chunk(model: &str, delta: Value, finish_reason: Option<&str>) -> Value {
    json!({
        "id": "chatcmpl-test-stream",
        "object": "chat.completion.chunk",
        "model": model,
        "choices": [{
            "index": 0,
            "delta": delta,
            "finish_reason": finish_reason
        }]
    })
}

fn push_chunk(body: &mut String, chunk: &Value) {
    body.push_str("data: ");
    body.push_str(&chunk.to_string());
    body.push_str("\n\n");
}
