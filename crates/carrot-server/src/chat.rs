use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Extension, Json, Router};
use carrot_chat::{ChatOrchestrator, ChatTurnRequest};
use carrot_core::RequestContext;
use futures_util::StreamExt as _;
use http::{HeaderName, HeaderValue, header};

pub const CHAT_STREAM_PATH: &str = "/api/v1/chat/stream";

pub fn chat_router(orchestrator: ChatOrchestrator) -> Router {
    Router::new()
        .route(CHAT_STREAM_PATH, post(chat_stream))
        .with_state(orchestrator)
}

/// Handle `POST /api/v1/chat/stream`
///
/// Failures inside the turn are reported as events; the response itself is
/// always a 200 event stream ending with `[DONE]`.
async fn chat_stream(
    State(orchestrator): State<ChatOrchestrator>,
    Extension(context): Extension<RequestContext>,
    Json(request): Json<ChatTurnRequest>,
) -> Response {
    tracing::info!(
        user_id = %context.user_id,
        model = %request.model,
        deep_thinking = request.use_deep_thinking,
        tools = request.wants_tools(),
        "chat turn requested"
    );

    let events = orchestrator
        .stream_turn(context, request)
        .map(|event| Ok::<_, Infallible>(Event::default().data(event.to_sse_data())));

    let headers = [
        (header::CACHE_CONTROL, HeaderValue::from_static("no-cache")),
        (HeaderName::from_static("x-accel-buffering"), HeaderValue::from_static("no")),
        (header::CONTENT_ENCODING, HeaderValue::from_static("identity")),
    ];

    (headers, Sse::new(events).keep_alive(KeepAlive::default())).into_response()
}
