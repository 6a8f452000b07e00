mod harness;

use std::sync::Arc;

use carrot_config::{ToolServerConfig, TransportKind};
use carrot_mcp::{JsonObject, McpError, RmcpConnector, SessionConnector as _, ToolWorker, WorkerTimeouts};
use harness::mock_mcp::{API_KEY_HEADER, MockMcp};
use serde_json::json;

fn server_config(mcp: &MockMcp) -> ToolServerConfig {
    let mut config = ToolServerConfig::new(mcp.url().parse().unwrap(), TransportKind::StreamableHttp);
    config.env.insert(API_KEY_HEADER.to_owned(), "secret-1".to_owned());
    config
}

fn args(value: serde_json::Value) -> Option<JsonObject> {
    value.as_object().cloned()
}

#[tokio::test]
async fn session_lists_and_calls_tools() {
    let mcp = MockMcp::start().await.unwrap();
    let mut session = RmcpConnector.connect("math", &server_config(&mcp)).await.unwrap();

    let tools = session.list_tools().await.unwrap();
    let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["add", "divide", "chart"]);
    assert_eq!(tools[0].description.as_deref(), Some("Add two numbers"));
    assert_eq!(tools[0].input_schema["required"], json!(["a", "b"]));

    let sum = session.call_tool("add", args(json!({"a": 2, "b": 3}))).await.unwrap();
    assert_eq!(sum, "5");

    session.close().await;
}

#[tokio::test]
async fn tool_error_result_is_an_execution_error() {
    let mcp = MockMcp::start().await.unwrap();
    let mut session = RmcpConnector.connect("math", &server_config(&mcp)).await.unwrap();

    let err = session
        .call_tool("divide", args(json!({"a": 1, "b": 0})))
        .await
        .unwrap_err();
    assert!(matches!(&err, McpError::Execution(text) if text == "division by zero"), "{err}");

    session.close().await;
}

#[tokio::test]
async fn non_text_blocks_are_rendered_as_json() {
    let mcp = MockMcp::start().await.unwrap();
    let mut session = RmcpConnector.connect("math", &server_config(&mcp)).await.unwrap();

    let rendered = session.call_tool("chart", None).await.unwrap();
    let (text, image) = rendered.split_once('\n').unwrap();
    assert_eq!(text, "rendered");
    let image: serde_json::Value = serde_json::from_str(image).unwrap();
    assert_eq!(image["mimeType"], "image/png");

    session.close().await;
}

#[tokio::test]
async fn env_entries_reach_the_server_as_headers() {
    let mcp = MockMcp::start().await.unwrap();
    let mut session = RmcpConnector.connect("math", &server_config(&mcp)).await.unwrap();
    session.list_tools().await.unwrap();
    session.close().await;

    let keys = mcp.api_keys();
    assert!(!keys.is_empty());
    assert!(keys.iter().all(|key| key == "secret-1"), "{keys:?}");
}

#[tokio::test]
async fn worker_drives_a_real_session() {
    let mcp = MockMcp::start().await.unwrap();
    let timeouts = WorkerTimeouts::default();
    let mut worker = ToolWorker::connect("math", server_config(&mcp), Arc::new(RmcpConnector), timeouts)
        .await
        .unwrap();

    assert!(worker.is_alive());
    assert!(worker.has_tool("divide"));

    let quotient = worker
        .call_tool("divide", args(json!({"a": 9, "b": 3})))
        .await
        .unwrap();
    assert_eq!(quotient, "3");

    let err = worker.call_tool("sqrt", None).await.unwrap_err();
    assert!(matches!(err, McpError::ToolNotFound { .. }), "{err}");

    worker.disconnect().await;
    assert!(!worker.is_alive());
}
