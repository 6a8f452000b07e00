#![allow(dead_code)]

pub mod config;
pub mod mock_mcp;
pub mod mock_llm;
pub mod server;

/// Parse SSE data payloads from raw response text
pub fn parse_sse_data(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .map(str::to_owned)
        .collect()
}

/// Parse every JSON payload, skipping the end marker
pub fn parse_events(text: &str) -> Vec<serde_json::Value> {
    parse_sse_data(text)
        .iter()
        .filter(|data| data.as_str() != "[DONE]")
        .map(|data| serde_json::from_str(data).expect("event payload is JSON"))
        .collect()
}
