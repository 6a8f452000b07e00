//! Streaming client for OpenAI-compatible chat completion APIs
//!
//! Raw SSE chunks are decoded once, at the provider boundary, into
//! [`ChunkEvent`]s so that callers never inspect wire JSON.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod convert;
pub mod error;
pub mod protocol;
pub mod provider;
pub mod types;

pub use error::LlmError;
pub use provider::{ChatModel, ChunkStream, openai::OpenAiModel};
pub use types::{
    ChunkEvent, CompletionRequest, FinishReason, FunctionCall, FunctionDefinition, Message, Role, ToolCall,
    ToolCallDelta, ToolDefinition, Usage,
};
