//! Model backends

pub mod openai;

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;

use crate::error::LlmError;
use crate::types::{ChunkEvent, CompletionRequest};

/// Stream of decoded chunk events
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<ChunkEvent, LlmError>> + Send>>;

/// A chat model that answers with a stream of chunk events
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Human-readable backend name
    fn name(&self) -> &str;

    /// Start a streaming completion
    async fn stream_chat(&self, request: &CompletionRequest) -> Result<ChunkStream, LlmError>;
}
