mod message;
mod request;
mod stream;
mod tool;

pub use message::{FunctionCall, Message, Role, ToolCall};
pub use request::CompletionRequest;
pub use stream::{ChunkEvent, FinishReason, ToolCallDelta, Usage};
pub use tool::{FunctionDefinition, ToolDefinition};
