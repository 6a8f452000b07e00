use thiserror::Error;

/// Errors raised while talking to the upstream model
#[derive(Debug, Error)]
pub enum LlmError {
    /// The request could not be delivered
    #[error("upstream error: {0}")]
    Upstream(String),

    /// The upstream answered with a non-success status
    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The event stream broke after it started
    #[error("streaming error: {0}")]
    Streaming(String),
}
