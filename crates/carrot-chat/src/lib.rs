//! Chat turns for Carrot
//!
//! A [`ChatOrchestrator`] drives one [`ChatTurnRequest`] from message
//! preparation through the model stream, an optional round of tool calls and
//! usage accounting, and reports everything as a stream of [`ChatEvent`]s
//! that always ends with [`ChatEvent::Done`].

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod accumulator;
pub mod error;
pub mod event;
pub mod orchestrator;
pub mod request;
pub mod sequence;

pub use accumulator::ToolCallAccumulator;
pub use error::ChatError;
pub use event::ChatEvent;
pub use orchestrator::{ChatOrchestrator, ChatSettings};
pub use request::{ChatMessage, ChatTurnRequest};
pub use sequence::{SequencingError, prepare_messages};
