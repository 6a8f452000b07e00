//! Types shared by every Carrot crate

mod context;
mod error;

pub use context::{RequestContext, UserId};
pub use error::{ErrorBody, ErrorDetail, HttpError};
