use axum::Json;
use axum::response::{IntoResponse, Response};
use carrot_core::{ErrorBody, HttpError};
use http::StatusCode;

/// Rejections that happen before a chat stream starts
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("missing {header} header")]
    MissingUser { header: String },

    #[error("{header} header is not valid text")]
    InvalidUser { header: String },
}

impl HttpError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingUser { .. } | Self::InvalidUser { .. } => StatusCode::UNAUTHORIZED,
        }
    }

    fn error_type(&self) -> &str {
        "authentication_error"
    }

    fn client_message(&self) -> String {
        self.to_string()
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(ErrorBody::from_error(&self))).into_response()
    }
}
