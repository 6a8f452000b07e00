use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use carrot_core::RequestContext;
use http::HeaderName;

use crate::error::ServerError;

/// Build the `RequestContext` from the identity header
///
/// The header is set by the authentication layer in front of this service.
/// Requests without it are rejected before any work starts.
pub async fn request_context_middleware(user_header: HeaderName, mut request: Request, next: Next) -> Response {
    let user_id = match request.headers().get(&user_header).map(|v| v.to_str().map(str::trim)) {
        Some(Ok(id)) if !id.is_empty() => id.to_string(),
        Some(Ok(_)) | None => {
            return ServerError::MissingUser {
                header: user_header.to_string(),
            }
            .into_response();
        }
        Some(Err(_)) => {
            return ServerError::InvalidUser {
                header: user_header.to_string(),
            }
            .into_response();
        }
    };

    request.extensions_mut().insert(RequestContext::new(user_id));

    next.run(request).await
}
