//! # Error Envelope Middleware
//!
//! Axum answers some failures itself with empty or plain-text bodies (405 from
//! a method router, 415/413 from body extractors). This rewrites any error
//! response that is not already JSON into the standard envelope.

use axum::extract::Request;
use axum::http::header::{ALLOW, CONTENT_TYPE};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::debug;

use crate::web::errors::ApiError;

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|content_type| content_type.starts_with("application/json"))
}

pub async fn envelope_framework_errors(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    let status = response.status();

    if !(status.is_client_error() || status.is_server_error()) || is_json(&response) {
        return response;
    }

    debug!(status = %status, "Wrapping framework error in JSON envelope");

    let allow = response.headers().get(ALLOW).cloned();
    let mut replacement = ApiError::from_status(status).into_response();
    if let Some(allow) = allow {
        replacement.headers_mut().insert(ALLOW, allow);
    }
    replacement
}
