//! # Web API Middleware
//!
//! Request IDs, JSON error envelopes for framework rejections, CORS and
//! request tracing.

pub mod error_envelope;
pub mod request_id;

use axum::http::{header, HeaderValue, Method};
use axum::middleware;
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::config::ServerSettings;
use crate::web::state::AppState;

/// Apply the middleware stack, innermost first:
/// 1. Error envelope for bare framework responses (404, 405, ...)
/// 2. Request ID generation
/// 3. CORS handling
/// 4. Request tracing
pub fn apply_middleware_stack(router: Router<AppState>, server: &ServerSettings) -> Router<AppState> {
    router
        .layer(middleware::from_fn(error_envelope::envelope_framework_errors))
        .layer(middleware::from_fn(request_id::add_request_id))
        .layer(create_cors_layer(&server.cors_allowed_origins))
        .layer(TraceLayer::new_for_http())
}

/// Create the CORS layer. A `*` entry allows any origin.
pub fn create_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origin = if allowed_origins.iter().any(|origin| origin == "*") {
        AllowOrigin::from(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
