//! # Web API
//!
//! HTTP surface for the drinks menu.
//!
//! - `GET /drinks` public menu (short view)
//! - `GET /drinks-detail` full recipes, `get:drinks-detail`
//! - `POST /drinks` `post:drinks`
//! - `PATCH /drinks/:id` `patch:drinks`
//! - `DELETE /drinks/:id` `delete:drinks`

pub mod authorize;
pub mod errors;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod response_types;
pub mod routes;
pub mod state;

use axum::Router;

pub use errors::{ApiError, ApiResult, ErrorEnvelope};
pub use state::AppState;

/// Build the application router with middleware and state attached.
pub fn create_app(app_state: AppState) -> Router {
    let router = Router::new()
        .merge(routes::drink_routes())
        .fallback(handlers::not_found);

    middleware::apply_middleware_stack(router, &app_state.settings.server).with_state(app_state)
}
