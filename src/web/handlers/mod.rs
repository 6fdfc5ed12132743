//! # Web API Handlers

pub mod drinks;

use crate::web::errors::ApiError;

/// Fallback for unknown routes.
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
