//! # Request Extractors
//!
//! Verified claims from the request extensions, and a JSON body extractor
//! whose rejections use the API error envelope.

use async_trait::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::auth::AuthClaims;
use crate::web::errors::ApiError;

/// Claims inserted by [`authorize`](crate::web::authorize::authorize).
#[async_trait]
impl<S> FromRequestParts<S> for AuthClaims
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<AuthClaims>().cloned().ok_or_else(|| {
            warn!(path = %parts.uri.path(), "AuthClaims missing from request extensions");
            ApiError::Unauthorized
        })
    }
}

/// JSON body: malformed JSON is a 400, well-formed JSON of the wrong shape a 422.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(JsonRejection::JsonDataError(err)) => {
                debug!(error = %err.body_text(), "Request body has the wrong shape");
                Err(ApiError::unprocessable(err.body_text()))
            }
            Err(rejection) => {
                debug!(error = %rejection.body_text(), "Rejected request body");
                Err(ApiError::bad_request(rejection.body_text()))
            }
        }
    }
}
