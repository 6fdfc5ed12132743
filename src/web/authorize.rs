//! # Handler Authorization Wrapper
//!
//! Declarative permission checks at the route level:
//!
//! ```rust,ignore
//! Router::new()
//!     .route("/drinks", post(authorize(Permission::PostDrinks, create_drink)))
//!     // Public routes don't need authorize():
//!     .route("/drinks", get(list_drinks))
//! ```
//!
//! The bearer token is verified before the inner handler runs, so a rejected
//! request never has its body deserialized. On success the verified
//! [`AuthClaims`] are placed in the request extensions for the handler.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::extract::{FromRef, Request};
use axum::handler::Handler;
use axum::response::{IntoResponse, Response};
use tracing::{debug, error, warn};

use crate::auth::{AuthClaims, Permission, TokenVerifier};
use crate::web::errors::ApiError;

/// Wrap `handler` so it only runs for tokens granting `permission`.
pub fn authorize<H>(permission: Permission, handler: H) -> AuthorizedHandler<H> {
    AuthorizedHandler {
        permission,
        inner: handler,
    }
}

/// Handler wrapper that verifies the bearer token before delegating.
#[derive(Clone)]
pub struct AuthorizedHandler<H> {
    permission: Permission,
    inner: H,
}

impl<H> AuthorizedHandler<H> {
    pub fn permission(&self) -> Permission {
        self.permission
    }
}

impl<H, T, S> Handler<T, S> for AuthorizedHandler<H>
where
    H: Handler<T, S> + Clone + Send + 'static,
    T: 'static,
    S: Clone + Send + Sync + 'static,
    Arc<TokenVerifier>: FromRef<S>,
{
    type Future = Pin<Box<dyn Future<Output = Response> + Send>>;

    fn call(self, mut req: Request, state: S) -> Self::Future {
        Box::pin(async move {
            let verifier = Arc::<TokenVerifier>::from_ref(&state);

            let claims: AuthClaims = match verifier.requires_auth(req.headers(), self.permission).await {
                Ok(claims) => claims,
                Err(err) if err.is_server_error() => {
                    error!(
                        permission = %self.permission,
                        error = %err,
                        "Token verification unavailable"
                    );
                    return ApiError::from(err).into_response();
                }
                Err(err) => {
                    warn!(
                        permission = %self.permission,
                        method = %req.method(),
                        path = %req.uri().path(),
                        code = err.code(),
                        reason = %err,
                        "Authorization failed"
                    );
                    return ApiError::from(err).into_response();
                }
            };

            debug!(
                subject = %claims.subject,
                permission = %self.permission,
                "Request authorized"
            );
            req.extensions_mut().insert(claims);

            self.inner.call(req, state).await
        })
    }
}
