//! # Authorization
//!
//! Bearer token verification against an external identity provider, plus the
//! permission check that gates the drink mutation endpoints.

pub mod claims;
pub mod error;
pub mod jwks;
pub mod permissions;
pub mod verifier;

pub use claims::{Audience, AuthClaims, TokenClaims};
pub use error::AuthError;
pub use jwks::{JwksConfig, JwksKeyStore};
pub use permissions::Permission;
pub use verifier::{check_permissions, extract_bearer_token, KeySource, TokenVerifier};
