use std::sync::Arc;
use std::time::Duration;

use axum::http::{header::AUTHORIZATION, HeaderMap};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use rsa::{
    pkcs1::{DecodeRsaPublicKey, EncodeRsaPublicKey},
    pkcs8::DecodePublicKey,
    RsaPublicKey,
};
use tracing::{debug, info};

use super::jwks::{JwksConfig, JwksKeyStore};
use super::{AuthClaims, AuthError, Permission, TokenClaims};
use crate::config::AuthSettings;

/// Where signature verification keys come from
#[derive(Clone)]
pub enum KeySource {
    /// A single PEM public key; the token's `kid` is ignored
    Static(DecodingKey),
    Jwks(Arc<JwksKeyStore>),
}

impl std::fmt::Debug for KeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeySource::Static(_) => f.write_str("KeySource::Static"),
            KeySource::Jwks(store) => write!(f, "KeySource::Jwks({})", store.config().url),
        }
    }
}

/// Verifies bearer tokens against the configured issuer, audience and keys.
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    keys: KeySource,
    issuer: String,
    audience: String,
}

impl TokenVerifier {
    pub fn new(keys: KeySource, issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            keys,
            issuer: issuer.into(),
            audience: audience.into(),
        }
    }

    pub fn with_static_key(
        public_key_pem: &str,
        issuer: impl Into<String>,
        audience: impl Into<String>,
    ) -> Result<Self, AuthError> {
        let key = parse_public_key(public_key_pem)?;
        Ok(Self::new(KeySource::Static(key), issuer, audience))
    }

    /// Build from settings. A configured PEM file wins over the JWKS endpoint.
    pub async fn from_settings(settings: &AuthSettings) -> Result<Self, AuthError> {
        let issuer = settings.issuer();

        if let Some(path) = settings.public_key_path() {
            let pem = std::fs::read_to_string(path).map_err(|e| {
                AuthError::ConfigurationError(format!(
                    "Failed to read public key {}: {e}",
                    path.display()
                ))
            })?;
            info!(path = %path.display(), issuer = %issuer, "Using static public key for token verification");
            return Self::with_static_key(&pem, issuer, settings.audience.clone());
        }

        let url = settings.jwks_url().ok_or_else(|| {
            AuthError::ConfigurationError("No JWKS URL or public key configured".to_string())
        })?;
        let config = JwksConfig {
            refresh_interval: Duration::from_secs(settings.jwks_refresh_interval_seconds),
            allow_http: settings.jwks_allow_http,
            ..JwksConfig::new(url)
        };
        let store = JwksKeyStore::with_config(config).await?;
        info!(
            url = %store.config().url,
            keys = store.key_count().await,
            issuer = %issuer,
            "Using JWKS for token verification"
        );

        Ok(Self::new(
            KeySource::Jwks(Arc::new(store)),
            issuer,
            settings.audience.clone(),
        ))
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    /// Run the full check: header, token, then `permission`.
    pub async fn requires_auth(
        &self,
        headers: &HeaderMap,
        permission: Permission,
    ) -> Result<AuthClaims, AuthError> {
        let token = extract_bearer_token(headers)?;
        let claims = self.verify_decode(token).await?;
        check_permissions(permission, &claims)?;
        Ok(claims)
    }

    /// Verify signature, issuer, audience and expiry, and require a
    /// `permissions` claim.
    pub async fn verify_decode(&self, token: &str) -> Result<AuthClaims, AuthError> {
        let header = decode_header(token)
            .map_err(|e| AuthError::InvalidToken(format!("Unable to parse token header: {e}")))?;

        let key = match &self.keys {
            KeySource::Static(key) => key.clone(),
            KeySource::Jwks(store) => {
                let kid = header
                    .kid
                    .ok_or_else(|| AuthError::InvalidHeader("Authorization malformed.".to_string()))?;
                store.get_key(&kid).await?
            }
        };

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.validate_exp = true;
        validation.validate_nbf = false;

        let token_data = decode::<TokenClaims>(token, &key, &validation).map_err(classify_jwt_error)?;

        debug!(
            subject = %token_data.claims.sub,
            permissions = ?token_data.claims.permissions,
            "Token validated"
        );

        AuthClaims::try_from(token_data.claims)
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| {
            AuthError::InvalidHeader("Authorization header is not valid ASCII.".to_string())
        })?;

    let parts: Vec<&str> = value.split_whitespace().collect();
    match parts.as_slice() {
        [scheme, token] if scheme.eq_ignore_ascii_case("bearer") => Ok(*token),
        [scheme, ..] if !scheme.eq_ignore_ascii_case("bearer") => Err(AuthError::InvalidHeader(
            "Authorization header must start with \"Bearer\".".to_string(),
        )),
        [] => Err(AuthError::InvalidHeader(
            "Authorization header must start with \"Bearer\".".to_string(),
        )),
        [_] => Err(AuthError::InvalidHeader("Token not found.".to_string())),
        _ => Err(AuthError::InvalidHeader(
            "Authorization header must be bearer token.".to_string(),
        )),
    }
}

/// Require `permission` to appear verbatim in the verified claims.
pub fn check_permissions(permission: Permission, claims: &AuthClaims) -> Result<(), AuthError> {
    if claims.has_permission(permission) {
        Ok(())
    } else {
        Err(AuthError::PermissionDenied(format!(
            "'{permission}' not granted to {}",
            claims.subject
        )))
    }
}

fn classify_jwt_error(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        ErrorKind::InvalidIssuer | ErrorKind::InvalidAudience => AuthError::InvalidClaims(
            "Incorrect claims. Please, check the audience and issuer.".to_string(),
        ),
        ErrorKind::MissingRequiredClaim(claim) => {
            AuthError::InvalidClaims(format!("Missing required claim '{claim}'"))
        }
        _ => AuthError::InvalidToken(format!("Unable to parse authentication token: {err}")),
    }
}

/// Parse an RSA public key from PEM (PKCS#8 or PKCS#1).
fn parse_public_key(pem: &str) -> Result<DecodingKey, AuthError> {
    let key = RsaPublicKey::from_public_key_pem(pem)
        .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
        .map_err(|e| {
            AuthError::KeyParsingError(format!("Failed to parse RSA public key from PEM: {e}"))
        })?;

    let der = key.to_pkcs1_der().map_err(|e| {
        AuthError::KeyParsingError(format!("Failed to convert public key to DER: {e}"))
    })?;
    Ok(DecodingKey::from_rsa_der(der.as_bytes()))
}
