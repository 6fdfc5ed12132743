use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AuthError, Permission};

/// `aud` may be a single string or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Multiple(Vec<String>),
}

impl Audience {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Audience::Single(aud) => vec![aud],
            Audience::Multiple(auds) => auds,
        }
    }
}

/// Raw JWT payload as issued by the identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub sub: String,
    #[serde(default)]
    pub iss: Option<String>,
    #[serde(default)]
    pub aud: Option<Audience>,
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
    /// Absent entirely when the API has RBAC disabled at the provider
    #[serde(default)]
    pub permissions: Option<Vec<String>>,
}

/// Verified, per-request claims handed to authorized handlers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthClaims {
    pub subject: String,
    pub issuer: Option<String>,
    pub audience: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub permissions: Vec<String>,
}

impl AuthClaims {
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.iter().any(|p| p == permission.as_str())
    }
}

impl TryFrom<TokenClaims> for AuthClaims {
    type Error = AuthError;

    fn try_from(claims: TokenClaims) -> Result<Self, Self::Error> {
        let permissions = claims.permissions.ok_or(AuthError::MissingPermissions)?;

        Ok(AuthClaims {
            subject: claims.sub,
            issuer: claims.iss,
            audience: claims.aud.map(Audience::into_vec).unwrap_or_default(),
            expires_at: DateTime::<Utc>::from_timestamp(claims.exp, 0),
            permissions,
        })
    }
}
