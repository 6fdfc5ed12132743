//! # JWKS Key Store
//!
//! Caches the identity provider's RSA signing keys, keyed by `kid`.
//!
//! The set is fetched once at construction. A lookup triggers a refetch when
//! the cache has aged past `refresh_interval`, or when the `kid` is unknown and
//! the last fetch is older than `miss_cooldown`. Concurrent misses share one
//! fetch.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use jsonwebtoken::DecodingKey;
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, warn};

use super::AuthError;

const ALLOWED_ALGORITHMS: &[&str] = &["RS256"];

#[derive(Debug, Clone)]
pub struct JwksConfig {
    pub url: String,
    pub refresh_interval: Duration,
    /// Minimum spacing between refetches caused by an unknown `kid`
    pub miss_cooldown: Duration,
    /// Allow plain HTTP endpoints (local testing only)
    pub allow_http: bool,
}

impl JwksConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            refresh_interval: Duration::from_secs(3600),
            miss_cooldown: Duration::from_secs(60),
            allow_http: false,
        }
    }
}

struct CachedKeys {
    keys: HashMap<String, DecodingKey>,
    fetched_at: Instant,
}

impl std::fmt::Debug for CachedKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kids: Vec<&str> = self.keys.keys().map(String::as_str).collect();
        kids.sort_unstable();
        f.debug_struct("CachedKeys")
            .field("kids", &kids)
            .field("fetched_at", &self.fetched_at)
            .finish()
    }
}

impl CachedKeys {
    fn lookup(&self, kid: &str, max_age: Duration) -> Option<DecodingKey> {
        if self.fetched_at.elapsed() < max_age {
            self.keys.get(kid).cloned()
        } else {
            None
        }
    }
}

/// RFC 7517 key set document
#[derive(Debug, Deserialize)]
struct JwkSet {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: Option<String>,
    kty: String,
    n: Option<String>,
    e: Option<String>,
    #[serde(rename = "use")]
    key_use: Option<String>,
    alg: Option<String>,
}

#[derive(Debug)]
pub struct JwksKeyStore {
    cache: RwLock<CachedKeys>,
    refresh_lock: Mutex<()>,
    config: JwksConfig,
    client: reqwest::Client,
}

impl JwksKeyStore {
    /// Validate the endpoint and perform the initial fetch.
    pub async fn with_config(config: JwksConfig) -> Result<Self, AuthError> {
        validate_url(&config.url, config.allow_http)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| {
                AuthError::ConfigurationError(format!("Failed to create HTTP client: {e}"))
            })?;

        let keys = fetch_keys(&client, &config.url).await?;

        Ok(Self {
            cache: RwLock::new(CachedKeys {
                keys,
                fetched_at: Instant::now(),
            }),
            refresh_lock: Mutex::new(()),
            config,
            client,
        })
    }

    pub fn config(&self) -> &JwksConfig {
        &self.config
    }

    /// Number of usable keys currently cached.
    pub async fn key_count(&self) -> usize {
        self.cache.read().await.keys.len()
    }

    /// Get the decoding key for `kid`, refetching the set when allowed.
    pub async fn get_key(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        if let Some(key) = self.cache.read().await.lookup(kid, self.config.refresh_interval) {
            return Ok(key);
        }

        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited.
        let (expired, recently_fetched) = {
            let cache = self.cache.read().await;
            if let Some(key) = cache.lookup(kid, self.config.refresh_interval) {
                return Ok(key);
            }
            let age = cache.fetched_at.elapsed();
            (
                age >= self.config.refresh_interval,
                age < self.config.miss_cooldown,
            )
        };

        if !expired && recently_fetched {
            debug!(kid = %kid, "Unknown key id within refetch cooldown");
            return Err(AuthError::SigningKeyNotFound(format!(
                "Key ID '{kid}' not found in JWKS"
            )));
        }

        match fetch_keys(&self.client, &self.config.url).await {
            Ok(keys) => {
                let mut cache = self.cache.write().await;
                *cache = CachedKeys {
                    keys,
                    fetched_at: Instant::now(),
                };
                cache.keys.get(kid).cloned().ok_or_else(|| {
                    AuthError::SigningKeyNotFound(format!("Key ID '{kid}' not found in JWKS"))
                })
            }
            Err(refresh_err) => {
                let cache = self.cache.read().await;
                match cache.keys.get(kid) {
                    Some(key) => {
                        warn!(
                            kid = %kid,
                            staleness_secs = cache.fetched_at.elapsed().as_secs(),
                            "JWKS refresh failed, using stale key"
                        );
                        Ok(key.clone())
                    }
                    None => {
                        warn!(kid = %kid, error = %refresh_err, "JWKS refresh failed for unknown key id");
                        Err(AuthError::SigningKeyNotFound(format!(
                            "Key ID '{kid}' not found in JWKS"
                        )))
                    }
                }
            }
        }
    }
}

async fn fetch_keys(
    client: &reqwest::Client,
    url: &str,
) -> Result<HashMap<String, DecodingKey>, AuthError> {
    debug!(url = %url, "Fetching JWKS keys");

    let response = client.get(url).send().await.map_err(|e| {
        error!(url = %url, error = %e, "JWKS fetch failed");
        AuthError::ConfigurationError(format!("JWKS fetch failed: {e}"))
    })?;

    if !response.status().is_success() {
        let status = response.status();
        warn!(url = %url, status = %status, "JWKS endpoint returned error");
        return Err(AuthError::ConfigurationError(format!(
            "JWKS endpoint returned {status}"
        )));
    }

    let jwks: JwkSet = response.json().await.map_err(|e| {
        AuthError::ConfigurationError(format!("Failed to parse JWKS response: {e}"))
    })?;

    let keys: HashMap<String, DecodingKey> = jwks.keys.iter().filter_map(signing_key).collect();

    if keys.is_empty() {
        warn!(url = %url, "No usable RSA signing keys in JWKS response");
    } else {
        debug!(count = keys.len(), "JWKS keys loaded");
    }
    Ok(keys)
}

/// Keep RSA signature keys with an allowed algorithm and complete components.
fn signing_key(jwk: &Jwk) -> Option<(String, DecodingKey)> {
    if jwk.kty != "RSA" || jwk.key_use.as_deref().is_some_and(|u| u != "sig") {
        return None;
    }
    if let Some(alg) = &jwk.alg {
        if !ALLOWED_ALGORITHMS.contains(&alg.as_str()) {
            warn!(kid = ?jwk.kid, alg = %alg, "Skipping JWKS key with disallowed algorithm");
            return None;
        }
    }

    let (kid, n, e) = (jwk.kid.as_ref()?, jwk.n.as_ref()?, jwk.e.as_ref()?);
    match DecodingKey::from_rsa_components(n, e) {
        Ok(key) => Some((kid.clone(), key)),
        Err(err) => {
            warn!(kid = %kid, error = %err, "Failed to parse JWKS key components");
            None
        }
    }
}

fn validate_url(url: &str, allow_http: bool) -> Result<(), AuthError> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|e| AuthError::ConfigurationError(format!("Invalid JWKS URL: {e}")))?;

    match parsed.scheme() {
        "https" => {}
        "http" if allow_http => {
            warn!(url = %url, "JWKS URL uses plain HTTP");
        }
        other => {
            return Err(AuthError::ConfigurationError(format!(
                "JWKS URL must use HTTPS (got '{other}')"
            )));
        }
    }

    if parsed.host_str().is_none() {
        return Err(AuthError::ConfigurationError(
            "JWKS URL has no host".to_string(),
        ));
    }
    Ok(())
}
