//! # Test Infrastructure
//!
//! In-memory drink store, JWT generators signed with the fixture keys, and a
//! server bound to an ephemeral port.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use coffee_shop::auth::TokenVerifier;
use coffee_shop::config::Settings;
use coffee_shop::models::{Drink, DrinkError, NewDrink};
use coffee_shop::storage::DrinkStore;
use coffee_shop::web::{create_app, AppState};

// =============================================================================
// Test JWT Constants
// =============================================================================

pub const TEST_JWT_ISSUER: &str = "https://coffee-shop.test/";
pub const TEST_JWT_AUDIENCE: &str = "drinks";
pub const TEST_KEY_ID: &str = "coffee-shop-test-key";

pub const BARISTA_PERMISSIONS: &[&str] = &["get:drinks-detail"];
pub const MANAGER_PERMISSIONS: &[&str] = &[
    "get:drinks-detail",
    "post:drinks",
    "patch:drinks",
    "delete:drinks",
];

// =============================================================================
// In-Memory Drink Store
// =============================================================================

/// `DrinkStore` double with the same uniqueness and not-found rules as Postgres.
#[derive(Debug, Default)]
pub struct MemoryDrinkStore {
    rows: Mutex<BTreeMap<i32, Drink>>,
    next_id: AtomicI32,
    fail_writes: AtomicBool,
}

impl MemoryDrinkStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Insert a row directly, bypassing request validation.
    pub async fn seed(&self, title: &str, recipe: Value) -> Drink {
        self.insert(NewDrink {
            title: title.to_string(),
            recipe: recipe.to_string(),
        })
        .await
        .expect("seed drink")
    }

    /// Make every subsequent write fail as if the database were unreachable.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.rows.lock().await.len()
    }

    pub async fn get(&self, id: i32) -> Option<Drink> {
        self.rows.lock().await.get(&id).cloned()
    }

    fn check_writable(&self) -> Result<(), DrinkError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(DrinkError::Database(sqlx::Error::PoolTimedOut))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DrinkStore for MemoryDrinkStore {
    async fn all(&self) -> Result<Vec<Drink>, DrinkError> {
        Ok(self.rows.lock().await.values().cloned().collect())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Drink>, DrinkError> {
        Ok(self.rows.lock().await.get(&id).cloned())
    }

    async fn insert(&self, drink: NewDrink) -> Result<Drink, DrinkError> {
        self.check_writable()?;
        let mut rows = self.rows.lock().await;
        if rows.values().any(|row| row.title == drink.title) {
            return Err(DrinkError::DuplicateTitle { title: drink.title });
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let row = Drink {
            id,
            title: drink.title,
            recipe: drink.recipe,
        };
        rows.insert(id, row.clone());
        Ok(row)
    }

    async fn update(&self, drink: &Drink) -> Result<Drink, DrinkError> {
        self.check_writable()?;
        let mut rows = self.rows.lock().await;
        if rows
            .values()
            .any(|row| row.id != drink.id && row.title == drink.title)
        {
            return Err(DrinkError::DuplicateTitle {
                title: drink.title.clone(),
            });
        }

        match rows.get_mut(&drink.id) {
            Some(row) => {
                *row = drink.clone();
                Ok(row.clone())
            }
            None => Err(DrinkError::NotFound { id: drink.id }),
        }
    }

    async fn delete(&self, id: i32) -> Result<(), DrinkError> {
        self.check_writable()?;
        match self.rows.lock().await.remove(&id) {
            Some(_) => Ok(()),
            None => Err(DrinkError::NotFound { id }),
        }
    }
}

// =============================================================================
// Token Generators
// =============================================================================

/// JWT claims structure for tests
#[derive(Debug, Serialize, Deserialize)]
pub struct TestClaims {
    pub sub: String,
    pub iss: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
}

pub fn fixture_path(name: &str) -> PathBuf {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(manifest_dir)
        .join("tests/fixtures/auth")
        .join(name)
}

pub fn read_fixture(name: &str) -> String {
    let path = fixture_path(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {e}", path.display()))
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock")
        .as_secs() as i64
}

pub fn claims_with(permissions: &[&str]) -> TestClaims {
    let now = now();
    TestClaims {
        sub: "auth0|test-user".to_string(),
        iss: TEST_JWT_ISSUER.to_string(),
        aud: TEST_JWT_AUDIENCE.to_string(),
        exp: now + 3600,
        iat: now,
        permissions: Some(permissions.iter().map(|s| s.to_string()).collect()),
    }
}

/// Sign `claims` with a fixture private key, optionally setting `kid`.
pub fn sign(claims: &TestClaims, private_key_fixture: &str, kid: Option<&str>) -> String {
    let private_key = read_fixture(private_key_fixture);
    let mut header = Header::new(Algorithm::RS256);
    header.kid = kid.map(str::to_string);
    let encoding_key = EncodingKey::from_rsa_pem(private_key.as_bytes())
        .expect("Failed to create encoding key from test private key");
    encode(&header, claims, &encoding_key).expect("Failed to encode JWT")
}

/// Valid token with the given permissions.
pub fn generate_jwt(permissions: &[&str]) -> String {
    sign(
        &claims_with(permissions),
        "jwt-private-key-test.pem",
        Some(TEST_KEY_ID),
    )
}

/// Token that expired an hour ago.
pub fn generate_expired_jwt(permissions: &[&str]) -> String {
    let mut claims = claims_with(permissions);
    claims.exp = now() - 3600;
    claims.iat = now() - 7200;
    sign(&claims, "jwt-private-key-test.pem", Some(TEST_KEY_ID))
}

pub fn generate_jwt_wrong_issuer(permissions: &[&str]) -> String {
    let mut claims = claims_with(permissions);
    claims.iss = "https://impostor.test/".to_string();
    sign(&claims, "jwt-private-key-test.pem", Some(TEST_KEY_ID))
}

pub fn generate_jwt_wrong_audience(permissions: &[&str]) -> String {
    let mut claims = claims_with(permissions);
    claims.aud = "payments".to_string();
    sign(&claims, "jwt-private-key-test.pem", Some(TEST_KEY_ID))
}

/// Token whose payload has no `permissions` claim at all.
pub fn generate_jwt_without_permissions() -> String {
    let mut claims = claims_with(&[]);
    claims.permissions = None;
    sign(&claims, "jwt-private-key-test.pem", Some(TEST_KEY_ID))
}

/// Token signed by a key the server does not trust.
pub fn generate_untrusted_jwt(permissions: &[&str]) -> String {
    sign(
        &claims_with(permissions),
        "jwt-private-key-untrusted.pem",
        Some(TEST_KEY_ID),
    )
}

// =============================================================================
// Test Server
// =============================================================================

#[derive(Debug)]
pub struct TestServer {
    pub base_url: String,
    pub store: Arc<MemoryDrinkStore>,
    handle: JoinHandle<()>,
    shutdown_tx: tokio::sync::oneshot::Sender<()>,
}

impl TestServer {
    /// Serve the app over `store`, verifying tokens with the fixture public key.
    pub async fn start(store: Arc<MemoryDrinkStore>) -> Self {
        let verifier = TokenVerifier::with_static_key(
            &read_fixture("jwt-public-key-test.pem"),
            TEST_JWT_ISSUER,
            TEST_JWT_AUDIENCE,
        )
        .expect("Failed to build token verifier");

        let state = AppState::new(Settings::default(), store.clone(), Arc::new(verifier));
        let app = create_app(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("local addr");

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("Test server failed");
        });

        TestServer {
            base_url: format!("http://{addr}"),
            store,
            handle,
            shutdown_tx,
        }
    }

    pub fn client(&self) -> TestClient {
        TestClient::new(&self.base_url)
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("Test server did not shut down in time")
            .expect("Test server task panicked");
    }
}

// =============================================================================
// Test Client
// =============================================================================

#[derive(Debug, Clone)]
pub struct TestClient {
    client: Client,
    base_url: String,
    jwt_token: Option<String>,
}

impl TestClient {
    pub fn new(base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.to_string(),
            jwt_token: None,
        }
    }

    pub fn with_jwt(mut self, token: &str) -> Self {
        self.jwt_token = Some(token.to_string());
        self
    }

    pub fn without_auth(mut self) -> Self {
        self.jwt_token = None;
        self
    }

    pub fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        match &self.jwt_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        send(self.request(reqwest::Method::GET, path)).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> (StatusCode, Value) {
        send(self.request(reqwest::Method::POST, path).json(body)).await
    }

    pub async fn patch(&self, path: &str, body: &Value) -> (StatusCode, Value) {
        send(self.request(reqwest::Method::PATCH, path).json(body)).await
    }

    pub async fn delete(&self, path: &str) -> (StatusCode, Value) {
        send(self.request(reqwest::Method::DELETE, path)).await
    }
}

/// Send and decode the JSON body (`Value::Null` if the body is not JSON).
pub async fn send(request: reqwest::RequestBuilder) -> (StatusCode, Value) {
    let response = request.send().await.expect("request failed");
    let status = response.status();
    let body = response.json::<Value>().await.unwrap_or(Value::Null);
    (status, body)
}

/// Assert the standard error envelope.
pub fn assert_error_envelope(context: &str, status: StatusCode, body: &Value, expected: u16, message: &str) {
    assert_eq!(status.as_u16(), expected, "{context}: status (body: {body})");
    assert_eq!(body["success"], false, "{context}: success flag");
    assert_eq!(body["error"], expected, "{context}: error code");
    assert_eq!(body["message"], message, "{context}: message");
}
