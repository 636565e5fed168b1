//! Integration tests for the Ironhouse storefront.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p ironhouse-integration-tests
//! ```
//!
//! No database or real gym backend is needed. Each [`TestContext`] starts two
//! in-process servers on ephemeral ports:
//!
//! - [`StubBackend`], an in-memory stand-in for the gym REST backend
//! - the storefront itself, pointed at the stub, with sessions kept in memory
//!
//! Requests go through a `reqwest` client with a cookie store, so sessions
//! behave the way they do in a browser.

pub mod stub_backend;

use std::net::SocketAddr;
use std::time::Duration;

use ironhouse_core::CurrencyCode;
use ironhouse_storefront::config::{CheckoutConfig, GymApiConfig, StorefrontConfig};
use ironhouse_storefront::state::AppState;
use reqwest::{Client, Response};
use secrecy::SecretString;
use serde_json::json;
use sqlx::postgres::PgPoolOptions;
use tower_sessions::MemoryStore;

pub use stub_backend::{API_KEY, LockEvent, StubBackend};

/// Never dialled: sessions use `MemoryStore` and only readiness touches the pool.
const UNUSED_DATABASE_URL: &str = "postgres://ironhouse@127.0.0.1:1/ironhouse_test";
const SESSION_SECRET: &str = "tQ9vL2mX7pR4kW8zN3bH6cJ1fD5gS0aY";
const DEFAULT_LOCK_TTL: Duration = Duration::from_secs(600);

/// A running storefront wired to a fresh stub backend.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
    pub backend: StubBackend,
}

impl TestContext {
    /// Start a stub backend and a storefront in front of it.
    ///
    /// # Panics
    ///
    /// Panics if either server cannot be started.
    pub async fn new() -> Self {
        Self::with_lock_ttl(DEFAULT_LOCK_TTL).await
    }

    /// Like [`TestContext::new`], with pending checkouts expiring after
    /// `lock_ttl`.
    ///
    /// # Panics
    ///
    /// Panics if either server cannot be started.
    pub async fn with_lock_ttl(lock_ttl: Duration) -> Self {
        let backend = StubBackend::start().await;

        let pool = PgPoolOptions::new()
            .connect_lazy(UNUSED_DATABASE_URL)
            .expect("Failed to create lazy pool");
        let mut config = test_config(&backend);
        config.checkout.lock_ttl = lock_ttl;
        let state = AppState::new(config, pool).expect("Failed to build state");
        let addr = serve(ironhouse_storefront::app(state, MemoryStore::default())).await;

        let client = Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: format!("http://{addr}"),
            backend,
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Log in as a seeded account with the shared test password.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn login(&self, email: &str) -> Response {
        self.client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": stub_backend::PASSWORD }))
            .send()
            .await
            .expect("Failed to send login request")
    }

    /// POST a JSON body to a storefront path.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn post_json(&self, path: &str, body: &serde_json::Value) -> Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send request")
    }

    /// GET a storefront path and decode the JSON body.
    ///
    /// # Panics
    ///
    /// Panics if the request fails or the body is not JSON.
    pub async fn get_json(&self, path: &str) -> serde_json::Value {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Response body is not JSON")
    }

    /// Add a product to the current cart (guest or member).
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn add_to_cart(&self, product_id: &str, quantity: u32) -> Response {
        self.client
            .post(self.url("/api/cart/items"))
            .json(&json!({ "product_id": product_id, "quantity": quantity }))
            .send()
            .await
            .expect("Failed to send add-to-cart request")
    }
}

/// Serve `app` on an ephemeral local port and return its address.
///
/// # Panics
///
/// Panics if no local port can be bound.
pub async fn serve(app: axum::Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no address");
    tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("Test server failed");
    });
    addr
}

fn test_config(backend: &StubBackend) -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from(UNUSED_DATABASE_URL),
        host: std::net::IpAddr::from([127, 0, 0, 1]),
        port: 0,
        base_url: "http://127.0.0.1".to_string(),
        session_secret: SecretString::from(SESSION_SECRET),
        rate_limit_auth: false,
        gym_api: GymApiConfig {
            base_url: backend.base_url(),
            api_key: SecretString::from(API_KEY),
            timeout: Duration::from_secs(5),
            cache_ttl: Duration::from_secs(60),
        },
        checkout: CheckoutConfig {
            payment_key_id: "rzp_test_ironhouse".to_string(),
            currency: CurrencyCode::INR,
            lock_ttl: DEFAULT_LOCK_TTL,
        },
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}
