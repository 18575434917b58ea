//! Integration tests for the Tierra Querida ordering API.
//!
//! These run over HTTP against a live server with a migrated and seeded
//! database, so every test is `#[ignore]`d by default.
//!
//! # Running Tests
//!
//! ```bash
//! cargo run -p tq-cli -- migrate
//! cargo run -p tq-cli -- seed crates/cli/seed/catalogo.yaml
//! cargo run -p tq-server &
//! cargo test -p tq-integration-tests -- --ignored
//! ```
//!
//! `TQ_TEST_BASE_URL` points the tests at another server
//! (default `http://localhost:3000`).

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::{Value, json};
use uuid::Uuid;

/// Shared state for one test: a cookie-keeping client and the server URL.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
}

impl TestContext {
    /// Create a context with a fresh cookie jar.
    ///
    /// Each context claims its own client IP through `X-Forwarded-For`, so
    /// parallel tests don't share one `/api/auth` rate limit bucket.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client can't be built.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_str(&test_client_ip()).expect("IP is a valid header value"),
        );

        let client = Client::builder()
            .cookie_store(true)
            .default_headers(headers)
            .build()
            .expect("Failed to create HTTP client");
        let base_url = std::env::var("TQ_TEST_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        Self { client, base_url }
    }

    /// Absolute URL for a path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    #[must_use]
    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path))
    }

    #[must_use]
    pub fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path))
    }

    #[must_use]
    pub fn patch(&self, path: &str) -> RequestBuilder {
        self.client.patch(self.url(path))
    }

    /// Register a new account; the session cookie stays in the jar.
    ///
    /// # Panics
    ///
    /// Panics if the request can't be sent.
    #[allow(clippy::expect_used)]
    pub async fn register(&self, correo: &str, password: &str) -> Response {
        self.post("/api/auth/register")
            .json(&json!({
                "correo": correo,
                "password": password,
                "nombre": "Cliente de Prueba",
                "celular": "310 555 1234",
                "direccionentrega": "Cra 15 # 93-47"
            }))
            .send()
            .await
            .expect("Failed to register")
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A random address in 10.0.0.0/8.
fn test_client_ip() -> String {
    let bytes = Uuid::new_v4().into_bytes();
    format!("10.{}.{}.{}", bytes[0], bytes[1], bytes[2])
}

/// An email nobody has registered yet.
#[must_use]
pub fn unique_email() -> String {
    format!("prueba-{}@example.com", Uuid::new_v4().simple())
}

/// A valid delivery form for `correo`.
#[must_use]
pub fn delivery(correo: &str) -> Value {
    json!({
        "nombre": "Laura Gómez",
        "celular": "3105551234",
        "direccion": "Cra 15 # 93-47, Bogotá",
        "correo": correo,
        "metodoPago": "efectivo"
    })
}
