//! End-to-end tests for the Shopdesk API.
//!
//! # Running Tests
//!
//! ```bash
//! # Migrate, create an admin and start the server
//! shopdesk migrate
//! shopdesk admin create -e admin@example.com -n Admin --password '...'
//! cargo run -p shopdesk-server
//!
//! # Run the tests against it
//! SHOPDESK_URL=http://127.0.0.1:8000 \
//! SHOPDESK_ADMIN_EMAIL=admin@example.com SHOPDESK_ADMIN_PASSWORD='...' \
//!     cargo test -p shopdesk-integration-tests -- --ignored
//! ```

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use reqwest::{Client, Method, StatusCode};
use serde_json::{Value, json};

/// Base URL of the server under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("SHOPDESK_URL").unwrap_or_else(|_| "http://127.0.0.1:8000".to_owned())
}

/// HTTP client that carries an optional bearer token.
#[derive(Clone)]
pub struct Api {
    client: Client,
    base: String,
    token: Option<String>,
}

impl Api {
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            client: Client::new(),
            base: base_url(),
            token: None,
        }
    }

    /// Register a fresh customer account and sign in as it.
    pub async fn customer() -> Self {
        let mut api = Self::anonymous();
        let email = format!("it-{}@example.com", uuid::Uuid::new_v4());
        let (status, body) = api
            .call(
                Method::POST,
                "/api/user/register",
                Some(json!({ "name": "Integration", "email": email, "password": "integration-pass" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        api.token = body["token"].as_str().map(ToOwned::to_owned);
        api
    }

    /// Sign in with `SHOPDESK_ADMIN_EMAIL` / `SHOPDESK_ADMIN_PASSWORD`.
    pub async fn admin() -> Self {
        let email = std::env::var("SHOPDESK_ADMIN_EMAIL").expect("SHOPDESK_ADMIN_EMAIL must be set");
        let password =
            std::env::var("SHOPDESK_ADMIN_PASSWORD").expect("SHOPDESK_ADMIN_PASSWORD must be set");

        let mut api = Self::anonymous();
        let (status, body) = api
            .call(
                Method::POST,
                "/api/user/admin",
                Some(json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        api.token = body["token"].as_str().map(ToOwned::to_owned);
        api
    }

    /// Send a request and decode the JSON response.
    pub async fn call(&self, method: Method, path: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = self.client.request(method, format!("{}{path}", self.base));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await.expect("request failed");
        let status = response.status();
        let body = response.json().await.unwrap_or(Value::Null);
        (status, body)
    }

    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        self.call(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, path, Some(body)).await
    }
}
