//! Integration test support for BuyIt.
//!
//! Tests run against the full axum router backed by the in-memory store, so
//! they exercise the real handlers, extractors, and error mapping without
//! any external infrastructure.
//!
//! ```bash
//! cargo test -p buyit-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::unwrap_used)] // test support code

use std::net::IpAddr;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

use buyit_api::config::{ApiConfig, StoreBackend};
use buyit_api::routes;
use buyit_api::state::AppState;
use buyit_api::store::{MemoryStore, Store};

/// A gate secret that passes the startup entropy checks.
const TEST_GATE_SECRET: &str = "kQ9#mZ2$vL7&xW4!pD8@nR5^tG1*cF6%";

/// Build a config wired to the in-memory backend.
#[must_use]
pub fn test_config(catalog_capacity: u32) -> ApiConfig {
    ApiConfig {
        store: StoreBackend::Memory,
        database_url: None,
        host: IpAddr::from([127, 0, 0, 1]),
        port: 0,
        gate_secret: SecretString::from(TEST_GATE_SECRET),
        catalog_capacity,
        recent_count: 8,
        featured_count: 4,
        clear_cart_after_checkout: true,
        request_timeout: Duration::from_secs(10),
        sentry_dsn: None,
    }
}

/// Application state backed by a fresh in-memory store.
#[must_use]
pub fn test_state(config: ApiConfig) -> AppState {
    let store = Store::Memory(MemoryStore::new(config.catalog_capacity));
    AppState::new(config, store)
}

/// The full application router over a fresh in-memory store.
#[must_use]
pub fn test_router(catalog_capacity: u32) -> Router {
    routes::router(test_state(test_config(catalog_capacity)))
}

/// Build a JSON request, optionally with a bearer token.
#[must_use]
pub fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = body.map_or_else(Body::empty, |v| Body::from(v.to_string()));
    builder.body(body).unwrap()
}

/// Dispatch a request through the router and return the response.
pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router.clone().oneshot(request).await.unwrap()
}

/// Decode a response body as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Create an account through the API and return its bearer token.
pub async fn signup(router: &Router, email: &str) -> String {
    let request = json_request(
        "POST",
        "/auth/signup",
        None,
        Some(serde_json::json!({
            "username": "tester",
            "email": email,
            "password": "hunter2-but-longer",
        })),
    );
    let response = send(router, request).await;
    assert!(response.status().is_success(), "signup failed");

    let body = body_json(response).await;
    body["token"].as_str().unwrap().to_owned()
}

/// Register a product through the API and return its id.
pub async fn create_product(router: &Router, name: &str, price: &str) -> i64 {
    let request = json_request(
        "POST",
        "/products",
        None,
        Some(serde_json::json!({
            "name": name,
            "image": format!("{name}.png"),
            "category": "misc",
            "new_price": price,
            "old_price": price,
        })),
    );
    let response = send(router, request).await;
    assert_eq!(response.status().as_u16(), 201, "product create failed");

    let body = body_json(response).await;
    body["id"].as_i64().unwrap()
}
