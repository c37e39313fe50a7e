//! Integration tests for the Apex Store checkout service.
//!
//! Each test drives the real router in-process with
//! `tower::ServiceExt::oneshot` while a `wiremock` server stands in for the
//! store's REST backend.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p apex-integration-tests
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::HashMap;

use apex_storefront::config::StorefrontConfig;
use apex_storefront::state::AppState;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::MockServer;

/// Customer every request is made as.
pub const CUSTOMER_ID: &str = "u1";

/// The storefront router wired to a mock backend.
pub struct TestContext {
    pub backend: MockServer,
    pub app: Router,
}

impl TestContext {
    /// Start a mock backend and build the app against it.
    pub async fn new() -> Self {
        let backend = MockServer::start().await;
        let vars: HashMap<&str, String> = HashMap::from([
            ("APEX_API_URL", format!("{}/api", backend.uri())),
            ("PAYMENT_KEY_ID", "rzp_test_K9xQ2mVb7LpT".to_string()),
            ("PAYMENT_TIMEOUT_SECS", "5".to_string()),
        ]);
        let config =
            StorefrontConfig::from_lookup(&|key: &str| vars.get(key).cloned()).unwrap();
        let app = apex_storefront::app(AppState::new(config).unwrap());

        Self { backend, app }
    }

    /// Send a request as [`CUSTOMER_ID`] and return status and JSON body.
    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-customer-id", CUSTOMER_ID)
            .header("x-customer-name", "Asha Rao")
            .header("x-customer-email", "asha@example.com");
        self.dispatch(request, body).await
    }

    /// Send a request without customer headers.
    pub async fn send_anonymous(&self, method: Method, uri: &str) -> (StatusCode, Value) {
        self.dispatch(Request::builder().method(method).uri(uri), None)
            .await
    }

    async fn dispatch(
        &self,
        request: axum::http::request::Builder,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, body)
    }
}

/// A saved address as the backend returns it.
#[must_use]
pub fn address_json(id: &str) -> Value {
    json!({
        "_id": id,
        "type": "Home",
        "street": "12 MG Road",
        "city": "Pune",
        "state": "MH",
        "country": "India",
        "postalCode": "411001",
        "phoneNumber": "9876543210",
        "user": CUSTOMER_ID
    })
}

/// A one-line cart as the backend returns it.
#[must_use]
pub fn cart_json(price: f64, quantity: u32) -> Value {
    json!([{
        "_id": "c1",
        "product": { "_id": "p1", "title": "Handloom Saree", "price": price, "images": [] },
        "quantity": quantity
    }])
}
