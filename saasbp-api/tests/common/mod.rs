/// Common test utilities for integration tests
///
/// Builds the full router over a recording identity provider so tests can
/// drive HTTP requests and then inspect which provider calls were made.

use axum::body::Body;
use axum::http::{Request, Response};
use saasbp_api::app::{build_router, AppState};
use saasbp_api::config::Config;
use saasbp_shared::identity::mock::{MockScript, RecordingClientFactory};
use std::collections::HashMap;
use std::sync::Arc;
use tower::Service as _;

/// Required variables shared by every test configuration
pub const REQUIRED_VARS: [(&str, &str); 3] = [
    ("IDENTITY_PROVIDER_URL", "http://127.0.0.1:9011"),
    ("IDENTITY_PROVIDER_API_KEY", "admin-key"),
    ("IDENTITY_PROVIDER_SOURCE_TENANT_ID", "default-tenant"),
];

/// Builds a configuration from the required variables plus `extra`
pub fn test_config(extra: &[(&str, &str)]) -> Config {
    let vars: HashMap<String, String> = REQUIRED_VARS
        .iter()
        .chain(extra.iter())
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    Config::from_lookup(|name| vars.get(name).cloned()).unwrap()
}

/// Test context containing the router and the provider it talks to
pub struct TestContext {
    pub app: axum::Router,
    pub provider: RecordingClientFactory,
}

impl TestContext {
    /// Context whose provider succeeds at every step
    pub fn new() -> Self {
        Self::with_script(MockScript::succeeding())
    }

    /// Context whose provider answers from `script`
    pub fn with_script(script: MockScript) -> Self {
        Self::with_config(script, test_config(&[]))
    }

    /// Context with a custom configuration
    pub fn with_config(script: MockScript, config: Config) -> Self {
        let provider = RecordingClientFactory::new(script);
        let state = AppState::new(config, Arc::new(provider.clone()));

        Self {
            app: build_router(state),
            provider,
        }
    }

    /// Sends a request through the router
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().call(request).await.unwrap()
    }

    /// Sends a GET request
    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    /// Submits the sign-up form
    pub async fn submit(&self, fields: &[(&str, &str)]) -> Response<Body> {
        self.send(form_request(fields)).await
    }
}

/// Builds a form-encoded `POST /signup`
pub fn form_request(fields: &[(&str, &str)]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/signup")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(serde_urlencoded::to_string(fields).unwrap()))
        .unwrap()
}

/// The fields of a complete, valid submission
pub fn valid_form() -> Vec<(&'static str, &'static str)> {
    vec![
        ("organization", "acme-corp"),
        ("email", "ada@acme.io"),
        ("password", "correct horse"),
        ("firstName", "Ada"),
        ("lastName", "Lovelace"),
    ]
}

/// Reads a response body as a string
pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Reads a response body as JSON
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}
