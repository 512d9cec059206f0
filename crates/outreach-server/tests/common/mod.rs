//! Common test utilities for integration tests.

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use outreach_server::{config::Config, routes, state::AppState};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

/// A router over a fresh on-disk store. Keep the `TempDir` alive for the
/// duration of the test.
pub fn test_app(configure: impl FnOnce(&mut Config)) -> (Router, TempDir) {
    let temp_dir = TempDir::new().expect("create temp dir");
    let mut config = Config::default();
    config.db_path = temp_dir.path().join("crm.db");
    configure(&mut config);

    let state = AppState::new(config).expect("open store");
    (routes::app(Arc::new(state)), temp_dir)
}

/// Send a request and return the status and raw body.
pub async fn send_raw(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, String) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("build request");

    let response = app.clone().oneshot(request).await.expect("route request");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    (status, String::from_utf8(bytes.to_vec()).expect("utf-8 body"))
}

/// Send a request and parse the body as JSON (`Null` for non-JSON bodies).
pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, text) = send_raw(app, method, uri, body).await;
    (status, serde_json::from_str(&text).unwrap_or(Value::Null))
}
