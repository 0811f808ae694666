//! Test utilities for the HTTP API tests
//!
//! Builds the full router over a chosen storage backend and wraps the
//! request/response plumbing used by every test.
#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use backend_lib::{config::Settings, router::create_router, storage::Storage, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

/// Router plus the state behind it
pub fn app_with<S: Storage>(storage: S, settings: &Settings) -> (Router, Arc<AppState<S>>) {
    let state = Arc::new(AppState::new(storage, settings));
    (create_router(state.clone()), state)
}

/// Send a request, returning status and raw body bytes
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }

    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

pub fn json_body(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).expect("response body is not JSON")
}

/// Register the `tester` fixture user
pub async fn register_tester(app: &Router) {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "username": "tester",
            "password": "Secret!",
            "firstname": "Tess",
            "lastname": "Ter",
            "email": "tester@example.com"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body.is_empty());
}

/// Log `tester` in and return the bearer token
pub async fn login_tester(app: &Router) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": "tester", "password": "Secret!" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    json_body(&body)["token"]
        .as_str()
        .expect("token missing from login reply")
        .to_string()
}
