// crates/backend-lib/tests/devices_api.rs
mod common;

use axum::http::StatusCode;
use backend_lib::{config::Settings, storage::MemoryStorage};
use common::{app_with, json_body, login_tester, register_tester, send};
use serde_json::json;

async fn logged_in_app() -> (axum::Router, String) {
    let (app, _state) = app_with(MemoryStorage::new(), &Settings::default());
    register_tester(&app).await;
    let token = login_tester(&app).await;
    (app, token)
}

#[tokio::test]
async fn test_create_device() {
    let (app, token) = logged_in_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/devices",
        Some(&token),
        Some(json!({ "name": "test-devices", "address": "10.10.10.10" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let device = json_body(&body);
    assert_eq!(device["name"], "test-devices");
    assert_eq!(device["address"], "10.10.10.10");
    assert_eq!(device["isActive"], false);
    assert!(device["id"].as_str().is_some_and(|id| !id.is_empty()));
}

#[tokio::test]
async fn test_device_routes_require_token() {
    let (app, _token) = logged_in_app().await;

    let cases = [
        ("GET", "/api/devices"),
        ("POST", "/api/devices"),
        ("GET", "/api/devices/some-id"),
        ("PUT", "/api/devices/some-id"),
        ("DELETE", "/api/devices/some-id"),
        ("PATCH", "/api/devices/some-id/activate"),
        ("PATCH", "/api/devices/some-id/deactivate"),
    ];

    for (method, uri) in cases {
        let body = (method == "POST" || method == "PUT")
            .then(|| json!({ "name": "test-devices", "address": "10.10.10.10" }));
        let (status, bytes) = send(&app, method, uri, None, body).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert!(bytes.is_empty(), "{method} {uri}");
    }
}

#[tokio::test]
async fn test_device_lifecycle() {
    let (app, token) = logged_in_app().await;
    let token = Some(token.as_str());

    let (_, body) = send(
        &app,
        "POST",
        "/api/devices",
        token,
        Some(json!({ "name": "router", "address": "10.0.0.1" })),
    )
    .await;
    let id = json_body(&body)["id"].as_str().unwrap().to_string();
    let device_uri = format!("/api/devices/{id}");

    let (status, body) = send(&app, "GET", "/api/devices", token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body).as_array().unwrap().len(), 1);

    let (status, body) = send(
        &app,
        "PUT",
        &device_uri,
        token,
        Some(json!({ "address": "10.0.0.2" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let updated = json_body(&body);
    assert_eq!(updated["name"], "router");
    assert_eq!(updated["address"], "10.0.0.2");

    let (status, body) = send(&app, "PATCH", &format!("{device_uri}/activate"), token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["isActive"], true);

    let (status, body) = send(&app, "PATCH", &format!("{device_uri}/deactivate"), token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["isActive"], false);

    let (status, body) = send(&app, "DELETE", &device_uri, token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["id"], id.as_str());

    let (status, body) = send(&app, "GET", &device_uri, token, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_missing_device_is_not_found() {
    let (app, token) = logged_in_app().await;
    let token = Some(token.as_str());

    for (method, uri) in [
        ("GET", "/api/devices/missing"),
        ("DELETE", "/api/devices/missing"),
        ("PATCH", "/api/devices/missing/activate"),
    ] {
        let (status, _) = send(&app, method, uri, token, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{method} {uri}");
    }

    let (status, _) = send(
        &app,
        "PUT",
        "/api/devices/missing",
        token,
        Some(json!({ "name": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let (app, token) = logged_in_app().await;

    let (status, _) = send(&app, "GET", "/api/nothing-here", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
