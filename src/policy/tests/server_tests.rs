//! HTTP decision service tests
//!
//! Exercises the router end to end with `tower::ServiceExt::oneshot`.

#![cfg(feature = "server")]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use rolegate_policy::server::{build_router, AppState};
use rolegate_policy::PolicyConfig;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt as _;

const DOCUMENT: &str = r#"
[[roles]]
name = "guest"
rank = 0
permissions = ["viewData"]

[[roles]]
name = "standard"
rank = 1
permissions = ["orders:view", "orders:edit"]

[[roles]]
name = "admin"
rank = 2
permissions = ["viewAllData", "editAllData"]

[flags]
newUI = false
"#;

fn test_app() -> Router {
    let engine = PolicyConfig::from_toml_str(DOCUMENT)
        .unwrap()
        .into_engine()
        .unwrap();
    build_router(AppState::new(Arc::new(engine)))
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_evaluate_granted() {
    // Arrange
    let app = test_app();
    let request = json_request(
        Method::POST,
        "/v1/evaluate",
        json!({"roles": ["admin"], "permission": "editAllData"}),
    );

    // Act
    let response = app.oneshot(request).await.unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["allowed"], true);
    assert_eq!(json["reason"], "granted");
}

#[tokio::test]
async fn test_evaluate_scoped_denied() {
    let app = test_app();
    let request = json_request(
        Method::POST,
        "/v1/evaluate",
        json!({"roles": ["standard"], "resource": "orders", "permission": "delete"}),
    );

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["allowed"], false);
    assert_eq!(json["reason"], "no-role-grants-permission");
}

#[tokio::test]
async fn test_evaluate_empty_roles_rejected() {
    let app = test_app();
    let request = json_request(
        Method::POST,
        "/v1/evaluate",
        json!({"roles": [], "permission": "viewData"}),
    );

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "bad_request");
}

#[tokio::test]
async fn test_evaluate_malformed_role_rejected() {
    let app = test_app();
    let request = json_request(
        Method::POST,
        "/v1/evaluate",
        json!({"roles": ["not a role"], "permission": "viewData"}),
    );

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "bad_request");
    assert!(json["message"].as_str().unwrap().contains("roles"));
}

#[tokio::test]
async fn test_evaluate_missing_permission_rejected() {
    let app = test_app();
    let request = json_request(Method::POST, "/v1/evaluate", json!({"roles": ["guest"]}));

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "bad_request");
    assert!(json["message"].as_str().unwrap().contains("permission"));
}

#[tokio::test]
async fn test_evaluate_non_json_body_rejected() {
    let app = test_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/v1/evaluate")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "bad_request");
}

#[tokio::test]
async fn test_flag_override_malformed_body_rejected() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(json_request(Method::PUT, "/v1/flags/newUI", json!({"enabled": "yes"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "bad_request");

    // Rejected body leaves the flag untouched
    let response = app
        .oneshot(empty_request(Method::GET, "/v1/flags/newUI"))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["state"], "default-only");
}

#[tokio::test]
async fn test_flag_override_lifecycle() {
    let app = test_app();
    let flag_ctx = json!({"roles": ["admin"], "permission": "editAllData", "flagKey": "newUI"});

    // Disabled by default
    let response = app
        .clone()
        .oneshot(json_request(Method::POST, "/v1/evaluate", flag_ctx.clone()))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["reason"], "feature-disabled");

    // Override on
    let response = app
        .clone()
        .oneshot(json_request(Method::PUT, "/v1/flags/newUI", json!({"enabled": true})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["enabled"], true);
    assert_eq!(json["state"], "overridden-true");
    assert_eq!(json["default"], false);

    let response = app
        .clone()
        .oneshot(json_request(Method::POST, "/v1/evaluate", flag_ctx.clone()))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["allowed"], true);

    // Clear restores the default
    let response = app
        .clone()
        .oneshot(empty_request(Method::DELETE, "/v1/flags/newUI"))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["enabled"], false);
    assert_eq!(json["state"], "default-only");
}

#[tokio::test]
async fn test_unknown_flag_reads_disabled() {
    let app = test_app();

    let response = app
        .oneshot(empty_request(Method::GET, "/v1/flags/neverDeclared"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["enabled"], false);
    assert!(json.get("default").is_none());
}

#[tokio::test]
async fn test_health_check() {
    let app = test_app();

    let response = app.oneshot(empty_request(Method::GET, "/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["roles"], 3);
    assert!(json.get("version").is_some());
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = test_app();

    app.clone()
        .oneshot(json_request(
            Method::POST,
            "/v1/evaluate",
            json!({"roles": ["guest"], "permission": "viewAllData"}),
        ))
        .await
        .unwrap();

    let response = app.oneshot(empty_request(Method::GET, "/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("rolegate_decisions_total 1"));
    assert!(text.contains("rolegate_uptime_seconds"));
}

#[tokio::test]
async fn test_metrics_disabled_returns_not_found() {
    let engine = PolicyConfig::from_toml_str(&format!("[engine]\nenable_metrics = false\n{}", DOCUMENT))
        .unwrap()
        .into_engine()
        .unwrap();
    let app = build_router(AppState::new(Arc::new(engine)));

    let response = app.oneshot(empty_request(Method::GET, "/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
