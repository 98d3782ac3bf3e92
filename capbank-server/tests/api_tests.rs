//! HTTP API tests driving the router in-process

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use capbank::catalog::load_catalog;
use capbank::{CatalogStore, OptimizationService, ServiceOptions, TimeoutPolicy};
use capbank_server::{app, AppState};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("capbank")
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn test_app(options: ServiceOptions) -> Router {
    let parts = load_catalog(Some(&fixture_path("small_catalog.json"))).unwrap();
    let catalog = Arc::new(CatalogStore::new(parts).unwrap());
    app(AppState::new(OptimizationService::new(catalog, options).unwrap()))
}

fn scenario() -> Value {
    json!({
        "target_cap": 1e-6,
        "tolerance": 0.1,
        "dc_bias": 0,
        "max_count": 3,
        "min_rated_volt": 25,
        "min_temp": 85,
        "conn_type": 0,
        "packages": ["0805"]
    })
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

async fn post_json(app: Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let (status, body) = get(test_app(ServiceOptions::default()), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "service": "capbank"}));
}

#[tokio::test]
async fn test_packages_both_paths() {
    for uri in ["/packages", "/api/packages"] {
        let (status, body) = get(test_app(ServiceOptions::default()), uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!(["0603", "0805", "1206"]));
    }
}

#[tokio::test]
async fn test_optimize_scenario() {
    let (status, body) = post_json(test_app(ServiceOptions::default()), "/optimize", &scenario()).await;
    assert_eq!(status, StatusCode::OK);

    let results = body.as_array().expect("response should be an array");
    let best = &results[0];
    assert_eq!(best["Type"], "1p");
    let cap = best["Cap"].as_f64().unwrap();
    assert!((0.9e-6..=1.1e-6).contains(&cap));
    assert!(best["Cfg"].as_str().unwrap().contains("SCN-1U-0805-50V"));
}

#[tokio::test]
async fn test_optimize_api_prefix() {
    let (status, body) = post_json(test_app(ServiceOptions::default()), "/api/optimize", &scenario()).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_array());
}

#[tokio::test]
async fn test_optimize_empty_is_ok() {
    let mut request = scenario();
    request["target_cap"] = json!(3.3e-6);
    request["tolerance"] = json!(0.01);
    request["max_count"] = json!(1);
    request["conn_type"] = json!(1);
    let (status, body) = post_json(test_app(ServiceOptions::default()), "/optimize", &request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_invalid_constraint_is_422() {
    let mut request = scenario();
    request["conn_type"] = json!(9);
    let (status, body) = post_json(test_app(ServiceOptions::default()), "/optimize", &request).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("connection type"));
}

#[tokio::test]
async fn test_timeout_is_504_when_configured() {
    let options = ServiceOptions {
        deadline: Some(Duration::ZERO),
        on_timeout: TimeoutPolicy::Fail,
        ..ServiceOptions::default()
    };
    let (status, body) = post_json(test_app(options), "/optimize", &scenario()).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_malformed_body_rejected() {
    let request = Request::builder()
        .method("POST")
        .uri("/optimize")
        .header("content-type", "application/json")
        .body(Body::from("{\"target_cap\": "))
        .unwrap();
    let (status, _) = send(test_app(ServiceOptions::default()), request).await;
    assert!(status.is_client_error());
}
