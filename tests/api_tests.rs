//! API integration tests
//!
//! Drives the router in-process with `tower::ServiceExt::oneshot`.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use dealflow_formula::api::router;
use dealflow_formula::api::server::{ApiConfig, AppState};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::new());
    (router(state.clone()), state)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    read(response).await
}

async fn post(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    read(response).await
}

async fn read(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

// ═══════════════════════════════════════════════════════════════════════════
// CONFIG
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_config_default() {
    let config = ApiConfig::default();
    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.port, 8080);
}

#[test]
fn test_config_clone() {
    let config = ApiConfig {
        host: "0.0.0.0".to_string(),
        port: 3000,
    };
    let cloned = config.clone();
    assert_eq!(cloned.host, "0.0.0.0");
    assert_eq!(cloned.port, 3000);
}

// ═══════════════════════════════════════════════════════════════════════════
// INFO ENDPOINTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_root_lists_endpoints() {
    let (app, _) = app();
    let (status, body) = get(app, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let endpoints = body["data"]["endpoints"].as_array().unwrap();
    assert!(endpoints
        .iter()
        .any(|e| e["path"] == "/api/v1/calculated-fields"));
}

#[tokio::test]
async fn test_health_and_version() {
    let (app, _) = app();
    let (status, body) = get(app.clone(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["data"]["cached_formulas"], 0);

    let (status, body) = get(app, "/version").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (app, _) = app();
    let (status, _) = get(app, "/api/v1/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ═══════════════════════════════════════════════════════════════════════════
// FORMULA ENDPOINTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_validate_endpoint() {
    let (app, _) = app();
    let (status, body) = post(
        app.clone(),
        "/api/v1/validate",
        json!({"formula": "1 + 2)"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["valid"], false);
    assert_eq!(body["data"]["error"], "Unbalanced parentheses");

    let (_, body) = post(app, "/api/v1/validate", json!({"formula": "1 + 2"})).await;
    assert_eq!(body["data"]["valid"], true);
    assert!(body["data"].get("error").is_none());
}

#[tokio::test]
async fn test_evaluate_endpoint_caches_formula() {
    let (app, state) = app();
    let request = json!({
        "formula": "amount * probability / 100",
        "record": {"amount": 1000000, "probability": 50, "stage": "Negotiation"}
    });

    let (status, body) = post(app.clone(), "/api/v1/evaluate", request.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["value"], 500000.0);

    let (_, body) = post(app, "/api/v1/evaluate", request).await;
    assert_eq!(body["data"]["value"], 500000.0);
    assert_eq!(state.formulas.len(), 1);
}

#[tokio::test]
async fn test_evaluate_without_record_uses_empty_record() {
    let (app, _) = app();
    let (_, body) = post(app, "/api/v1/evaluate", json!({"formula": "amount + 10 / 0"})).await;
    assert_eq!(body["data"]["value"], 0.0);
}

#[tokio::test]
async fn test_aggregate_endpoint() {
    let (app, _) = app();
    let records = json!([
        {"amount": 300, "probability": 10},
        {"amount": 600, "probability": 50},
        {"amount": 900, "probability": 100}
    ]);

    let (status, body) = post(
        app.clone(),
        "/api/v1/aggregate",
        json!({"formula": "amount", "records": records.clone(), "kind": "average"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["value"], 600.0);
    assert_eq!(body["data"]["record_count"], 3);
    assert_eq!(body["data"]["kind"], "average");

    // 30 + 300 + 900, default kind is sum
    let (_, body) = post(
        app.clone(),
        "/api/v1/aggregate",
        json!({"formula": "expectedValue", "records": records.clone()}),
    )
    .await;
    assert_eq!(body["data"]["value"], 1230.0);
    assert_eq!(body["data"]["kind"], "sum");

    let (_, body) = post(
        app,
        "/api/v1/aggregate",
        json!({"formula": "amount", "records": [], "kind": "max"}),
    )
    .await;
    assert_eq!(body["data"]["value"], 0.0);
}

#[tokio::test]
async fn test_calculated_fields_endpoint() {
    let (app, _) = app();
    let (status, body) = post(
        app,
        "/api/v1/calculated-fields",
        json!({
            "record": {"amount": 2000000, "probability": 25},
            "fields": [
                {"id": "cf_ev", "name": "Expected", "formula": "expected_value"},
                {"id": "cf_big", "name": "Big Deal", "formula": "IF(amount > 1000000, 1, 0)"},
                {"id": "cf_broken", "name": "Broken", "formula": "(((("}
            ]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["values"]["cf_ev"], 500000.0);
    assert_eq!(body["data"]["values"]["cf_big"], 1.0);
    assert_eq!(body["data"]["values"]["cf_broken"], 0.0);
}

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let (app, _) = app();
    let (status, _) = post(app, "/api/v1/evaluate", json!({"record": {}})).await;
    assert!(status.is_client_error());
}
