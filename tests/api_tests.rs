/// Integration tests for the HTTP routes
///
/// Run with: cargo test --test api_tests -- --nocapture

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use delay_predictor::{
    server::{router, AppState},
    ModelSource, Predictor,
};
use serde_json::{json, Value};
use std::{path::PathBuf, sync::Arc};
use tower::ServiceExt;

fn app(loaded: bool) -> Router {
    let p = Predictor::new();
    if loaded {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/delay_model.json");
        p.load(&ModelSource::LogisticJson(path)).unwrap();
    }
    router(AppState::new(Arc::new(p)).with_prediction_log(true))
}

async fn call(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn post_predict(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

fn get_health() -> Request<Body> {
    Request::builder().uri("/health").body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health_regardless_of_state() {
    println!("\n=== Test: Health ===");
    for loaded in [true, false] {
        let (status, body) = call(app(loaded), get_health()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "OK"}));
    }
    println!("✓ /health is OK loaded or not");
}

#[tokio::test]
async fn test_predict_batch() {
    println!("\n=== Test: Predict Batch ===");
    let payload = json!([
        {"OPERA": "LATAM", "TIPOVUELO": "N", "MES": 3},
        {"OPERA": "SKY", "TIPOVUELO": "I", "MES": 7},
        {"OPERA": "UNKNOWN_CARRIER", "TIPOVUELO": "I", "MES": 12}
    ]);
    let (status, body) = call(app(true), post_predict(payload.to_string())).await;
    assert_eq!(status, StatusCode::OK);
    // -0.5 + 0.6 + 0.7 for the unknown carrier row
    assert_eq!(body, json!({"predictions": [0, 1, 1]}));
    println!("✓ {}", body);
}

#[tokio::test]
async fn test_predict_empty_array() {
    let (status, body) = call(app(true), post_predict("[]")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"predictions": []}));
}

#[tokio::test]
async fn test_failures_return_error_body() {
    println!("\n=== Test: Error Bodies ===");
    let cases = [
        ("not json", "invalid input"),
        (r#"[{"OPERA": "LATAM", "TIPOVUELO": "N"}]"#, "MES"),
        (r#"[{"OPERA": "LATAM", "TIPOVUELO": "N", "MES": "3"}]"#, "invalid input"),
        (r#"[{"OPERA": "LATAM", "TIPOVUELO": 1, "MES": 3}]"#, "invalid input"),
        (r#"{"OPERA": "LATAM", "TIPOVUELO": "N", "MES": 3}"#, "invalid input"),
    ];
    for (payload, needle) in cases {
        let (status, body) = call(app(true), post_predict(payload)).await;
        assert_eq!(status, StatusCode::OK);
        let msg = body["error"].as_str().expect("error body");
        assert!(msg.contains(needle), "{:?} -> {}", payload, msg);
        assert!(body.get("predictions").is_none());
        println!("  {} -> {}", payload, msg);
    }
    println!("✓ Every failure is a 200 with an error message");
}

#[tokio::test]
async fn test_predict_without_model() {
    let payload = json!([{"OPERA": "LATAM", "TIPOVUELO": "N", "MES": 3}]);
    let (status, body) = call(app(false), post_predict(payload.to_string())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"error": "The model is not loaded."}));
}

#[tokio::test]
async fn test_extra_fields_are_ignored() {
    let payload = json!([{"OPERA": "SKY", "TIPOVUELO": "I", "MES": 7, "DIANOM": "Lunes"}]);
    let (_, body) = call(app(true), post_predict(payload.to_string())).await;
    assert_eq!(body, json!({"predictions": [1]}));
}

#[tokio::test]
async fn test_unseen_categories_still_predict() {
    println!("\n=== Test: Unseen Categories ===");
    let payload = json!([
        {"OPERA": "SKY", "TIPOVUELO": "O", "MES": 7},
        {"OPERA": "SKY", "TIPOVUELO": "I", "MES": 13},
        {"OPERA": "LATAM", "TIPOVUELO": "N", "MES": 13}
    ]);
    let (status, body) = call(app(true), post_predict(payload.to_string())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"predictions": [1, 1, 0]}));
    println!("✓ {}", body);
}
