//! Request handler: success shapes, error envelope, availability, health.

mod common;

use common::{
    batch_row, counting_handle, logistic_bundle, shipped_model_path, transaction, write_bundle,
};
use fraudshield::model::ModelRegistry;
use fraudshield::service::{ApiResponse, ErrorClass, RequestHandler};
use serde_json::{json, Value};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

fn handler_with_bundle(amount_coef: f64, intercept: f64) -> (RequestHandler, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let path = write_bundle(dir.path(), &logistic_bundle(amount_coef, intercept));
    let registry = Arc::new(ModelRegistry::new(path, Duration::ZERO));
    (RequestHandler::new(registry), dir)
}

fn unavailable_handler() -> RequestHandler {
    let registry = ModelRegistry::new("/nonexistent/model.json", Duration::from_secs(3600));
    RequestHandler::new(Arc::new(registry))
}

fn error_of(response: &ApiResponse) -> (String, ErrorClass) {
    let e = response.error().expect("expected an error response");
    assert!(!e.success);
    (e.error.clone(), e.status)
}

#[test]
fn single_returns_flattened_record_with_score() {
    let (handler, _dir) = handler_with_bundle(1.0, -3.0);
    let response = handler.handle_single(&transaction(json!(6)));
    assert_eq!(response.status_code(), 200);

    let body = response.into_body();
    assert_eq!(body["user_id"], json!(1234));
    assert_eq!(body["amount"], json!(6.0));
    assert_eq!(body["merchant_category"], json!("grocery"));
    assert_eq!(body["distance_from_home_km"], json!(0.0));
    assert_eq!(body["is_fraud"], json!(true));
    let p = body["fraud_probability"].as_f64().unwrap();
    assert!(p > 0.9 && p <= 1.0);
}

#[test]
fn probability_exactly_at_threshold_is_fraud() {
    let (handler, _dir) = handler_with_bundle(0.0, 0.0);
    let body = handler.handle_single(&transaction(json!(42))).into_body();
    assert_eq!(body["fraud_probability"], json!(0.5));
    assert_eq!(body["is_fraud"], json!(true));
}

#[test]
fn batch_echoes_rows_in_order_with_scores() {
    let (handler, _dir) = handler_with_bundle(1.0, -3.0);
    let mut first = batch_row(json!(0));
    first["transaction_id"] = json!("t-1");
    first["is_fraud"] = json!("stale");
    let second = batch_row(json!("6"));

    let response = handler.handle_batch(&json!([first, second]));
    assert!(response.is_success());
    let body = response.into_body();
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 2);

    assert_eq!(rows[0]["transaction_id"], json!("t-1"));
    assert_eq!(rows[0]["is_fraud"], json!(false));
    assert_eq!(rows[1]["amount"], json!("6"));
    assert_eq!(rows[1]["is_fraud"], json!(true));
    assert!(rows[0].get("user_id").is_none());
}

#[test]
fn validation_errors_are_client_errors() {
    let (handler, _dir) = handler_with_bundle(1.0, 0.0);

    let response = handler.handle_single(&transaction(json!("abc")));
    assert_eq!(response.status_code(), 400);
    assert_eq!(
        error_of(&response),
        ("Invalid numeric value for field: amount".to_string(), ErrorClass::ClientError)
    );

    let response = handler.handle_batch(&json!([]));
    assert_eq!(
        error_of(&response),
        ("Empty transaction list provided".to_string(), ErrorClass::ClientError)
    );

    let body = handler.handle_batch(&json!({"amount": 5})).into_body();
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["status"], json!("client_error"));
}

#[test]
fn malformed_body_is_invalid_json() {
    let (handler, _dir) = handler_with_bundle(1.0, 0.0);
    let response = handler.handle_single_body(b"{\"amount\": ");
    assert_eq!(
        error_of(&response),
        ("Invalid JSON payload".to_string(), ErrorClass::ClientError)
    );
    let response = handler.handle_batch_body(b"");
    assert_eq!(
        error_of(&response),
        ("No data provided".to_string(), ErrorClass::ClientError)
    );
}

#[test]
fn unavailable_model_wins_over_bad_input() {
    let handler = unavailable_handler();
    for response in [
        handler.handle_single(&transaction(json!(5))),
        handler.handle_single(&json!(null)),
        handler.handle_batch(&json!([])),
        handler.handle_single_body(b"not json"),
    ] {
        assert_eq!(response.status_code(), 500);
        assert_eq!(
            error_of(&response),
            ("Model not loaded".to_string(), ErrorClass::ServerError)
        );
    }
}

#[test]
fn invalid_batch_never_reaches_the_scorer() {
    let (handle, calls) = counting_handle(0.9);
    let handler = RequestHandler::new(Arc::new(ModelRegistry::with_handle(handle)));

    let mut bad = batch_row(json!(1));
    bad["is_foreign"] = json!(7);
    let response = handler.handle_batch(&json!([batch_row(json!(1)), bad]));
    assert_eq!(response.status_code(), 400);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let response = handler.handle_batch(&json!([batch_row(json!(1)), batch_row(json!(2))]));
    assert!(response.is_success());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn invalid_single_never_reaches_the_scorer() {
    let (handle, calls) = counting_handle(0.9);
    let handler = RequestHandler::new(Arc::new(ModelRegistry::with_handle(handle)));

    let response = handler.handle_single(&json!({"device_type": "mobile"}));
    assert_eq!(
        error_of(&response),
        (
            "Missing required fields: amount, merchant_category".to_string(),
            ErrorClass::ClientError
        )
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn shipped_model_scores_are_repeatable() {
    let handler = RequestHandler::new(Arc::new(ModelRegistry::new(
        shipped_model_path(),
        Duration::ZERO,
    )));
    let raw = json!({
        "amount": 950.0,
        "merchant_category": "electronics",
        "device_type": "desktop",
        "distance_from_home_km": 12.0,
        "is_foreign": 1
    });

    let first = handler.handle_single(&raw).into_body();
    let second = handler.handle_single(&raw).into_body();
    assert!(first["fraud_probability"].is_f64());
    assert_eq!(first["fraud_probability"], second["fraud_probability"]);
    assert_eq!(first["is_fraud"], second["is_fraud"]);
}

#[test]
fn extreme_magnitudes_score_without_server_errors() {
    let handler = RequestHandler::new(Arc::new(ModelRegistry::new(
        shipped_model_path(),
        Duration::ZERO,
    )));
    let mut raw = transaction(json!(1e300));
    raw["distance_from_home_km"] = json!(1e300);
    let response = handler.handle_single(&raw);
    assert_eq!(response.status_code(), 200);
    let body = response.into_body();
    assert_eq!(body["is_fraud"], json!(true));
    assert!(body["fraud_probability"].as_f64().unwrap().is_finite());

    raw["distance_from_home_km"] = json!(-1e300);
    assert_eq!(
        error_of(&handler.handle_single(&raw)),
        (
            "Invalid numeric value for field: distance_from_home_km".to_string(),
            ErrorClass::ClientError
        )
    );
}

#[test]
fn scorer_failures_are_sanitized_server_errors() {
    let handle = fraudshield::model::ModelHandle::from_parts(
        common::small_encoder(),
        Box::new(common::OverflowingScorer),
    );
    let handler = RequestHandler::new(Arc::new(ModelRegistry::with_handle(handle)));

    assert_eq!(
        error_of(&handler.handle_single(&transaction(json!(1)))),
        ("Error processing request".to_string(), ErrorClass::ServerError)
    );
    assert_eq!(
        error_of(&handler.handle_batch(&json!([batch_row(json!(1))]))),
        ("Error processing batch request".to_string(), ErrorClass::ServerError)
    );
}

#[test]
fn health_loads_a_missing_model() {
    let (handler, _dir) = handler_with_bundle(1.0, 0.0);
    assert!(handler.registry().current().is_none());

    let report = handler.health();
    assert_eq!(report.status, "healthy");
    assert_eq!(report.model_status, "loaded");
    assert!(report.model_loaded);
    assert!(report.model_exists);
    assert_eq!(report.load_attempts, 1);
    assert_eq!(report.model_scorer.as_deref(), Some("logistic"));
    assert_eq!(report.model_name.as_deref(), Some("test-logistic"));
    assert_eq!(report.api_version, "1.0.0");

    let json: Value = serde_json::to_value(&report).unwrap();
    assert_eq!(json["model_sha256"].as_str().map(str::len), Some(64));

    handler.health();
    assert_eq!(handler.health().load_attempts, 1);
}

#[test]
fn health_reports_load_errors_and_respects_throttle() {
    let handler = unavailable_handler();
    let report = handler.health();
    assert_eq!(report.status, "healthy");
    assert_eq!(report.model_status, "not_loaded");
    assert!(!report.model_loaded);
    assert!(!report.model_exists);
    assert_eq!(report.load_attempts, 1);
    assert!(report.model_error.unwrap().contains("/nonexistent/model.json"));

    handler.handle_single(&transaction(json!(1)));
    assert_eq!(handler.health().load_attempts, 1);
}
