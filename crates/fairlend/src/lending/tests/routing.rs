use axum::body::Body;
use axum::http::{header::CONTENT_TYPE, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use super::common::*;

fn post(uri: &str, body: String) -> Request<Body> {
    Request::post(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .expect("request builds")
}

#[tokio::test]
async fn evaluate_returns_decision_payload() {
    let mut payload = scenario_a_json();
    payload["applicant_name"] = json!("Emily");

    let response = router()
        .oneshot(post("/evaluate", payload.to_string()))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json_body(response).await;
    assert_eq!(body["decision"], "APPROVED");
    assert_eq!(body["rationale"], "Application meets all criteria. Approved.");
    assert!(body["risk_score"].as_f64().is_some());
    assert_eq!(body["details"]["credit_score"]["passed"], true);
}

#[tokio::test]
async fn evaluate_reports_offending_field() {
    let mut payload = scenario_a_json();
    payload["annual_income"] = json!(-10);

    let response = router()
        .oneshot(post("/evaluate", payload.to_string()))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = read_json_body(response).await;
    assert_eq!(body["field"], "annual_income");
    assert!(body["error"]
        .as_str()
        .is_some_and(|error| error.contains("annual_income")));
}

#[tokio::test]
async fn evaluate_requires_a_body() {
    let response = router()
        .oneshot(post("/evaluate", String::new()))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let response = router()
        .oneshot(post("/bias-test", "{not json".to_string()))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = read_json_body(response).await;
    assert!(body["field"].is_null());
}

#[tokio::test]
async fn bias_test_without_body_uses_base_profile() {
    let response = router()
        .oneshot(post("/bias-test", String::new()))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json_body(response).await;
    assert_eq!(body["bias_detected"], false);
    assert_eq!(body["decisions_consistent"], true);
    assert_eq!(body["catalog_version"], 1);
    assert_eq!(body["base_financials"]["credit_score"], 680);
    assert_eq!(
        body["per_variant_results"]
            .as_array()
            .map(|results| results.len()),
        Some(8)
    );
    assert_eq!(body["per_variant_results"][0]["label"], "John (male)");
    assert_eq!(body["per_variant_results"][0]["status"], "evaluated");
    assert_eq!(
        body["recommendations"].as_array().map(|items| items.len()),
        Some(0)
    );
}

#[tokio::test]
async fn bias_test_applies_overrides() {
    let response = router()
        .oneshot(post(
            "/bias-test",
            json!({ "credit_score": 600 }).to_string(),
        ))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json_body(response).await;
    assert_eq!(body["base_financials"]["credit_score"], 600);
    assert_eq!(body["decision_counts"]["REVIEW"], 8);
    assert_eq!(body["bias_detected"], false);
}

#[tokio::test]
async fn bias_test_rejects_invalid_override() {
    let response = router()
        .oneshot(post(
            "/bias-test",
            json!({ "debt_to_income_ratio": 3.5 }).to_string(),
        ))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = read_json_body(response).await;
    assert_eq!(body["field"], "debt_to_income_ratio");
}
