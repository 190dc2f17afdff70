use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::Value;

use super::service::{BiasTestOptions, LendingError, LendingService};
use crate::error::AppError;

/// Router exposing single-application evaluation and counterfactual bias testing.
pub fn lending_router(service: Arc<LendingService>) -> Router {
    Router::new()
        .route("/evaluate", post(evaluate_handler))
        .route("/bias-test", post(bias_test_handler))
        .with_state(service)
}

pub(crate) async fn evaluate_handler(
    State(service): State<Arc<LendingService>>,
    body: Bytes,
) -> Result<Response, AppError> {
    let payload = parse_body(&body)?.ok_or_else(missing_body)?;
    let result = service.evaluate_payload(&payload)?;
    Ok((StatusCode::OK, Json(result)).into_response())
}

pub(crate) async fn bias_test_handler(
    State(service): State<Arc<LendingService>>,
    body: Bytes,
) -> Result<Response, AppError> {
    let overrides = parse_body(&body)?;
    let report = service.bias_test(overrides.as_ref(), BiasTestOptions::default())?;
    Ok((StatusCode::OK, Json(report)).into_response())
}

/// An empty body or a literal `null` yields `None`.
fn parse_body(body: &[u8]) -> Result<Option<Value>, LendingError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Null) => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(err) => Err(LendingError::MalformedPayload(err.to_string())),
    }
}

fn missing_body() -> LendingError {
    LendingError::MalformedPayload("request body must be a JSON object".to_string())
}
