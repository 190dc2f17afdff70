use std::sync::Arc;

use axum::response::Response;
use serde_json::{json, Value};

use crate::lending::counterfactual::{VariantCatalog, VariantOutcome, VariantResult, VariantSpec};
use crate::lending::domain::{
    Decision, DecisionResult, FinancialProfile, LoanApplication, ProtectedAttributes,
};
use crate::lending::evaluation::DecisionEngine;
use crate::lending::{lending_router, LendingService};

/// Baseline applicant that clears every default threshold.
pub(super) fn scenario_a() -> FinancialProfile {
    FinancialProfile {
        credit_score: 680,
        annual_income: 62_000.0,
        loan_amount: 15_000.0,
        debt_to_income_ratio: 0.28,
        employment_length_years: 3.0,
        delinquencies_24m: 0,
        credit_history_years: 5.0,
    }
}

pub(super) fn scenario_a_json() -> Value {
    json!({
        "credit_score": 680,
        "annual_income": 62000,
        "loan_amount": 15000,
        "debt_to_income_ratio": 0.28,
        "employment_length_years": 3,
        "delinquencies_24m": 0,
        "credit_history_years": 5
    })
}

pub(super) fn engine() -> DecisionEngine {
    DecisionEngine::default()
}

pub(super) fn applicant(profile: FinancialProfile, name: &str, gender: &str) -> LoanApplication {
    LoanApplication::with_protected(
        profile,
        ProtectedAttributes {
            applicant_name: Some(name.to_string()),
            gender: Some(gender.to_string()),
            ..ProtectedAttributes::default()
        },
    )
}

pub(super) fn small_catalog() -> VariantCatalog {
    VariantCatalog::new(
        1,
        vec![
            VariantSpec::new("John", "male"),
            VariantSpec::new("Aisha", "female"),
            VariantSpec::new("Raj", "male"),
        ],
    )
    .expect("valid catalog")
}

/// Hand-built runner output for analyzer tests.
pub(super) fn evaluated(
    name: &str,
    gender: &str,
    decision: Decision,
    risk_score: f64,
    rationale: &str,
) -> VariantResult {
    let variant = VariantSpec::new(name, gender);
    VariantResult {
        label: variant.label(),
        variant,
        outcome: VariantOutcome::Evaluated(DecisionResult {
            decision,
            rationale: rationale.to_string(),
            risk_score,
            details: Default::default(),
        }),
    }
}

pub(super) fn failed(name: &str, gender: &str, error: &str) -> VariantResult {
    let variant = VariantSpec::new(name, gender);
    VariantResult {
        label: variant.label(),
        variant,
        outcome: VariantOutcome::Failed {
            error: error.to_string(),
        },
    }
}

pub(super) fn router() -> axum::Router {
    lending_router(Arc::new(LendingService::default()))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
