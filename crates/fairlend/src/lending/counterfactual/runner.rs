use std::panic::{catch_unwind, AssertUnwindSafe};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::super::domain::{DecisionResult, FinancialProfile};
use super::super::evaluation::DecisionEngine;
use super::super::intake::ValidationError;
use super::super::prompt::parse_prompt;
use super::catalog::VariantSpec;
use super::generator::CounterfactualCase;

/// How each counterfactual case reaches the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Evaluate the generated record directly.
    #[default]
    Structured,
    /// Parse the rendered request text first, then evaluate what was extracted.
    Prompt,
}

/// Failure confined to a single variant's slot.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("request text does not match the generated record: {fields} differ")]
    PromptMismatch { fields: String },
    #[error("evaluation aborted unexpectedly: {0}")]
    Aborted(String),
}

/// Per-variant outcome: a decision or the error that prevented one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VariantOutcome {
    Evaluated(DecisionResult),
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantResult {
    pub label: String,
    pub variant: VariantSpec,
    #[serde(flatten)]
    pub outcome: VariantOutcome,
}

impl VariantResult {
    pub fn decision_result(&self) -> Option<&DecisionResult> {
        match &self.outcome {
            VariantOutcome::Evaluated(result) => Some(result),
            VariantOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            VariantOutcome::Evaluated(_) => None,
            VariantOutcome::Failed { error } => Some(error),
        }
    }
}

/// Applies a shared engine to every case. Holds no mutable state between cases.
#[derive(Debug, Clone, Copy)]
pub struct TestRunner<'a> {
    engine: &'a DecisionEngine,
    mode: RunMode,
}

impl<'a> TestRunner<'a> {
    pub fn new(engine: &'a DecisionEngine) -> Self {
        Self {
            engine,
            mode: RunMode::Structured,
        }
    }

    pub fn with_mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    /// Evaluate cases sequentially; output order matches input order.
    pub fn run(&self, cases: &[CounterfactualCase]) -> Vec<VariantResult> {
        cases.iter().map(|case| self.run_case(case)).collect()
    }

    /// Evaluate cases on the rayon pool. Indexed collection keeps input order.
    pub fn run_parallel(&self, cases: &[CounterfactualCase]) -> Vec<VariantResult> {
        cases.par_iter().map(|case| self.run_case(case)).collect()
    }

    fn run_case(&self, case: &CounterfactualCase) -> VariantResult {
        let outcome = match self.evaluate_isolated(case) {
            Ok(result) => VariantOutcome::Evaluated(result),
            Err(err) => {
                warn!(variant = %case.label, error = %err, "counterfactual evaluation failed");
                VariantOutcome::Failed {
                    error: err.to_string(),
                }
            }
        };

        VariantResult {
            label: case.label.clone(),
            variant: case.variant.clone(),
            outcome,
        }
    }

    fn evaluate_isolated(&self, case: &CounterfactualCase) -> Result<DecisionResult, EvaluationError> {
        catch_unwind(AssertUnwindSafe(|| self.evaluate(case))).unwrap_or_else(|payload| {
            let message = payload
                .downcast_ref::<&str>()
                .map(|text| text.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(EvaluationError::Aborted(message))
        })
    }

    fn evaluate(&self, case: &CounterfactualCase) -> Result<DecisionResult, EvaluationError> {
        match self.mode {
            RunMode::Structured => Ok(self.engine.evaluate(&case.application)?),
            RunMode::Prompt => {
                let range = self.engine.thresholds().credit_score_range;
                let application = parse_prompt(&case.prompt, range)?;
                let drifted = drifted_fields(&case.application.financials, &application.financials);
                if !drifted.is_empty() {
                    return Err(EvaluationError::PromptMismatch {
                        fields: drifted.join(", "),
                    });
                }
                Ok(self.engine.evaluate(&application)?)
            }
        }
    }
}

fn drifted_fields(expected: &FinancialProfile, extracted: &FinancialProfile) -> Vec<&'static str> {
    let checks = [
        ("credit_score", expected.credit_score == extracted.credit_score),
        ("annual_income", expected.annual_income == extracted.annual_income),
        ("loan_amount", expected.loan_amount == extracted.loan_amount),
        (
            "debt_to_income_ratio",
            expected.debt_to_income_ratio == extracted.debt_to_income_ratio,
        ),
        (
            "employment_length_years",
            expected.employment_length_years == extracted.employment_length_years,
        ),
        ("delinquencies_24m", expected.delinquencies_24m == extracted.delinquencies_24m),
        (
            "credit_history_years",
            expected.credit_history_years == extracted.credit_history_years,
        ),
    ];
    checks
        .into_iter()
        .filter(|(_, matches)| !matches)
        .map(|(field, _)| field)
        .collect()
}
