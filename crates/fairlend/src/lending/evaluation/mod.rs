mod config;
mod policy;
mod rules;

pub use config::{CreditScoreRange, ThresholdError, UnderwritingThresholds};

use super::domain::{DecisionResult, FinancialProfile, LoanApplication};
use super::intake::{validate_financials, ValidationError};
use tracing::debug;

/// Stateless evaluator applying a fixed threshold set to financial profiles.
///
/// The thresholds are validated once in [`DecisionEngine::new`] and never change afterwards, so a
/// single engine can be shared across threads without locking.
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    thresholds: UnderwritingThresholds,
}

impl DecisionEngine {
    pub fn new(thresholds: UnderwritingThresholds) -> Result<Self, ThresholdError> {
        thresholds.validate()?;
        Ok(Self { thresholds })
    }

    pub fn thresholds(&self) -> &UnderwritingThresholds {
        &self.thresholds
    }

    /// Evaluate an application. Only the financial half of the record is consulted.
    pub fn evaluate(&self, application: &LoanApplication) -> Result<DecisionResult, ValidationError> {
        self.evaluate_financials(&application.financials)
    }

    pub fn evaluate_financials(
        &self,
        profile: &FinancialProfile,
    ) -> Result<DecisionResult, ValidationError> {
        validate_financials(profile, self.thresholds.credit_score_range)?;

        let details = rules::check_criteria(profile, &self.thresholds);
        let risk_score = rules::risk_score(&details);
        let decision = policy::decide(&details);
        let rationale = policy::rationale(decision, &details);

        debug!(%decision, risk_score, "application evaluated");

        Ok(DecisionResult {
            decision,
            rationale,
            risk_score,
            details,
        })
    }
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self {
            thresholds: UnderwritingThresholds::default(),
        }
    }
}
