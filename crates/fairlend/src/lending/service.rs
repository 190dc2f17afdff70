use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use super::bias::{BiasAnalyzer, BiasFinding};
use super::counterfactual::{generate, RunMode, TestRunner, VariantCatalog};
use super::domain::{DecisionResult, FinancialProfile, LoanApplication};
use super::evaluation::DecisionEngine;
use super::intake::{application_from_json, apply_overrides, ValidationError};
use super::mitigation::{MitigationAdvisor, Recommendation};

/// Financial profile counterfactual runs start from when no overrides are supplied.
pub fn standard_base_profile() -> FinancialProfile {
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

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BiasTestOptions {
    pub mode: RunMode,
    pub parallel: bool,
}

/// Outcome of a full counterfactual pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct BiasTestReport {
    pub catalog_version: u32,
    pub run_mode: RunMode,
    pub base_financials: FinancialProfile,
    #[serde(flatten)]
    pub finding: BiasFinding,
    pub recommendations: Vec<Recommendation>,
}

/// Service composing the engine, variant catalog, analyzer and advisor.
#[derive(Debug, Clone)]
pub struct LendingService {
    engine: Arc<DecisionEngine>,
    catalog: Arc<VariantCatalog>,
    analyzer: BiasAnalyzer,
    advisor: MitigationAdvisor,
    base_profile: FinancialProfile,
}

impl LendingService {
    pub fn new(engine: DecisionEngine, catalog: VariantCatalog, analyzer: BiasAnalyzer) -> Self {
        Self {
            engine: Arc::new(engine),
            catalog: Arc::new(catalog),
            analyzer,
            advisor: MitigationAdvisor,
            base_profile: standard_base_profile(),
        }
    }

    pub fn with_base_profile(mut self, base_profile: FinancialProfile) -> Self {
        self.base_profile = base_profile;
        self
    }

    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }

    pub fn catalog(&self) -> &VariantCatalog {
        &self.catalog
    }

    pub fn advisor(&self) -> &MitigationAdvisor {
        &self.advisor
    }

    pub fn base_profile(&self) -> &FinancialProfile {
        &self.base_profile
    }

    pub fn evaluate(&self, application: &LoanApplication) -> Result<DecisionResult, LendingError> {
        Ok(self.engine.evaluate(application)?)
    }

    /// Validate and evaluate a JSON application payload.
    pub fn evaluate_payload(&self, payload: &Value) -> Result<DecisionResult, LendingError> {
        let range = self.engine.thresholds().credit_score_range;
        let application = application_from_json(payload, range)?;
        self.evaluate(&application)
    }

    /// Run the counterfactual pipeline, optionally overriding base financial fields.
    pub fn bias_test(
        &self,
        overrides: Option<&Value>,
        options: BiasTestOptions,
    ) -> Result<BiasTestReport, LendingError> {
        let base = match overrides {
            Some(overrides) => apply_overrides(
                &self.base_profile,
                overrides,
                self.engine.thresholds().credit_score_range,
            )?,
            None => self.base_profile,
        };
        Ok(self.bias_test_profile(base, options))
    }

    pub fn bias_test_profile(&self, base: FinancialProfile, options: BiasTestOptions) -> BiasTestReport {
        let cases = generate(&base, &self.catalog);
        let runner = TestRunner::new(&self.engine).with_mode(options.mode);
        let results = if options.parallel {
            runner.run_parallel(&cases)
        } else {
            runner.run(&cases)
        };

        let finding = self.analyzer.analyze(results);
        let recommendations = self.advisor.advise(&finding);

        info!(
            variants = cases.len(),
            catalog_version = self.catalog.version(),
            mode = ?options.mode,
            decisions_consistent = finding.decisions_consistent,
            score_variance = finding.score_variance,
            "counterfactual bias run complete"
        );
        if finding.bias_detected {
            warn!(details = ?finding.bias_details, "bias detected in counterfactual run");
        }

        BiasTestReport {
            catalog_version: self.catalog.version(),
            run_mode: options.mode,
            base_financials: base,
            finding,
            recommendations,
        }
    }
}

impl Default for LendingService {
    fn default() -> Self {
        Self::new(
            DecisionEngine::default(),
            VariantCatalog::standard(),
            BiasAnalyzer::default(),
        )
    }
}

/// Error raised by the lending service.
#[derive(Debug, thiserror::Error)]
pub enum LendingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("malformed JSON payload: {0}")]
    MalformedPayload(String),
}

impl LendingError {
    /// Offending request field, when the failure is attributable to one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            LendingError::Validation(validation) => validation.field(),
            LendingError::MalformedPayload(_) => None,
        }
    }
}
