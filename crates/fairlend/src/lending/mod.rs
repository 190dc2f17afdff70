//! Loan eligibility evaluation and counterfactual bias testing.
//!
//! Applications are scored by [`DecisionEngine`] from financial fields only. The bias pipeline
//! expands one base profile into name/gender variants ([`counterfactual::generate`]), evaluates
//! each ([`TestRunner`]), checks the results for divergence ([`BiasAnalyzer`]) and attaches
//! remediation guidance ([`MitigationAdvisor`]).

pub mod bias;
pub mod counterfactual;
pub mod domain;
pub mod evaluation;
pub mod intake;
pub mod mitigation;
pub mod prompt;
pub mod report;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use bias::{BiasAnalyzer, BiasFinding, GroupSummary, RationaleLeak, DEFAULT_SCORE_TOLERANCE};
pub use counterfactual::{
    CatalogError, CounterfactualCase, EvaluationError, RunMode, TestRunner, VariantCatalog,
    VariantOutcome, VariantResult, VariantSpec,
};
pub use domain::{
    Comparison, Criterion, CriterionCheck, Decision, DecisionResult, FinancialProfile,
    LoanApplication, ProtectedAttributes,
};
pub use evaluation::{CreditScoreRange, DecisionEngine, ThresholdError, UnderwritingThresholds};
pub use intake::ValidationError;
pub use mitigation::{MitigationAdvisor, Priority, Recommendation};
pub use router::lending_router;
pub use service::{
    standard_base_profile, BiasTestOptions, BiasTestReport, LendingError, LendingService,
};
