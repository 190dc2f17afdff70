use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Financial attributes the decision engine is permitted to consider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinancialProfile {
    pub credit_score: u16,
    pub annual_income: f64,
    pub loan_amount: f64,
    pub debt_to_income_ratio: f64,
    pub employment_length_years: f64,
    pub delinquencies_24m: u32,
    pub credit_history_years: f64,
}

impl FinancialProfile {
    /// Loan amount as a share of annual income. Never stored on the profile.
    pub fn loan_to_income_ratio(&self) -> f64 {
        self.loan_amount / self.annual_income
    }
}

/// Demographic attributes kept for traceability and testing only.
///
/// Nothing under `evaluation` accepts this type; the engine is handed the financial half of an
/// application and cannot observe these values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applicant_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub race: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ethnicity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marital_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
}

impl ProtectedAttributes {
    /// Textual values that must never surface in a decision rationale.
    pub fn sensitive_terms(&self) -> Vec<&str> {
        [
            self.applicant_name.as_deref(),
            self.gender.as_deref(),
            self.race.as_deref(),
            self.ethnicity.as_deref(),
            self.marital_status.as_deref(),
            self.zip_code.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .collect()
    }
}

/// A single loan application: financial fields plus optional protected attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanApplication {
    #[serde(flatten)]
    pub financials: FinancialProfile,
    #[serde(flatten)]
    pub protected: ProtectedAttributes,
}

impl LoanApplication {
    pub fn new(financials: FinancialProfile) -> Self {
        Self {
            financials,
            protected: ProtectedAttributes::default(),
        }
    }

    pub fn with_protected(financials: FinancialProfile, protected: ProtectedAttributes) -> Self {
        Self {
            financials,
            protected,
        }
    }
}

/// Closed set of outcomes produced by the decision engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Approved,
    Denied,
    Review,
}

impl Decision {
    pub const fn label(self) -> &'static str {
        match self {
            Decision::Approved => "APPROVED",
            Decision::Denied => "DENIED",
            Decision::Review => "REVIEW",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Underwriting criteria, in audit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    CreditScore,
    DebtToIncomeRatio,
    LoanToIncomeRatio,
    Delinquencies24m,
    EmploymentLengthYears,
    CreditHistoryYears,
}

impl Criterion {
    pub const ALL: [Criterion; 6] = [
        Criterion::CreditScore,
        Criterion::DebtToIncomeRatio,
        Criterion::LoanToIncomeRatio,
        Criterion::Delinquencies24m,
        Criterion::EmploymentLengthYears,
        Criterion::CreditHistoryYears,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            Criterion::CreditScore => "credit_score",
            Criterion::DebtToIncomeRatio => "debt_to_income_ratio",
            Criterion::LoanToIncomeRatio => "loan_to_income_ratio",
            Criterion::Delinquencies24m => "delinquencies_24m",
            Criterion::EmploymentLengthYears => "employment_length_years",
            Criterion::CreditHistoryYears => "credit_history_years",
        }
    }
}

/// Direction a measured value must satisfy against its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    AtLeast,
    AtMost,
}

impl Comparison {
    pub fn holds(self, measured: f64, threshold: f64) -> bool {
        match self {
            Comparison::AtLeast => measured >= threshold,
            Comparison::AtMost => measured <= threshold,
        }
    }
}

/// Audit entry for one criterion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriterionCheck {
    pub measured: f64,
    pub threshold: f64,
    pub comparison: Comparison,
    pub passed: bool,
}

/// Output of the decision engine for a single application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionResult {
    pub decision: Decision,
    pub rationale: String,
    pub risk_score: f64,
    pub details: BTreeMap<Criterion, CriterionCheck>,
}

impl DecisionResult {
    pub fn failed_criteria(&self) -> impl Iterator<Item = Criterion> + '_ {
        self.details
            .iter()
            .filter(|(_, check)| !check.passed)
            .map(|(criterion, _)| *criterion)
    }
}
