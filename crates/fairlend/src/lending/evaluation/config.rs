use serde::{Deserialize, Serialize};

pub const DEFAULT_MIN_CREDIT_SCORE: u16 = 650;
pub const DEFAULT_MAX_DTI_RATIO: f64 = 0.36;
pub const DEFAULT_MAX_LOAN_TO_INCOME: f64 = 0.25;
pub const DEFAULT_MAX_DELINQUENCIES: u32 = 2;
pub const DEFAULT_MIN_EMPLOYMENT_YEARS: f64 = 1.0;
pub const DEFAULT_MIN_CREDIT_HISTORY_YEARS: f64 = 2.0;

/// Inclusive credit score range accepted at intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditScoreRange {
    pub floor: u16,
    pub ceiling: u16,
}

impl CreditScoreRange {
    pub fn contains(&self, score: u16) -> bool {
        (self.floor..=self.ceiling).contains(&score)
    }
}

impl Default for CreditScoreRange {
    fn default() -> Self {
        Self {
            floor: 300,
            ceiling: 850,
        }
    }
}

/// Underwriting policy fixed at engine construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnderwritingThresholds {
    pub min_credit_score: u16,
    pub max_dti_ratio: f64,
    pub max_loan_to_income: f64,
    pub max_delinquencies: u32,
    pub min_employment_years: f64,
    pub min_credit_history_years: f64,
    pub credit_score_range: CreditScoreRange,
}

impl Default for UnderwritingThresholds {
    fn default() -> Self {
        Self {
            min_credit_score: DEFAULT_MIN_CREDIT_SCORE,
            max_dti_ratio: DEFAULT_MAX_DTI_RATIO,
            max_loan_to_income: DEFAULT_MAX_LOAN_TO_INCOME,
            max_delinquencies: DEFAULT_MAX_DELINQUENCIES,
            min_employment_years: DEFAULT_MIN_EMPLOYMENT_YEARS,
            min_credit_history_years: DEFAULT_MIN_CREDIT_HISTORY_YEARS,
            credit_score_range: CreditScoreRange::default(),
        }
    }
}

impl UnderwritingThresholds {
    pub fn validate(&self) -> Result<(), ThresholdError> {
        let range = self.credit_score_range;
        if range.floor >= range.ceiling {
            return Err(ThresholdError::CreditScoreRange {
                floor: range.floor,
                ceiling: range.ceiling,
            });
        }
        if !range.contains(self.min_credit_score) {
            return Err(ThresholdError::OutOfRange {
                name: "min_credit_score",
                value: f64::from(self.min_credit_score),
                constraint: format!("within credit score range {}..={}", range.floor, range.ceiling),
            });
        }

        check_ratio("max_dti_ratio", self.max_dti_ratio)?;
        if !self.max_loan_to_income.is_finite() || self.max_loan_to_income <= 0.0 {
            return Err(ThresholdError::OutOfRange {
                name: "max_loan_to_income",
                value: self.max_loan_to_income,
                constraint: "finite and greater than 0".to_string(),
            });
        }
        check_years("min_employment_years", self.min_employment_years)?;
        check_years("min_credit_history_years", self.min_credit_history_years)?;
        Ok(())
    }
}

fn check_ratio(name: &'static str, value: f64) -> Result<(), ThresholdError> {
    if value.is_finite() && value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ThresholdError::OutOfRange {
            name,
            value,
            constraint: "within (0, 1]".to_string(),
        })
    }
}

fn check_years(name: &'static str, value: f64) -> Result<(), ThresholdError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ThresholdError::OutOfRange {
            name,
            value,
            constraint: "finite and not negative".to_string(),
        })
    }
}

/// Rejected underwriting configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ThresholdError {
    #[error("threshold {name} = {value} must be {constraint}")]
    OutOfRange {
        name: &'static str,
        value: f64,
        constraint: String,
    },
    #[error("credit score range {floor}..={ceiling} is empty")]
    CreditScoreRange { floor: u16, ceiling: u16 },
}
