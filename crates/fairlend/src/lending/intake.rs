//! Validation of inbound application data.
//!
//! Every path into the decision engine passes through [`validate_financials`]; JSON payloads are
//! first converted by [`application_from_json`], which reports the offending field instead of
//! falling back to defaults.

use serde_json::{Map, Value};

use super::domain::{FinancialProfile, LoanApplication, ProtectedAttributes};
use super::evaluation::CreditScoreRange;

/// Malformed or out-of-range financial input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("application payload must be a JSON object")]
    NotAnObject,
    #[error("missing required field `{field}`")]
    MissingField { field: &'static str },
    #[error("field `{field}` must be numeric, found {found}")]
    NotNumeric { field: &'static str, found: String },
    #[error("field `{field}` must be a whole number, found {value}")]
    NotInteger { field: &'static str, value: f64 },
    #[error("field `{field}` = {value} must be {constraint}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        constraint: String,
    },
    #[error("invalid protected attribute: {0}")]
    ProtectedAttribute(String),
}

impl ValidationError {
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ValidationError::MissingField { field }
            | ValidationError::NotNumeric { field, .. }
            | ValidationError::NotInteger { field, .. }
            | ValidationError::OutOfRange { field, .. } => Some(field),
            ValidationError::NotAnObject | ValidationError::ProtectedAttribute(_) => None,
        }
    }
}

/// Canonical financial field names with the legacy aliases accepted on input.
pub const FINANCIAL_FIELDS: [(&str, &[&str]); 7] = [
    ("credit_score", &[]),
    ("annual_income", &["income"]),
    ("loan_amount", &[]),
    ("debt_to_income_ratio", &["dti_ratio", "dti"]),
    ("employment_length_years", &["employment_years"]),
    ("delinquencies_24m", &["delinquencies"]),
    ("credit_history_years", &[]),
];

/// Range checks applied to every profile before evaluation.
pub fn validate_financials(
    profile: &FinancialProfile,
    credit_range: CreditScoreRange,
) -> Result<(), ValidationError> {
    if !credit_range.contains(profile.credit_score) {
        return Err(ValidationError::OutOfRange {
            field: "credit_score",
            value: f64::from(profile.credit_score),
            constraint: format!("within {}..={}", credit_range.floor, credit_range.ceiling),
        });
    }

    positive("annual_income", profile.annual_income)?;
    positive("loan_amount", profile.loan_amount)?;

    let dti = profile.debt_to_income_ratio;
    if !dti.is_finite() || !(0.0..=1.0).contains(&dti) {
        return Err(ValidationError::OutOfRange {
            field: "debt_to_income_ratio",
            value: dti,
            constraint: "within [0, 1]".to_string(),
        });
    }

    non_negative("employment_length_years", profile.employment_length_years)?;
    non_negative("credit_history_years", profile.credit_history_years)?;
    Ok(())
}

fn positive(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field,
            value,
            constraint: "finite and greater than 0".to_string(),
        })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field,
            value,
            constraint: "finite and not negative".to_string(),
        })
    }
}

/// Build a validated application from a JSON object.
pub fn application_from_json(
    payload: &Value,
    credit_range: CreditScoreRange,
) -> Result<LoanApplication, ValidationError> {
    let object = payload.as_object().ok_or(ValidationError::NotAnObject)?;

    let credit_score = integer_field(object, "credit_score")?;
    if credit_score < f64::from(credit_range.floor) || credit_score > f64::from(credit_range.ceiling)
    {
        return Err(ValidationError::OutOfRange {
            field: "credit_score",
            value: credit_score,
            constraint: format!("within {}..={}", credit_range.floor, credit_range.ceiling),
        });
    }

    let delinquencies = integer_field(object, "delinquencies_24m")?;
    if delinquencies < 0.0 || delinquencies > f64::from(u32::MAX) {
        return Err(ValidationError::OutOfRange {
            field: "delinquencies_24m",
            value: delinquencies,
            constraint: "a non-negative count".to_string(),
        });
    }

    let financials = FinancialProfile {
        credit_score: credit_score as u16,
        annual_income: number_field(object, "annual_income")?,
        loan_amount: number_field(object, "loan_amount")?,
        debt_to_income_ratio: number_field(object, "debt_to_income_ratio")?,
        employment_length_years: number_field(object, "employment_length_years")?,
        delinquencies_24m: delinquencies as u32,
        credit_history_years: number_field(object, "credit_history_years")?,
    };
    validate_financials(&financials, credit_range)?;

    let protected = protected_from_object(object)?;
    Ok(LoanApplication::with_protected(financials, protected))
}

/// Overlay the financial keys present in `overrides` onto `base` and validate the result.
///
/// Keys that are not financial fields are ignored, so protected attributes cannot be smuggled
/// into a counterfactual base profile.
pub fn apply_overrides(
    base: &FinancialProfile,
    overrides: &Value,
    credit_range: CreditScoreRange,
) -> Result<FinancialProfile, ValidationError> {
    let overrides = overrides.as_object().ok_or(ValidationError::NotAnObject)?;
    let mut merged = match serde_json::to_value(base) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };

    for (field, aliases) in FINANCIAL_FIELDS {
        let provided = std::iter::once(field)
            .chain(aliases.iter().copied())
            .find_map(|key| overrides.get(key));
        if let Some(value) = provided {
            merged.insert(field.to_string(), value.clone());
        }
    }

    application_from_json(&Value::Object(merged), credit_range)
        .map(|application| application.financials)
}

fn lookup<'a>(object: &'a Map<String, Value>, field: &'static str) -> Option<&'a Value> {
    let aliases = FINANCIAL_FIELDS
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, aliases)| *aliases)
        .unwrap_or(&[]);

    std::iter::once(field)
        .chain(aliases.iter().copied())
        .find_map(|key| object.get(key))
        .filter(|value| !value.is_null())
}

fn number_field(object: &Map<String, Value>, field: &'static str) -> Result<f64, ValidationError> {
    let value = lookup(object, field).ok_or(ValidationError::MissingField { field })?;
    value.as_f64().ok_or_else(|| ValidationError::NotNumeric {
        field,
        found: value.to_string(),
    })
}

fn integer_field(object: &Map<String, Value>, field: &'static str) -> Result<f64, ValidationError> {
    let value = number_field(object, field)?;
    if value.fract() != 0.0 {
        return Err(ValidationError::NotInteger { field, value });
    }
    Ok(value)
}

fn protected_from_object(object: &Map<String, Value>) -> Result<ProtectedAttributes, ValidationError> {
    let mut protected = Map::new();
    for key in [
        "applicant_name",
        "gender",
        "age",
        "race",
        "ethnicity",
        "marital_status",
        "zip_code",
    ] {
        if let Some(value) = object.get(key).filter(|value| !value.is_null()) {
            protected.insert(key.to_string(), value.clone());
        }
    }
    if !protected.contains_key("applicant_name") {
        if let Some(name) = object.get("name").filter(|value| !value.is_null()) {
            protected.insert("applicant_name".to_string(), name.clone());
        }
    }

    serde_json::from_value(Value::Object(protected))
        .map_err(|err| ValidationError::ProtectedAttribute(err.to_string()))
}
