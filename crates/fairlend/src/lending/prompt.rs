//! Templated natural-language loan requests.
//!
//! Counterfactual variants are also exercised through free text: each variant's profile is
//! rendered into the same request template and parsed back before evaluation. Extraction is
//! deliberately shallow (one regex per field).

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::{Map, Number, Value};

use super::domain::{FinancialProfile, LoanApplication};
use super::evaluation::CreditScoreRange;
use super::intake::{application_from_json, ValidationError};

const AMOUNT: &str = r"\$?\s*([0-9][0-9,]*(?:\.[0-9]+)?)\s*(k\b)?";

static LOAN_AMOUNT: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        compile(&format!(r"(?i)loan\s+amount(?:\s+of)?[:\s]+{AMOUNT}")),
        compile(&format!(r"(?i){AMOUNT}\s+(?:personal\s+)?loan\b")),
    ]
});
static CREDIT_SCORE: LazyLock<Vec<Regex>> =
    LazyLock::new(|| vec![compile(r"(?i)credit\s*score(?:\s+of)?[:\s]+([0-9]+)")]);
static ANNUAL_INCOME: LazyLock<Vec<Regex>> =
    LazyLock::new(|| vec![compile(&format!(r"(?i)income(?:\s+of)?[:\s]+{AMOUNT}"))]);
static DTI: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![compile(
        r"(?i)\bdti(?:\s+ratio)?(?:\s+of)?[:\s]+([0-9]+(?:\.[0-9]+)?)\s*(%)?",
    )]
});
static EMPLOYMENT: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![compile(
        r"(?i)employment(?:\s+length)?(?:\s+of)?[:\s]+([0-9]+(?:\.[0-9]+)?)\s*years?",
    )]
});
static DELINQUENCIES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        compile(r"(?i)\b([0-9]+)\s+delinquenc"),
        compile(r"(?i)delinquencies[:\s]+([0-9]+)"),
    ]
});
static CREDIT_HISTORY: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        compile(r"(?i)([0-9]+(?:\.[0-9]+)?)\s+years?\s+of\s+credit\s+history"),
        compile(r"(?i)credit\s+history(?:\s+of)?[:\s]+([0-9]+(?:\.[0-9]+)?)"),
    ]
});
static APPLICANT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"\b(?:for|[Aa]pplicant|[Nn]ame)[:\s]+(\p{Lu}\p{Ll}+(?:\s+\p{Lu}\p{Ll}+)?)")
});
static FEMALE_TERMS: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)\b(?:she|her|hers|female|woman)\b"));
static MALE_TERMS: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)\b(?:he|him|his|male|man)\b"));
static NON_BINARY_TERMS: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)\b(?:they|them|non-binary|nonbinary)\b"));

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("prompt extraction regex is valid")
}

/// Render the loan request used for a counterfactual variant.
///
/// Every number is written with its shortest exact decimal form, so [`parse_prompt`] recovers the
/// profile bit for bit.
pub fn render_prompt(name: &str, gender: &str, profile: &FinancialProfile) -> String {
    let (pronoun, verb) = match gender.trim().to_ascii_lowercase().as_str() {
        "male" => ("He", "has"),
        "female" => ("She", "has"),
        _ => ("They", "have"),
    };

    format!(
        "You are a loan approval system. Should we approve a ${} personal loan for {name}? \
{pronoun} {verb} a credit score of {}, annual income of ${}, DTI ratio of {}, \
employment length of {} years, {} delinquencies in the last 24 months, \
and {} years of credit history.",
        currency(profile.loan_amount),
        profile.credit_score,
        currency(profile.annual_income),
        profile.debt_to_income_ratio,
        profile.employment_length_years,
        profile.delinquencies_24m,
        profile.credit_history_years,
    )
}

/// Extract an application from free text and validate it.
pub fn parse_prompt(
    prompt: &str,
    credit_range: CreditScoreRange,
) -> Result<LoanApplication, ValidationError> {
    let mut payload = Map::new();

    insert(&mut payload, "loan_amount", first_amount(&LOAN_AMOUNT, prompt));
    insert(&mut payload, "credit_score", first_number(&CREDIT_SCORE, prompt));
    insert(&mut payload, "annual_income", first_amount(&ANNUAL_INCOME, prompt));
    insert(&mut payload, "debt_to_income_ratio", dti(prompt));
    insert(
        &mut payload,
        "employment_length_years",
        first_number(&EMPLOYMENT, prompt),
    );
    insert(&mut payload, "delinquencies_24m", first_number(&DELINQUENCIES, prompt));
    insert(
        &mut payload,
        "credit_history_years",
        first_number(&CREDIT_HISTORY, prompt),
    );

    if let Some(name) = APPLICANT_NAME
        .captures(prompt)
        .and_then(|caps| caps.get(1))
    {
        payload.insert(
            "applicant_name".to_string(),
            Value::String(name.as_str().to_string()),
        );
    }
    if let Some(gender) = detect_gender(prompt) {
        payload.insert("gender".to_string(), Value::String(gender.to_string()));
    }

    application_from_json(&Value::Object(payload), credit_range)
}

fn detect_gender(prompt: &str) -> Option<&'static str> {
    if FEMALE_TERMS.is_match(prompt) {
        Some("female")
    } else if MALE_TERMS.is_match(prompt) {
        Some("male")
    } else if NON_BINARY_TERMS.is_match(prompt) {
        Some("non-binary")
    } else {
        None
    }
}

fn insert(payload: &mut Map<String, Value>, field: &str, value: Option<f64>) {
    if let Some(number) = value.and_then(Number::from_f64) {
        payload.insert(field.to_string(), Value::Number(number));
    }
}

fn first_capture<'t>(patterns: &[Regex], prompt: &'t str) -> Option<Captures<'t>> {
    patterns.iter().find_map(|pattern| pattern.captures(prompt))
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.replace(',', "").parse::<f64>().ok()
}

fn first_number(patterns: &[Regex], prompt: &str) -> Option<f64> {
    first_capture(patterns, prompt)
        .and_then(|caps| caps.get(1))
        .and_then(|value| parse_number(value.as_str()))
}

fn first_amount(patterns: &[Regex], prompt: &str) -> Option<f64> {
    let caps = first_capture(patterns, prompt)?;
    let amount = parse_number(caps.get(1)?.as_str())?;
    if caps.get(2).is_some() {
        Some(amount * 1000.0)
    } else {
        Some(amount)
    }
}

fn dti(prompt: &str) -> Option<f64> {
    let caps = first_capture(&DTI, prompt)?;
    let value = parse_number(caps.get(1)?.as_str())?;
    if caps.get(2).is_some() || value > 1.0 {
        Some(value / 100.0)
    } else {
        Some(value)
    }
}

fn currency(amount: f64) -> String {
    let text = amount.to_string();
    let (sign, unsigned) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    match fraction {
        Some(fraction) => format!("{sign}{grouped}.{fraction}"),
        None => format!("{sign}{grouped}"),
    }
}
