use std::collections::BTreeMap;

use super::super::domain::{Comparison, Criterion, CriterionCheck, FinancialProfile};
use super::config::UnderwritingThresholds;

const CREDIT_SCORE_WEIGHT: f64 = 25.0;
const DTI_WEIGHT: f64 = 20.0;
const LOAN_TO_INCOME_WEIGHT: f64 = 10.0;
const DELINQUENCY_WEIGHT: f64 = 15.0;
const DELINQUENCY_PENALTY: f64 = 5.0;
const EMPLOYMENT_WEIGHT: f64 = 15.0;
const EMPLOYMENT_POINTS_PER_YEAR: f64 = 3.0;
const HISTORY_WEIGHT: f64 = 15.0;
const HISTORY_POINTS_PER_YEAR: f64 = 2.0;
const CREDIT_POINTS_DIVISOR: f64 = 10.0;

/// Evaluate every criterion independently; later checks run even when earlier ones fail.
pub(crate) fn check_criteria(
    profile: &FinancialProfile,
    thresholds: &UnderwritingThresholds,
) -> BTreeMap<Criterion, CriterionCheck> {
    Criterion::ALL
        .into_iter()
        .map(|criterion| {
            let (measured, threshold, comparison) = measure(criterion, profile, thresholds);
            let check = CriterionCheck {
                measured,
                threshold,
                comparison,
                passed: comparison.holds(measured, threshold),
            };
            (criterion, check)
        })
        .collect()
}

fn measure(
    criterion: Criterion,
    profile: &FinancialProfile,
    thresholds: &UnderwritingThresholds,
) -> (f64, f64, Comparison) {
    match criterion {
        Criterion::CreditScore => (
            f64::from(profile.credit_score),
            f64::from(thresholds.min_credit_score),
            Comparison::AtLeast,
        ),
        Criterion::DebtToIncomeRatio => (
            profile.debt_to_income_ratio,
            thresholds.max_dti_ratio,
            Comparison::AtMost,
        ),
        Criterion::LoanToIncomeRatio => (
            profile.loan_to_income_ratio(),
            thresholds.max_loan_to_income,
            Comparison::AtMost,
        ),
        Criterion::Delinquencies24m => (
            f64::from(profile.delinquencies_24m),
            f64::from(thresholds.max_delinquencies),
            Comparison::AtMost,
        ),
        Criterion::EmploymentLengthYears => (
            profile.employment_length_years,
            thresholds.min_employment_years,
            Comparison::AtLeast,
        ),
        Criterion::CreditHistoryYears => (
            profile.credit_history_years,
            thresholds.min_credit_history_years,
            Comparison::AtLeast,
        ),
    }
}

/// Composite 0-100 strength score; higher means lower risk.
///
/// A failing criterion contributes nothing, so crossing any threshold can only lower the score.
pub(crate) fn risk_score(details: &BTreeMap<Criterion, CriterionCheck>) -> f64 {
    let total: f64 = details
        .iter()
        .filter(|(_, check)| check.passed)
        .map(|(criterion, check)| component_points(*criterion, check))
        .sum();

    total.clamp(0.0, 100.0)
}

fn component_points(criterion: Criterion, check: &CriterionCheck) -> f64 {
    let CriterionCheck {
        measured,
        threshold,
        ..
    } = *check;

    let points = match criterion {
        Criterion::CreditScore => ((measured - threshold) / CREDIT_POINTS_DIVISOR).min(CREDIT_SCORE_WEIGHT),
        Criterion::DebtToIncomeRatio => DTI_WEIGHT * (1.0 - measured / threshold),
        Criterion::LoanToIncomeRatio => LOAN_TO_INCOME_WEIGHT * (1.0 - measured / threshold),
        Criterion::Delinquencies24m => DELINQUENCY_WEIGHT - measured * DELINQUENCY_PENALTY,
        Criterion::EmploymentLengthYears => {
            (measured * EMPLOYMENT_POINTS_PER_YEAR).min(EMPLOYMENT_WEIGHT)
        }
        Criterion::CreditHistoryYears => (measured * HISTORY_POINTS_PER_YEAR).min(HISTORY_WEIGHT),
    };

    points.max(0.0)
}
