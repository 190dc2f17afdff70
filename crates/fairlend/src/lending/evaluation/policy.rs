use std::collections::BTreeMap;

use super::super::domain::{Criterion, CriterionCheck, Decision};

/// All criteria passing approves, a single failure goes to manual review, anything more denies.
pub(crate) fn decide(details: &BTreeMap<Criterion, CriterionCheck>) -> Decision {
    match details.values().filter(|check| !check.passed).count() {
        0 => Decision::Approved,
        1 => Decision::Review,
        _ => Decision::Denied,
    }
}

/// Rationale text built from the criterion audit trail alone.
pub(crate) fn rationale(decision: Decision, details: &BTreeMap<Criterion, CriterionCheck>) -> String {
    let reasons: Vec<String> = details
        .iter()
        .filter(|(_, check)| !check.passed)
        .map(|(criterion, check)| failure_reason(*criterion, check))
        .collect();

    match decision {
        Decision::Approved => "Application meets all criteria. Approved.".to_string(),
        Decision::Review => format!(
            "Application meets all but one criterion and requires manual review. Reason: {}",
            reasons.join("; ")
        ),
        Decision::Denied => format!("Application denied. Reasons: {}", reasons.join("; ")),
    }
}

fn failure_reason(criterion: Criterion, check: &CriterionCheck) -> String {
    let CriterionCheck {
        measured,
        threshold,
        ..
    } = *check;

    match criterion {
        Criterion::CreditScore => {
            format!("Credit score {measured:.0} below minimum {threshold:.0}")
        }
        Criterion::DebtToIncomeRatio => format!(
            "DTI ratio {:.2}% exceeds maximum {:.2}%",
            measured * 100.0,
            threshold * 100.0
        ),
        Criterion::LoanToIncomeRatio => format!(
            "Loan amount {:.2}% of income exceeds maximum {:.2}%",
            measured * 100.0,
            threshold * 100.0
        ),
        Criterion::Delinquencies24m => {
            format!("Delinquencies {measured:.0} exceed maximum {threshold:.0}")
        }
        Criterion::EmploymentLengthYears => {
            format!("Employment length {measured} years below minimum {threshold}")
        }
        Criterion::CreditHistoryYears => {
            format!("Credit history {measured} years below minimum {threshold}")
        }
    }
}
