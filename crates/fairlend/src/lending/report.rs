//! Fixed-format text reports and tabular exports for bias runs.

use std::io;

use serde::Serialize;

use super::bias::BiasFinding;
use super::counterfactual::{VariantOutcome, VariantResult};
use super::domain::FinancialProfile;
use super::mitigation::{Priority, Recommendation};

const RULE: usize = 80;

fn heavy_rule() -> String {
    "=".repeat(RULE)
}

fn light_rule() -> String {
    "-".repeat(RULE)
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

/// Human-readable bias test report in the layout used by the CLI.
pub fn render_bias_report(base: &FinancialProfile, finding: &BiasFinding) -> String {
    let mut out = vec![
        heavy_rule(),
        "BIAS TEST REPORT - Loan Approval System".to_string(),
        heavy_rule(),
        String::new(),
        "Test Group: Gender/Name Variation Test".to_string(),
        String::new(),
        "Financial Criteria (Same for All Tests):".to_string(),
        format!("  credit_score: {}", base.credit_score),
        format!("  annual_income: {}", base.annual_income),
        format!("  loan_amount: {}", base.loan_amount),
        format!("  debt_to_income_ratio: {}", base.debt_to_income_ratio),
        format!("  employment_length_years: {}", base.employment_length_years),
        format!("  delinquencies_24m: {}", base.delinquencies_24m),
        format!("  credit_history_years: {}", base.credit_history_years),
        String::new(),
        light_rule(),
        "Test Results:".to_string(),
        light_rule(),
    ];

    for result in &finding.per_variant_results {
        out.push(String::new());
        out.push(format!("Applicant: {}", result.label));
        match &result.outcome {
            VariantOutcome::Evaluated(decision) => {
                out.push(format!("Decision: {}", decision.decision));
                out.push(format!("Risk Score: {:.2}/100", decision.risk_score));
                out.push(format!("Rationale: {}", decision.rationale));
            }
            VariantOutcome::Failed { error } => {
                out.push("Decision: ERROR".to_string());
                out.push(format!("Error: {error}"));
            }
        }
    }

    out.extend([
        String::new(),
        light_rule(),
        "Bias Analysis:".to_string(),
        light_rule(),
        format!(
            "Decisions Consistent: {}",
            yes_no(finding.decisions_consistent)
        ),
        format!("Risk Scores Vary: {}", yes_no(finding.scores_vary)),
    ]);
    if finding.scores_vary {
        out.push(format!(
            "Maximum Score Difference: {:.2} points",
            finding.score_variance
        ));
    }
    out.push(format!(
        "Rationale Leakage: {}",
        yes_no(!finding.rationale_leaks.is_empty())
    ));
    out.push(String::new());
    out.push(format!(
        "BIAS DETECTED: {}",
        if finding.bias_detected { "YES" } else { "NO" }
    ));
    out.push(String::new());

    if finding.bias_detected {
        out.push("Bias Details:".to_string());
        out.extend(finding.bias_details.iter().map(|detail| format!("  - {detail}")));
    } else {
        out.push(
            "No bias detected. System treats all applicants equally when financial".to_string(),
        );
        out.push("criteria are identical, regardless of name or gender.".to_string());
        if !finding.bias_details.is_empty() {
            out.push(String::new());
            out.push("Notes:".to_string());
            out.extend(finding.bias_details.iter().map(|detail| format!("  - {detail}")));
        }
    }

    out.push(String::new());
    out.push(heavy_rule());
    out.join("\n")
}

/// Mitigation strategies report. A clean finding still lists `catalog` as preventive guidance.
pub fn render_mitigation_report(finding: &BiasFinding, catalog: &[Recommendation]) -> String {
    let mut out = vec![
        heavy_rule(),
        "BIAS MITIGATION STRATEGIES REPORT".to_string(),
        heavy_rule(),
        String::new(),
    ];

    if finding.bias_detected {
        out.push("[!] BIAS DETECTED - Mitigation Required".to_string());
        out.push(String::new());
        out.push("Detected Issues:".to_string());
        out.extend(finding.bias_details.iter().map(|detail| format!("  - {detail}")));
    } else {
        out.push("[OK] No bias detected in current tests.".to_string());
        out.push(String::new());
        out.push(
            "Preventive measures are still recommended so bias does not emerge later.".to_string(),
        );
    }

    out.extend([
        String::new(),
        heavy_rule(),
        "RECOMMENDED MITIGATION STRATEGIES".to_string(),
        heavy_rule(),
    ]);
    for recommendation in catalog {
        out.push(String::new());
        out.push(format!(
            "[{}] {} ({})",
            recommendation.priority, recommendation.strategy, recommendation.category
        ));
        out.push(format!("   Description: {}", recommendation.description));
        out.push("   Implementation:".to_string());
        for (index, step) in recommendation.steps.iter().enumerate() {
            out.push(format!("   {}. {step}", index + 1));
        }
    }

    out.extend([
        String::new(),
        heavy_rule(),
        "IMPLEMENTATION CHECKLIST".to_string(),
        heavy_rule(),
    ]);
    for (priority, heading) in [
        (Priority::High, "High Priority (Implement First):"),
        (Priority::Medium, "Medium Priority (Implement Next):"),
        (Priority::Low, "Low Priority (Consider for Future):"),
    ] {
        out.push(String::new());
        out.push(heading.to_string());
        let entries = catalog
            .iter()
            .filter(|recommendation| recommendation.priority == priority);
        for (index, recommendation) in entries.enumerate() {
            out.push(format!(
                "  {}. [{}] {}",
                index + 1,
                recommendation.category,
                recommendation.strategy
            ));
        }
    }

    out.push(String::new());
    out.push(heavy_rule());
    out.join("\n")
}

#[derive(Serialize)]
struct CsvRow<'a> {
    label: &'a str,
    applicant_name: &'a str,
    gender: &'a str,
    status: &'static str,
    decision: Option<&'static str>,
    risk_score: Option<f64>,
    rationale: &'a str,
}

/// One CSV row per variant, in run order.
pub fn write_results_csv<W: io::Write>(writer: W, results: &[VariantResult]) -> csv::Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for result in results {
        let row = match &result.outcome {
            VariantOutcome::Evaluated(decision) => CsvRow {
                label: &result.label,
                applicant_name: &result.variant.name,
                gender: &result.variant.gender,
                status: "evaluated",
                decision: Some(decision.decision.label()),
                risk_score: Some(decision.risk_score),
                rationale: &decision.rationale,
            },
            VariantOutcome::Failed { error } => CsvRow {
                label: &result.label,
                applicant_name: &result.variant.name,
                gender: &result.variant.gender,
                status: "failed",
                decision: None,
                risk_score: None,
                rationale: error,
            },
        };
        csv.serialize(row)?;
    }
    csv.flush()?;
    Ok(())
}
