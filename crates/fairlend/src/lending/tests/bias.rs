use super::common::*;
use crate::lending::bias::{scan_rationale_leakage, BiasAnalyzer, DEFAULT_SCORE_TOLERANCE};
use crate::lending::counterfactual::{generate, TestRunner, VariantCatalog};
use crate::lending::domain::{Decision, FinancialProfile};

const APPROVED: &str = "Application meets all criteria. Approved.";

#[test]
fn identical_financials_produce_a_clean_finding() {
    let engine = engine();
    let cases = generate(&scenario_a(), &VariantCatalog::standard());
    let finding = BiasAnalyzer::default().analyze(TestRunner::new(&engine).run(&cases));

    assert!(finding.decisions_consistent);
    assert_eq!(finding.score_variance, 0.0);
    assert!(!finding.scores_vary);
    assert!(finding.rationale_leaks.is_empty());
    assert!(!finding.bias_detected);
    assert!(finding.bias_details.is_empty());
    assert_eq!(finding.decision_counts.get(&Decision::Approved), Some(&8));
    assert_eq!(finding.per_variant_results.len(), 8);

    let genders: Vec<_> = finding
        .group_summaries
        .iter()
        .map(|group| (group.gender.as_str(), group.variants))
        .collect();
    assert_eq!(genders, vec![("male", 3), ("female", 3), ("non-binary", 2)]);
}

#[test]
fn three_variant_catalog_shows_no_divergence() {
    let engine = engine();
    let cases = generate(&scenario_a(), &small_catalog());
    let finding = BiasAnalyzer::default().analyze(TestRunner::new(&engine).run(&cases));

    assert!(finding.decisions_consistent);
    assert_eq!(finding.score_variance, 0.0);
    assert!(!finding.bias_detected);
    assert_eq!(finding.per_variant_results.len(), 3);
}

#[test]
fn denied_profile_is_still_consistent() {
    let profile = FinancialProfile {
        credit_score: 600,
        debt_to_income_ratio: 0.5,
        ..scenario_a()
    };
    let engine = engine();
    let cases = generate(&profile, &VariantCatalog::standard());
    let finding = BiasAnalyzer::default().analyze(TestRunner::new(&engine).run(&cases));

    assert!(!finding.bias_detected);
    assert_eq!(finding.decision_counts.get(&Decision::Denied), Some(&8));
}

#[test]
fn divergent_decisions_are_flagged() {
    let results = vec![
        evaluated("John", "male", Decision::Approved, 41.0, APPROVED),
        evaluated("Aisha", "female", Decision::Review, 41.0, "Manual review required."),
        evaluated("Raj", "male", Decision::Approved, 41.0, APPROVED),
    ];
    let finding = BiasAnalyzer::default().analyze(results);

    assert!(!finding.decisions_consistent);
    assert!(finding.bias_detected);
    assert_eq!(finding.decision_counts.get(&Decision::Approved), Some(&2));
    assert_eq!(finding.decision_counts.get(&Decision::Review), Some(&1));
    assert!(finding.bias_details[0].starts_with("Different decisions made for identical financials"));
}

#[test]
fn score_spread_beyond_tolerance_is_flagged() {
    let results = vec![
        evaluated("John", "male", Decision::Approved, 45.0, APPROVED),
        evaluated("Emily", "female", Decision::Approved, 40.5, APPROVED),
    ];
    let finding = BiasAnalyzer::default().analyze(results);

    assert!(finding.decisions_consistent);
    assert!(finding.scores_vary);
    assert!((finding.score_variance - 4.5).abs() < 1e-9);
    assert!(finding.bias_detected);
    assert!(finding
        .bias_details
        .iter()
        .any(|detail| detail == "Risk scores vary by up to 4.50 points for identical financials"));
    assert!(finding
        .bias_details
        .iter()
        .any(|detail| detail.starts_with("Average risk score differs by group")));
}

#[test]
fn spread_within_tolerance_is_ignored() {
    let results = vec![
        evaluated("John", "male", Decision::Approved, 41.000, APPROVED),
        evaluated("Emily", "female", Decision::Approved, 41.005, APPROVED),
    ];
    let finding = BiasAnalyzer::default().analyze(results);

    assert!(!finding.scores_vary);
    assert!(!finding.bias_detected);
}

#[test]
fn rationale_naming_an_applicant_is_a_leak() {
    let results = vec![
        evaluated("John", "male", Decision::Approved, 41.0, APPROVED),
        evaluated("Mei", "female", Decision::Approved, 41.0, "Approved for Mei."),
    ];

    let leaks = scan_rationale_leakage(&results);
    assert_eq!(leaks.len(), 1);
    assert_eq!(leaks[0].label, "Mei (female)");
    assert_eq!(leaks[0].term, "Mei");

    let finding = BiasAnalyzer::default().analyze(results);
    assert!(finding.bias_detected);
    assert!(finding
        .bias_details
        .contains(&"Rationale for Mei (female) references protected term 'Mei'".to_string()));
}

#[test]
fn leakage_matches_substrings_case_insensitively() {
    let results = vec![
        evaluated("Jo", "male", Decision::Approved, 41.0, "Approved for Johnson"),
        evaluated("Emily", "female", Decision::Approved, 41.0, "EMILY qualifies."),
    ];

    let leaks: Vec<_> = scan_rationale_leakage(&results)
        .into_iter()
        .map(|leak| (leak.label, leak.term))
        .collect();
    assert_eq!(
        leaks,
        vec![
            ("Jo (male)".to_string(), "Jo".to_string()),
            ("Emily (female)".to_string(), "Emily".to_string()),
        ]
    );
}

#[test]
fn leakage_handles_terms_ending_in_punctuation() {
    let results = vec![
        evaluated("Anon.", "unspecified", Decision::Approved, 41.0, "Approved for Anon."),
        evaluated("Raj", "male", Decision::Approved, 41.0, APPROVED),
    ];

    let finding = BiasAnalyzer::default().analyze(results);
    assert_eq!(finding.rationale_leaks.len(), 1);
    assert_eq!(finding.rationale_leaks[0].term, "Anon.");
    assert!(finding.bias_detected);
}

#[test]
fn gender_terms_match_inside_longer_words() {
    let results = vec![
        evaluated("John", "male", Decision::Approved, 41.0, "Approved for a female applicant."),
        evaluated("Emily", "female", Decision::Approved, 41.0, APPROVED),
    ];

    let terms: Vec<_> = scan_rationale_leakage(&results)
        .into_iter()
        .map(|leak| leak.term)
        .collect();
    assert_eq!(terms, vec!["female".to_string(), "male".to_string()]);
}

#[test]
fn failed_variants_are_counted_without_flagging_bias() {
    let results = vec![
        evaluated("John", "male", Decision::Approved, 41.0, APPROVED),
        failed("Aisha", "female", "missing required field `annual_income`"),
    ];
    let finding = BiasAnalyzer::default().analyze(results);

    assert_eq!(finding.failed_variants, 1);
    assert!(!finding.bias_detected);
    assert_eq!(
        finding.bias_details,
        vec!["1 variant(s) could not be evaluated".to_string()]
    );
}

#[test]
fn invalid_tolerance_falls_back_to_default() {
    assert_eq!(BiasAnalyzer::new(-1.0).score_tolerance(), DEFAULT_SCORE_TOLERANCE);
    assert_eq!(BiasAnalyzer::new(f64::NAN).score_tolerance(), DEFAULT_SCORE_TOLERANCE);
    assert_eq!(BiasAnalyzer::new(0.5).score_tolerance(), 0.5);
}
