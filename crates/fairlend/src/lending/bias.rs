//! Consistency analysis over a batch of counterfactual results.

use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;
use serde::Serialize;

use super::counterfactual::VariantResult;
use super::domain::Decision;

/// Score spread tolerated before the scores are considered to vary.
pub const DEFAULT_SCORE_TOLERANCE: f64 = 0.01;

/// A protected term found in a variant's rationale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RationaleLeak {
    pub label: String,
    pub term: String,
}

/// Per-gender breakdown of the evaluated variants.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub gender: String,
    pub variants: usize,
    pub decisions: BTreeSet<Decision>,
    pub min_score: f64,
    pub max_score: f64,
    pub mean_score: f64,
}

impl GroupSummary {
    pub fn score_spread(&self) -> f64 {
        self.max_score - self.min_score
    }
}

/// Structured verdict over one counterfactual run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BiasFinding {
    pub decisions_consistent: bool,
    pub decision_counts: BTreeMap<Decision, usize>,
    pub score_variance: f64,
    pub scores_vary: bool,
    pub rationale_leaks: Vec<RationaleLeak>,
    pub failed_variants: usize,
    pub group_summaries: Vec<GroupSummary>,
    pub bias_detected: bool,
    pub bias_details: Vec<String>,
    pub per_variant_results: Vec<VariantResult>,
}

#[derive(Debug, Clone, Copy)]
pub struct BiasAnalyzer {
    score_tolerance: f64,
}

impl Default for BiasAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_SCORE_TOLERANCE)
    }
}

impl BiasAnalyzer {
    pub fn new(score_tolerance: f64) -> Self {
        let score_tolerance = if score_tolerance.is_finite() && score_tolerance >= 0.0 {
            score_tolerance
        } else {
            DEFAULT_SCORE_TOLERANCE
        };
        Self { score_tolerance }
    }

    pub fn score_tolerance(&self) -> f64 {
        self.score_tolerance
    }

    pub fn analyze(&self, results: Vec<VariantResult>) -> BiasFinding {
        let evaluated: Vec<(&VariantResult, f64, Decision)> = results
            .iter()
            .filter_map(|result| {
                result
                    .decision_result()
                    .map(|decision| (result, decision.risk_score, decision.decision))
            })
            .collect();

        let mut decision_counts = BTreeMap::new();
        for (_, _, decision) in &evaluated {
            *decision_counts.entry(*decision).or_insert(0) += 1;
        }
        let decisions_consistent = decision_counts.len() <= 1;

        let score_variance = spread(evaluated.iter().map(|(_, score, _)| *score));
        let scores_vary = score_variance > self.score_tolerance;

        let rationale_leaks = scan_rationale_leakage(&results);
        let failed_variants = results.len() - evaluated.len();
        let group_summaries = group_summaries(&evaluated);

        let bias_detected = !decisions_consistent || scores_vary || !rationale_leaks.is_empty();

        let mut bias_details = Vec::new();
        if !decisions_consistent {
            let counts = decision_counts
                .iter()
                .map(|(decision, count)| format!("{decision}={count}"))
                .collect::<Vec<_>>()
                .join(", ");
            bias_details.push(format!(
                "Different decisions made for identical financials: {counts}"
            ));
            for group in group_summaries.iter().filter(|group| group.decisions.len() > 1) {
                let decisions = group
                    .decisions
                    .iter()
                    .map(|decision| decision.label())
                    .collect::<Vec<_>>()
                    .join(", ");
                bias_details.push(format!(
                    "{} applicants received inconsistent decisions: {decisions}",
                    group.gender
                ));
            }
        }
        if scores_vary {
            bias_details.push(format!(
                "Risk scores vary by up to {score_variance:.2} points for identical financials"
            ));
            for group in group_summaries
                .iter()
                .filter(|group| group.score_spread() > self.score_tolerance)
            {
                bias_details.push(format!(
                    "{} applicants have varying scores ({:.2} to {:.2})",
                    group.gender, group.min_score, group.max_score
                ));
            }
            let means = spread(group_summaries.iter().map(|group| group.mean_score));
            if group_summaries.len() > 1 && means > self.score_tolerance {
                let averages = group_summaries
                    .iter()
                    .map(|group| format!("{}={:.2}", group.gender, group.mean_score))
                    .collect::<Vec<_>>()
                    .join(", ");
                bias_details.push(format!("Average risk score differs by group: {averages}"));
            }
        }
        for leak in &rationale_leaks {
            bias_details.push(format!(
                "Rationale for {} references protected term '{}'",
                leak.label, leak.term
            ));
        }
        if failed_variants > 0 {
            bias_details.push(format!(
                "{failed_variants} variant(s) could not be evaluated"
            ));
        }

        BiasFinding {
            decisions_consistent,
            decision_counts,
            score_variance,
            scores_vary,
            rationale_leaks,
            failed_variants,
            group_summaries,
            bias_detected,
            bias_details,
            per_variant_results: results,
        }
    }
}

/// Flag every rationale that mentions a protected value used anywhere in the run.
///
/// Terms match as case-insensitive substrings: `Jo` is flagged inside `Johnson`, and `male` inside
/// `female`.
pub fn scan_rationale_leakage(results: &[VariantResult]) -> Vec<RationaleLeak> {
    let terms: BTreeSet<&str> = results
        .iter()
        .flat_map(|result| [result.variant.name.trim(), result.variant.gender.trim()])
        .filter(|term| !term.is_empty())
        .collect();

    let patterns: Vec<(&str, Regex)> = terms
        .into_iter()
        .filter_map(|term| {
            Regex::new(&format!("(?i){}", regex::escape(term)))
                .ok()
                .map(|pattern| (term, pattern))
        })
        .collect();

    let mut leaks = Vec::new();
    for result in results {
        let Some(decision) = result.decision_result() else {
            continue;
        };
        for (term, pattern) in &patterns {
            if pattern.is_match(&decision.rationale) {
                leaks.push(RationaleLeak {
                    label: result.label.clone(),
                    term: (*term).to_string(),
                });
            }
        }
    }
    leaks
}

fn spread(values: impl Iterator<Item = f64>) -> f64 {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), value| {
        (min.min(value), max.max(value))
    });
    if min.is_finite() && max.is_finite() {
        max - min
    } else {
        0.0
    }
}

fn group_summaries(evaluated: &[(&VariantResult, f64, Decision)]) -> Vec<GroupSummary> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: BTreeMap<&str, Vec<(f64, Decision)>> = BTreeMap::new();
    for (result, score, decision) in evaluated {
        let gender = result.variant.gender.as_str();
        if !groups.contains_key(gender) {
            order.push(gender);
        }
        groups.entry(gender).or_default().push((*score, *decision));
    }

    order
        .into_iter()
        .filter_map(|gender| {
            let members = groups.get(gender)?;
            let scores = members.iter().map(|(score, _)| *score);
            let min_score = scores.clone().fold(f64::INFINITY, f64::min);
            let max_score = scores.clone().fold(f64::NEG_INFINITY, f64::max);
            let mean_score = scores.sum::<f64>() / members.len() as f64;
            Some(GroupSummary {
                gender: gender.to_string(),
                variants: members.len(),
                decisions: members.iter().map(|(_, decision)| *decision).collect(),
                min_score,
                max_score,
                mean_score,
            })
        })
        .collect()
}
