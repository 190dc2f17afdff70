use std::fmt;

use serde::Serialize;

use super::bias::BiasFinding;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub const fn label(self) -> &'static str {
        match self {
            Priority::High => "HIGH",
            Priority::Medium => "MEDIUM",
            Priority::Low => "LOW",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Constant remediation guidance attached to a finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub priority: Priority,
    pub category: &'static str,
    pub strategy: &'static str,
    pub description: &'static str,
    pub steps: &'static [&'static str],
}

const CATALOG: [Recommendation; 7] = [
    Recommendation {
        priority: Priority::High,
        category: "Policy & Prompting",
        strategy: "Explicit Constraint Enforcement",
        description: "Forbid the use of protected attributes anywhere in the decision path",
        steps: &[
            "State in every decision policy that only the listed financial factors may be used",
            "Reject requests that ask for protected attributes to be considered",
            "Ignore protected attributes when they are present in an application",
        ],
    },
    Recommendation {
        priority: Priority::High,
        category: "Data & Modeling",
        strategy: "Feature Engineering",
        description: "Remove protected attributes and known proxies from decision inputs",
        steps: &[
            "Audit inputs for direct protected attributes and proxies such as ZIP code or name-derived features",
            "Validate the input feature list in the preprocessing pipeline",
            "Augment test data with counterfactual copies that swap names and pronouns",
        ],
    },
    Recommendation {
        priority: Priority::High,
        category: "Evaluation & Monitoring",
        strategy: "Counterfactual Testing in CI",
        description: "Run counterfactual bias tests on every change",
        steps: &[
            "Keep a suite of identical financial profiles with varied names and genders",
            "Fail the build when decisions differ or scores vary by more than 0.01",
            "Run the suite on every code and policy change",
        ],
    },
    Recommendation {
        priority: Priority::Medium,
        category: "Evaluation & Monitoring",
        strategy: "Fairness-Aware Monitoring",
        description: "Track group-wise outcomes in production",
        steps: &[
            "Track approval rates and average scores by group",
            "Alert on disparate impact and score distribution shifts",
            "Schedule recurring bias audits",
        ],
    },
    Recommendation {
        priority: Priority::Medium,
        category: "Implementation Controls",
        strategy: "Standardized Rationale Generation",
        description: "Generate rationales from templates that reference only allowed factors",
        steps: &[
            "Build rationales from thresholds and measured financial values only",
            "Prohibit free-form rationale text",
            "Scan rationales for protected terms before they are returned",
        ],
    },
    Recommendation {
        priority: Priority::Low,
        category: "Governance",
        strategy: "Appeals Process",
        description: "Give applicants a path to contest a decision",
        steps: &[
            "Explain decisions on request",
            "Route appeals that allege bias to human review",
            "Track appeal outcomes by group to surface patterns",
        ],
    },
    Recommendation {
        priority: Priority::Low,
        category: "Governance",
        strategy: "Governance Documentation",
        description: "Document decision policy, excluded attributes and fairness checks",
        steps: &[
            "Publish which factors are used and why protected attributes are excluded",
            "Keep audit logs of decisions for regulatory review",
            "Review fairness measures with legal counsel periodically",
        ],
    },
];

/// Maps findings to the fixed recommendation catalog.
#[derive(Debug, Clone, Copy, Default)]
pub struct MitigationAdvisor;

impl MitigationAdvisor {
    /// Full catalog ordered by priority.
    pub fn catalog(&self) -> Vec<Recommendation> {
        let mut catalog = CATALOG.to_vec();
        catalog.sort_by_key(|recommendation| recommendation.priority);
        catalog
    }

    /// No recommendations for a clean finding; the whole catalog otherwise.
    pub fn advise(&self, finding: &BiasFinding) -> Vec<Recommendation> {
        if finding.bias_detected {
            self.catalog()
        } else {
            Vec::new()
        }
    }
}
