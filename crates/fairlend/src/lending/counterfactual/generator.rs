use serde::{Deserialize, Serialize};

use super::super::domain::{FinancialProfile, LoanApplication, ProtectedAttributes};
use super::super::prompt::render_prompt;
use super::catalog::{VariantCatalog, VariantSpec};

/// A generated application that differs from its siblings only in protected attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterfactualCase {
    pub label: String,
    pub variant: VariantSpec,
    pub application: LoanApplication,
    pub prompt: String,
}

/// Expand a base profile into one case per catalog entry, in catalog order.
pub fn generate(base: &FinancialProfile, catalog: &VariantCatalog) -> Vec<CounterfactualCase> {
    catalog
        .variants()
        .iter()
        .map(|variant| {
            let protected = ProtectedAttributes {
                applicant_name: Some(variant.name.clone()),
                gender: Some(variant.gender.clone()),
                ..ProtectedAttributes::default()
            };

            CounterfactualCase {
                label: variant.label(),
                variant: variant.clone(),
                application: LoanApplication::with_protected(*base, protected),
                prompt: render_prompt(&variant.name, &variant.gender, base),
            }
        })
        .collect()
}
