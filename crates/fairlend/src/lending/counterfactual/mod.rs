//! Counterfactual variant generation and batch evaluation.

mod catalog;
mod generator;
mod runner;

pub use catalog::{CatalogError, VariantCatalog, VariantSpec};
pub use generator::{generate, CounterfactualCase};
pub use runner::{EvaluationError, RunMode, TestRunner, VariantOutcome, VariantResult};
