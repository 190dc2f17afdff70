//! Loan eligibility decisions and counterfactual bias testing.
//!
//! The [`lending`] module hosts the decision engine and the bias-testing pipeline; the remaining
//! modules carry the service plumbing shared with the API binary.

pub mod config;
pub mod error;
pub mod lending;
pub mod telemetry;
