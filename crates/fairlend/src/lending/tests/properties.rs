use proptest::prelude::*;

use super::common::*;
use crate::lending::domain::{FinancialProfile, LoanApplication};

fn profiles() -> impl Strategy<Value = FinancialProfile> {
    (
        300u16..=850,
        1_000.0f64..500_000.0,
        100.0f64..200_000.0,
        0.0f64..=1.0,
        0.0f64..40.0,
        0u32..10,
        0.0f64..50.0,
    )
        .prop_map(
            |(
                credit_score,
                annual_income,
                loan_amount,
                debt_to_income_ratio,
                employment_length_years,
                delinquencies_24m,
                credit_history_years,
            )| FinancialProfile {
                credit_score,
                annual_income,
                loan_amount,
                debt_to_income_ratio,
                employment_length_years,
                delinquencies_24m,
                credit_history_years,
            },
        )
}

fn variants() -> impl Strategy<Value = (String, String)> {
    (
        "[A-Z][a-z]{2,8}",
        prop::sample::select(vec!["male", "female", "non-binary", "unspecified"]),
    )
        .prop_map(|(name, gender)| (name, gender.to_string()))
}

proptest! {
    #[test]
    fn protected_attributes_never_change_the_result(
        profile in profiles(),
        (first_name, first_gender) in variants(),
        (second_name, second_gender) in variants(),
    ) {
        let engine = engine();
        let first = engine
            .evaluate(&applicant(profile, &first_name, &first_gender))
            .expect("generated profiles are valid");
        let second = engine
            .evaluate(&applicant(profile, &second_name, &second_gender))
            .expect("generated profiles are valid");
        prop_assert_eq!(first, second);
    }

    #[test]
    fn risk_score_stays_within_bounds(profile in profiles()) {
        let result = engine()
            .evaluate(&LoanApplication::new(profile))
            .expect("generated profiles are valid");
        prop_assert!((0.0..=100.0).contains(&result.risk_score));
    }

    #[test]
    fn evaluation_is_idempotent(profile in profiles()) {
        let engine = engine();
        let application = LoanApplication::new(profile);
        let first = engine.evaluate(&application).expect("generated profiles are valid");
        let second = engine.evaluate(&application).expect("generated profiles are valid");
        prop_assert_eq!(first, second);
    }

    #[test]
    fn lower_dti_never_lowers_the_score(profile in profiles(), delta in 0.0f64..0.5) {
        let engine = engine();
        let improved = FinancialProfile {
            debt_to_income_ratio: (profile.debt_to_income_ratio - delta).max(0.0),
            ..profile
        };
        let base = engine
            .evaluate(&LoanApplication::new(profile))
            .expect("generated profiles are valid");
        let better = engine
            .evaluate(&LoanApplication::new(improved))
            .expect("generated profiles are valid");
        prop_assert!(better.risk_score >= base.risk_score);
    }
}
