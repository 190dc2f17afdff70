use chrono::{DateTime, Utc};
use clap::Args;
use fairlend::config::{AppConfig, ConfigError};
use fairlend::error::AppError;
use fairlend::lending::prompt::parse_prompt;
use fairlend::lending::report::{render_bias_report, render_mitigation_report, write_results_csv};
use fairlend::lending::{
    BiasTestOptions, BiasTestReport, Comparison, DecisionResult, LendingError, LendingService,
    RunMode, VariantCatalog,
};
use fairlend::telemetry;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;

/// Financial fields accepted on the command line. Unset flags are left out of the payload.
#[derive(Args, Debug, Default, Clone)]
pub(crate) struct FinancialArgs {
    /// Credit score (300-850)
    #[arg(long)]
    pub(crate) credit_score: Option<u16>,
    /// Annual income in dollars
    #[arg(long, visible_alias = "income")]
    pub(crate) annual_income: Option<f64>,
    /// Requested loan amount in dollars
    #[arg(long)]
    pub(crate) loan_amount: Option<f64>,
    /// Debt-to-income ratio as a fraction (0.28 = 28%)
    #[arg(long = "dti", visible_alias = "debt-to-income-ratio")]
    pub(crate) debt_to_income_ratio: Option<f64>,
    /// Years at current employer
    #[arg(long = "employment-years")]
    pub(crate) employment_length_years: Option<f64>,
    /// Delinquencies in the last 24 months
    #[arg(long = "delinquencies")]
    pub(crate) delinquencies_24m: Option<u32>,
    /// Length of credit history in years
    #[arg(long)]
    pub(crate) credit_history_years: Option<f64>,
}

impl FinancialArgs {
    fn to_payload(&self) -> Map<String, Value> {
        let fields = [
            ("credit_score", self.credit_score.map(f64::from)),
            ("annual_income", self.annual_income),
            ("loan_amount", self.loan_amount),
            ("debt_to_income_ratio", self.debt_to_income_ratio),
            ("employment_length_years", self.employment_length_years),
            ("delinquencies_24m", self.delinquencies_24m.map(f64::from)),
            ("credit_history_years", self.credit_history_years),
        ];

        fields
            .into_iter()
            .filter_map(|(field, value)| value.map(|value| (field.to_string(), json!(value))))
            .collect()
    }
}

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    #[command(flatten)]
    pub(crate) financials: FinancialArgs,
    /// Applicant name (recorded, never used by the decision)
    #[arg(long)]
    pub(crate) name: Option<String>,
    /// Applicant gender (recorded, never used by the decision)
    #[arg(long)]
    pub(crate) gender: Option<String>,
    /// Free-text loan request to extract the application from
    #[arg(
        long,
        conflicts_with_all = [
            "credit_score",
            "annual_income",
            "loan_amount",
            "debt_to_income_ratio",
            "employment_length_years",
            "delinquencies_24m",
            "credit_history_years",
        ]
    )]
    pub(crate) prompt: Option<String>,
    /// Print the decision as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct BiasTestArgs {
    /// Overrides applied to the standard base profile
    #[command(flatten)]
    pub(crate) financials: FinancialArgs,
    /// JSON variant catalog to use instead of the configured one
    #[arg(long)]
    pub(crate) catalog: Option<PathBuf>,
    /// Route every variant through the free-text request parser
    #[arg(long)]
    pub(crate) via_prompt: bool,
    /// Evaluate variants on the rayon thread pool
    #[arg(long)]
    pub(crate) parallel: bool,
    /// Write the full finding as JSON
    #[arg(long)]
    pub(crate) results_json: Option<PathBuf>,
    /// Write one CSV row per variant
    #[arg(long)]
    pub(crate) results_csv: Option<PathBuf>,
    /// Write the mitigation strategies report
    #[arg(long)]
    pub(crate) mitigation_report: Option<PathBuf>,
}

impl BiasTestArgs {
    pub(crate) fn options(&self) -> BiasTestOptions {
        BiasTestOptions {
            mode: if self.via_prompt {
                RunMode::Prompt
            } else {
                RunMode::Structured
            },
            parallel: self.parallel,
        }
    }
}

pub(crate) fn run_evaluate(args: EvaluateArgs) -> Result<ExitCode, AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    let service = config.lending.service()?;

    let result = evaluate(&service, &args)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", render_decision(&result));
    }
    Ok(ExitCode::SUCCESS)
}

pub(crate) fn run_bias_test(args: BiasTestArgs) -> Result<ExitCode, AppError> {
    let mut config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    if let Some(path) = &args.catalog {
        config.lending.catalog = VariantCatalog::from_path(path).map_err(ConfigError::Catalog)?;
    }
    let service = config.lending.service()?;

    let report = bias_test(&service, &args)?;
    println!(
        "{}",
        render_bias_report(&report.base_financials, &report.finding)
    );
    for line in write_exports(&service, &report, &args)? {
        println!("{line}");
    }

    if report.finding.bias_detected {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn evaluate(service: &LendingService, args: &EvaluateArgs) -> Result<DecisionResult, AppError> {
    if let Some(prompt) = &args.prompt {
        let range = service.engine().thresholds().credit_score_range;
        let application = parse_prompt(prompt, range).map_err(LendingError::from)?;
        return Ok(service.evaluate(&application)?);
    }

    let mut payload = args.financials.to_payload();
    if let Some(name) = &args.name {
        payload.insert("applicant_name".to_string(), json!(name));
    }
    if let Some(gender) = &args.gender {
        payload.insert("gender".to_string(), json!(gender));
    }
    Ok(service.evaluate_payload(&Value::Object(payload))?)
}

fn bias_test(service: &LendingService, args: &BiasTestArgs) -> Result<BiasTestReport, AppError> {
    let overrides = args.financials.to_payload();
    let overrides = (!overrides.is_empty()).then_some(Value::Object(overrides));
    Ok(service.bias_test(overrides.as_ref(), args.options())?)
}

#[derive(Serialize)]
struct ResultsArchive<'a> {
    generated_at: DateTime<Utc>,
    #[serde(flatten)]
    report: &'a BiasTestReport,
}

/// Write every requested artifact; returns one confirmation line per file.
fn write_exports(
    service: &LendingService,
    report: &BiasTestReport,
    args: &BiasTestArgs,
) -> Result<Vec<String>, AppError> {
    let mut written = Vec::new();

    if let Some(path) = &args.results_json {
        let archive = ResultsArchive {
            generated_at: Utc::now(),
            report,
        };
        serde_json::to_writer_pretty(File::create(path)?, &archive)?;
        written.push(format!("Results saved to: {}", path.display()));
    }

    if let Some(path) = &args.results_csv {
        write_results_csv(File::create(path)?, &report.finding.per_variant_results)?;
        written.push(format!("Per-variant results saved to: {}", path.display()));
    }

    if let Some(path) = &args.mitigation_report {
        let text = render_mitigation_report(&report.finding, &service.advisor().catalog());
        std::fs::write(path, text)?;
        written.push(format!("Mitigation report saved to: {}", path.display()));
    }

    Ok(written)
}

fn render_decision(result: &DecisionResult) -> String {
    let mut out = vec![
        format!("Decision: {}", result.decision),
        format!("Risk Score: {:.2}/100", result.risk_score),
        format!("Rationale: {}", result.rationale),
        "Criteria:".to_string(),
    ];

    for (criterion, check) in &result.details {
        let bound = match check.comparison {
            Comparison::AtLeast => "minimum",
            Comparison::AtMost => "maximum",
        };
        out.push(format!(
            "  {:<24} {:>10} ({bound} {}) {}",
            criterion.key(),
            format!("{:.2}", check.measured),
            check.threshold,
            if check.passed { "PASS" } else { "FAIL" }
        ));
    }
    out.join("\n")
}
