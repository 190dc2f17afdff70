use crate::commands::{run_bias_test, run_evaluate, BiasTestArgs, EvaluateArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use fairlend::error::AppError;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "fairlend",
    about = "Evaluate loan applications and run counterfactual bias tests",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Evaluate a single application from flags or a free-text request
    Evaluate(EvaluateArgs),
    /// Run the counterfactual name/gender bias test; exits 1 when bias is detected
    BiasTest(BiasTestArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<ExitCode, AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await.map(|_| ExitCode::SUCCESS),
        Command::Evaluate(args) => run_evaluate(args),
        Command::BiasTest(args) => run_bias_test(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fairlend::lending::RunMode;

    #[test]
    fn defaults_to_serve_without_subcommand() {
        let cli = Cli::try_parse_from(["fairlend"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_bias_test_flags() {
        let cli = Cli::try_parse_from([
            "fairlend",
            "bias-test",
            "--credit-score",
            "600",
            "--dti",
            "0.5",
            "--via-prompt",
            "--parallel",
            "--results-csv",
            "results.csv",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::BiasTest(args)) => {
                assert_eq!(args.financials.credit_score, Some(600));
                assert_eq!(args.financials.debt_to_income_ratio, Some(0.5));
                assert_eq!(args.options().mode, RunMode::Prompt);
                assert!(args.options().parallel);
                assert_eq!(
                    args.results_csv.as_deref(),
                    Some(std::path::Path::new("results.csv"))
                );
            }
            other => panic!("expected bias-test command, got {other:?}"),
        }
    }

    #[test]
    fn prompt_conflicts_with_financial_flags() {
        let parsed = Cli::try_parse_from([
            "fairlend",
            "evaluate",
            "--prompt",
            "Should we approve a $5,000 personal loan?",
            "--credit-score",
            "700",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn parses_serve_overrides() {
        let cli = Cli::try_parse_from(["fairlend", "serve", "--port", "8080"]).expect("parses");
        match cli.command {
            Some(Command::Serve(args)) => {
                assert_eq!(args.port, Some(8080));
                assert!(args.host.is_none());
            }
            other => panic!("expected serve command, got {other:?}"),
        }
    }
}
