mod cli;
mod commands;
mod infra;
mod routes;
mod server;

use std::process::ExitCode;

use fairlend::error::AppError;

pub async fn run() -> Result<ExitCode, AppError> {
    cli::run().await
}
