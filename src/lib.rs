//! Reviewer Assign - picks pull request reviewers from a team roster.
//!
//! Reviewers are chosen in tiers (the author's mentor, then teammates, then
//! the mentorship group), ranked by recent review load, and requested
//! through the GitHub API.

pub mod cli;
pub mod commands;
pub mod error;
pub mod models;
pub mod services;

use clap::Parser;
use cli::{Cli, OutputFormat};
use error::AppError;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Entry point of the `reviewer-assign` binary.
pub fn run() -> ExitCode {
    // Logs go to stderr so stdout stays machine-readable.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init()
        .ok();

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            return report(
                &cli,
                &AppError::internal(format!("Failed to start runtime: {}", e)),
            )
        }
    };

    match runtime.block_on(commands::dispatch(&cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(&cli, &e),
    }
}

/// Single handling point for a failed run.
fn report(cli: &Cli, error: &AppError) -> ExitCode {
    log::error!("{}", error);

    if std::env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true") {
        println!("::error::{}", annotation(error));
    }
    if cli.format == OutputFormat::Json {
        if let Ok(json) = serde_json::to_string_pretty(error) {
            println!("{}", json);
        }
    }
    ExitCode::FAILURE
}

/// Workflow command payloads must stay on one line.
fn annotation(error: &AppError) -> String {
    error
        .to_string()
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotation_is_single_line() {
        let error = AppError::config_parse("bad roster\nline 2: 100%");
        let text = annotation(&error);
        assert!(!text.contains('\n'));
        assert!(text.ends_with("bad roster%0Aline 2: 100%25"));
    }
}
