//! CLI command handlers.
//!
//! Commands are organized by functionality:
//! - `assign`: pick and request reviewers for one pull request
//! - `load`: print one user's review-load breakdown
//! - `config`: fetch and validate the reviewer roster

pub mod assign;
pub mod config;
pub mod load;

use crate::cli::{Cli, Commands, OutputFormat};
use crate::error::AppError;
use serde::Serialize;

/// Run the command selected on the command line.
pub async fn dispatch(cli: &Cli) -> Result<(), AppError> {
    match &cli.command {
        Commands::Assign(args) => assign::execute(cli, args).await,
        Commands::Load(args) => load::execute(cli, args).await,
        Commands::CheckConfig => config::execute(cli).await,
    }
}

/// Print `value` on stdout in the requested format.
pub(crate) fn emit<T: Serialize>(
    format: OutputFormat,
    value: &T,
    render_text: impl FnOnce(&T) -> String,
) -> Result<(), AppError> {
    match format {
        OutputFormat::Text => println!("{}", render_text(value)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}
