//! Command-line interface.
//!
//! Every option that a GitHub Actions workflow would normally provide falls
//! back to the matching environment variable.

use crate::error::AppError;
use crate::models::settings::{
    DEFAULT_CALL_TIMEOUT_SECS, DEFAULT_MENTEE_WEIGHT, DEFAULT_RATE_INTERVAL_MS,
    DEFAULT_TARGET_COUNT, DEFAULT_WINDOW_DAYS, MAX_WINDOW_DAYS,
};
use crate::models::{LoadQuerySettings, PullRequestRef, RankingMode};
use crate::services::github_client::DEFAULT_API_URL;
use crate::services::{ConfigSource, GitHubClient, GitHubClientConfig, RetryPolicy};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "reviewer-assign", version)]
#[command(about = "Request pull request reviews from mentors, teammates and mentorship groups")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// GitHub token
    #[arg(long, env = "GITHUB_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// GitHub REST API base URL
    #[arg(long, env = "GITHUB_API_URL", global = true, default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Gist holding the reviewer roster
    #[arg(long, env = "REVIEWER_CONFIG_GIST", global = true)]
    pub config_gist: Option<String>,

    /// Local reviewer roster file, used instead of a gist
    #[arg(long, global = true)]
    pub config_file: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Pick reviewers for a pull request and request their review
    Assign(AssignArgs),

    /// Print the review-load breakdown of one user
    Load(LoadArgs),

    /// Fetch and validate the reviewer roster
    CheckConfig,
}

#[derive(Debug, Args)]
pub struct AssignArgs {
    /// Repository as owner/name
    #[arg(long, env = "GITHUB_REPOSITORY")]
    pub repo: String,

    /// Pull request number; read from the workflow event payload when omitted
    #[arg(long)]
    pub pr: Option<u64>,

    /// Workflow event payload
    #[arg(long, env = "GITHUB_EVENT_PATH", hide = true)]
    pub event_path: Option<PathBuf>,

    /// Number of reviewers the pull request should end up with
    #[arg(long, env = "REVIEWER_COUNT", default_value_t = DEFAULT_TARGET_COUNT)]
    pub reviewers: usize,

    /// How candidates are ordered within a tier
    #[arg(long, value_enum, default_value_t = RankingMode::Ranked)]
    pub mode: RankingMode,

    /// Seed for random mode
    #[arg(long)]
    pub seed: Option<u64>,

    /// Select reviewers but do not request them
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub query: QueryArgs,
}

#[derive(Debug, Args)]
pub struct LoadArgs {
    /// User whose load is estimated
    pub user: String,

    /// Repository as owner/name; its owner is the default organization
    #[arg(long, env = "GITHUB_REPOSITORY")]
    pub repo: Option<String>,

    #[command(flatten)]
    pub query: QueryArgs,
}

/// Options shared by every command that runs load queries.
#[derive(Debug, Clone, Args)]
pub struct QueryArgs {
    /// Organization to search; defaults to the repository owner
    #[arg(long)]
    pub org: Option<String>,

    /// Activity window in days
    #[arg(long, default_value_t = DEFAULT_WINDOW_DAYS)]
    pub window_days: i64,

    /// Weight of review load driven by the user's mentees
    #[arg(long, default_value_t = DEFAULT_MENTEE_WEIGHT)]
    pub mentee_weight: f64,

    /// Ignore pull requests carrying this label (repeatable)
    #[arg(long = "exclude-label")]
    pub exclude_labels: Vec<String>,

    /// Ignore pull requests by this author, in addition to the default bots (repeatable)
    #[arg(long = "exclude-author")]
    pub exclude_authors: Vec<String>,

    /// Minimum spacing between search calls, in milliseconds
    #[arg(long, default_value_t = DEFAULT_RATE_INTERVAL_MS)]
    pub rate_interval_ms: u64,

    /// Deadline for a single GitHub call, in seconds
    #[arg(long, default_value_t = DEFAULT_CALL_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Attempts per call before giving up on transient failures
    #[arg(long, default_value_t = 3)]
    pub max_attempts: u32,
}

impl Cli {
    /// Where the roster document is read from.
    pub fn config_source(&self) -> Result<ConfigSource, AppError> {
        ConfigSource::from_options(self.config_gist.clone(), self.config_file.clone())
    }

    /// Like [`Cli::config_source`], but `None` when no roster option was given.
    pub fn optional_config_source(&self) -> Result<Option<ConfigSource>, AppError> {
        if self.config_gist.is_none() && self.config_file.is_none() {
            return Ok(None);
        }
        self.config_source().map(Some)
    }

    /// Build the GitHub client; fails without a token.
    pub fn client(&self, timeout_secs: u64) -> Result<GitHubClient, AppError> {
        let token = self
            .token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AppError::authentication("a GitHub token is required (--token or GITHUB_TOKEN)"))?;

        GitHubClient::new(GitHubClientConfig {
            base_url: self.api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            timeout_secs,
        })
    }
}

impl AssignArgs {
    /// The pull request to work on.
    pub fn pull_request(&self) -> Result<PullRequestRef, AppError> {
        let number = match (self.pr, &self.event_path) {
            (Some(number), _) => number,
            (None, Some(path)) => pr_number_from_event(path)?,
            (None, None) => {
                return Err(AppError::invalid_input_field(
                    "a pull request number is required (--pr or GITHUB_EVENT_PATH)",
                    "pr",
                ))
            }
        };
        PullRequestRef::from_slug(&self.repo, number)
    }
}

impl QueryArgs {
    /// Search settings, scoped to `org` or else `fallback_org`.
    pub fn load_settings(&self, fallback_org: Option<&str>) -> Result<LoadQuerySettings, AppError> {
        let org = self
            .org
            .as_deref()
            .or(fallback_org)
            .filter(|o| !o.trim().is_empty())
            .ok_or_else(|| AppError::invalid_input_field("an organization is required", "org"))?;

        if !(0..=MAX_WINDOW_DAYS).contains(&self.window_days) {
            return Err(AppError::invalid_input_field(
                format!("window must be between 0 and {} days", MAX_WINDOW_DAYS),
                "window-days",
            ));
        }
        if !self.mentee_weight.is_finite() {
            return Err(AppError::invalid_input_field(
                "mentee weight must be a finite number",
                "mentee-weight",
            ));
        }

        let mut settings = LoadQuerySettings::new(org);
        settings.window_days = self.window_days;
        settings.mentee_weight = self.mentee_weight;
        settings.excluded_labels = self.exclude_labels.clone();
        for author in &self.exclude_authors {
            if !settings.excluded_authors.contains(author) {
                settings.excluded_authors.push(author.clone());
            }
        }
        Ok(settings)
    }

    pub fn retry(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            ..RetryPolicy::default()
        }
    }

    pub fn rate_interval(&self) -> Duration {
        Duration::from_millis(self.rate_interval_ms)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize)]
struct EventPayload {
    pull_request: Option<EventPullRequest>,
    number: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct EventPullRequest {
    number: u64,
}

/// Pull request number from a workflow event payload.
pub fn pr_number_from_event(path: &Path) -> Result<u64, AppError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        AppError::invalid_input_field(
            format!("Failed to read event payload {}: {}", path.display(), e),
            "pr",
        )
    })?;
    parse_event_payload(&content)
}

fn parse_event_payload(content: &str) -> Result<u64, AppError> {
    let payload: EventPayload = serde_json::from_str(content)
        .map_err(|e| AppError::invalid_input_field(format!("Malformed event payload: {}", e), "pr"))?;

    payload
        .pull_request
        .map(|pr| pr.number)
        .or(payload.number)
        .ok_or_else(|| {
            AppError::invalid_input_field("event payload does not reference a pull request", "pr")
        })
}
