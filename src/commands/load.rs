//! `load` command.

use crate::cli::{Cli, LoadArgs};
use crate::error::AppError;
use crate::models::{LoadBreakdown, ReviewerConfig};
use crate::services::config_store;
use crate::services::{LoadEstimator, RateLimiter};
use chrono::Utc;

/// Estimate and print the review load of one user.
///
/// The roster is consulted for the user's mentees when one is configured;
/// without it no mentee discount is applied.
pub async fn execute(cli: &Cli, args: &LoadArgs) -> Result<(), AppError> {
    let owner = args
        .repo
        .as_deref()
        .and_then(|slug| slug.split_once('/'))
        .map(|(owner, _)| owner);
    let settings = args.query.load_settings(owner)?;
    let retry = args.query.retry();
    let client = cli.client(args.query.timeout_secs)?;

    let config = match cli.optional_config_source()? {
        Some(source) => config_store::load_config(&client, &source, &retry).await?,
        None => {
            log::info!("[load] no roster configured, mentee discount disabled");
            ReviewerConfig::default()
        }
    };

    let limiter = RateLimiter::start(args.query.rate_interval());
    let estimator = LoadEstimator::new(
        &client,
        &limiter,
        &config,
        &settings,
        Utc::now().date_naive(),
    )
    .with_retry(retry)
    .with_call_timeout(args.query.call_timeout());

    let breakdown = estimator.estimate(&args.user).await?;
    super::emit(cli.format, &breakdown, render)
}

/// Human-readable load breakdown.
pub fn render(load: &LoadBreakdown) -> String {
    let mut lines = vec![
        format!("{}: score {}", load.username, load.score()),
        format!("  requested: {}", load.requested),
        format!("  reviewed:  {}", load.reviewed),
    ];
    if !load.mentees.is_empty() {
        lines.push(format!(
            "  mentees ({}): requested {}, reviewed {}, weight {}",
            load.mentees.join(", "),
            load.mentee_requested,
            load.mentee_reviewed,
            load.mentee_weight
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_with_mentees() {
        let load = LoadBreakdown {
            username: "alice".into(),
            requested: 3,
            reviewed: 5,
            mentees: vec!["bob".into()],
            mentee_requested: 2,
            mentee_reviewed: 2,
            mentee_weight: 0.5,
        };
        let text = render(&load);
        assert!(text.starts_with("alice: score 6"));
        assert!(text.contains("mentees (bob): requested 2, reviewed 2, weight 0.5"));
    }

    #[test]
    fn test_render_without_mentees() {
        let load = LoadBreakdown {
            username: "carol".into(),
            requested: 1,
            reviewed: 0,
            mentees: vec![],
            mentee_requested: 0,
            mentee_reviewed: 0,
            mentee_weight: 0.5,
        };
        assert_eq!(render(&load).lines().count(), 3);
    }
}
