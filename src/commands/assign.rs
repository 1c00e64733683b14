//! `assign` command.

use crate::cli::{AssignArgs, Cli};
use crate::error::AppError;
use crate::services::{assign_reviewers, AssignRequest, Collaborators, RunOutcome};
use chrono::Utc;

/// Assign reviewers to the pull request named on the command line.
pub async fn execute(cli: &Cli, args: &AssignArgs) -> Result<(), AppError> {
    let pull_request = args.pull_request()?;
    let load = args.query.load_settings(Some(&pull_request.owner))?;

    let request = AssignRequest {
        config_source: cli.config_source()?,
        target_count: args.reviewers,
        mode: args.mode,
        seed: args.seed,
        load,
        rate_interval: args.query.rate_interval(),
        call_timeout: args.query.call_timeout(),
        retry: args.query.retry(),
        dry_run: args.dry_run,
        today: Utc::now().date_naive(),
        pull_request,
    };

    let client = cli.client(args.query.timeout_secs)?;
    let apis = Collaborators {
        documents: &client,
        search: &client,
        pull_requests: &client,
    };

    log::info!(
        "[assign] {} in {} mode, target {} reviewer(s)",
        request.pull_request,
        request.mode,
        request.target_count
    );
    let outcome = assign_reviewers(&request, &apis).await?;
    super::emit(cli.format, &outcome, render)
}

/// Human-readable summary of a run.
pub fn render(outcome: &RunOutcome) -> String {
    match outcome {
        RunOutcome::SkippedDraft => "Pull request is a draft; no reviewers requested.".to_string(),
        RunOutcome::AlreadySatisfied { involved } => format!(
            "Already has {} reviewer(s): {}",
            involved.len(),
            involved.join(", ")
        ),
        RunOutcome::NoCandidates { .. } => "No eligible reviewers found.".to_string(),
        RunOutcome::Requested {
            reviewers, dry_run, ..
        } => {
            let verb = if *dry_run { "Would request" } else { "Requested" };
            let mut lines = vec![format!("{} review from:", verb)];
            for candidate in reviewers {
                lines.push(format!("  {} ({})", candidate.username, candidate.tier));
            }
            lines.join("\n")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Candidate, Rank, Tier};

    #[test]
    fn test_render_requested() {
        let outcome = RunOutcome::Requested {
            involved: vec![],
            reviewers: vec![
                Candidate::mentor("mallory"),
                Candidate {
                    username: "alice".into(),
                    tier: Tier::Team,
                    rank: Rank::Load(2.0),
                },
            ],
            dry_run: true,
        };
        let text = render(&outcome);
        assert!(text.starts_with("Would request review from:"));
        assert!(text.contains("  mallory ("));
        assert!(text.contains("  alice ("));
    }

    #[test]
    fn test_render_satisfied() {
        let outcome = RunOutcome::AlreadySatisfied {
            involved: vec!["a".into(), "b".into()],
        };
        assert_eq!(render(&outcome), "Already has 2 reviewer(s): a, b");
    }
}
