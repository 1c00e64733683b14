//! `check-config` command.

use crate::cli::Cli;
use crate::error::AppError;
use crate::models::settings::DEFAULT_CALL_TIMEOUT_SECS;
use crate::models::ReviewerConfig;
use crate::services::config_store::{self, ConfigSource};
use crate::services::RetryPolicy;

/// Fetch, validate and summarize the reviewer roster.
pub async fn execute(cli: &Cli) -> Result<(), AppError> {
    let source = cli.config_source()?;
    let retry = RetryPolicy::default();

    let config = match &source {
        ConfigSource::File(path) => config_store::read_config_file(path).await?,
        ConfigSource::Remote(id) => {
            let client = cli.client(DEFAULT_CALL_TIMEOUT_SECS)?;
            config_store::fetch_config(&client, id, &retry).await?
        }
    };

    super::emit(cli.format, &config, render)
}

/// Human-readable roster summary.
pub fn render(config: &ReviewerConfig) -> String {
    let mut lines = vec![format!("Teams: {}", config.teams.len())];
    for team in &config.teams {
        lines.push(format!("  {}: {}", team.id, team.members.join(", ")));
    }

    lines.push(format!("Mentorship groups: {}", config.mentorship_groups.len()));
    for group in &config.mentorship_groups {
        lines.push(format!("  {}", group.join(", ")));
    }

    lines.push(format!("Mentor pairs: {}", config.mentors.len()));
    for pair in &config.mentors {
        lines.push(format!("  {} -> {}", pair.mentee, pair.mentor));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_summary() {
        let config = ReviewerConfig::parse(
            "teams:\n  core: [alice, bob]\nmentorshipGroups:\n  - [carol, dave]\nmentors:\n  bob: alice\n",
        )
        .unwrap();

        let text = render(&config);
        assert_eq!(
            text,
            "Teams: 1\n  core: alice, bob\nMentorship groups: 1\n  carol, dave\nMentor pairs: 1\n  bob -> alice"
        );
    }
}
