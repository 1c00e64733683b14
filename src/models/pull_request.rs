//! Pull request model.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Identifies a pull request on the forge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRef {
    pub owner: String,
    pub repo: String,
    pub number: u64,
}

impl PullRequestRef {
    /// Build a reference from an `owner/name` repository slug and a number.
    pub fn from_slug(slug: &str, number: u64) -> Result<Self, AppError> {
        let (owner, repo) = slug
            .trim()
            .split_once('/')
            .filter(|(o, r)| !o.is_empty() && !r.is_empty() && !r.contains('/'))
            .ok_or_else(|| {
                AppError::invalid_input_field(
                    format!("expected repository as owner/name, got '{}'", slug),
                    "repo",
                )
            })?;

        Ok(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            number,
        })
    }
}

impl FromStr for PullRequestRef {
    type Err = AppError;

    /// Parse `owner/name#number`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (slug, number) = s
            .split_once('#')
            .ok_or_else(|| AppError::invalid_input(format!("expected owner/name#number, got '{}'", s)))?;
        let number = number
            .parse()
            .map_err(|_| AppError::invalid_input(format!("invalid pull request number '{}'", number)))?;
        Self::from_slug(slug, number)
    }
}

impl std::fmt::Display for PullRequestRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.number)
    }
}

/// The parts of a pull request that decide whether and whom to assign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequest {
    /// Author's login.
    pub author: String,

    /// Draft pull requests are never assigned reviewers.
    pub draft: bool,

    /// Users with a pending review request.
    pub requested_reviewers: Vec<String>,

    /// Users who have already submitted a review.
    pub reviewers: Vec<String>,
}

impl PullRequest {
    /// Users already acting as reviewer or requested reviewer.
    ///
    /// The author is never counted, even when they commented through a review.
    pub fn already_involved(&self) -> BTreeSet<String> {
        self.reviewers
            .iter()
            .filter(|r| **r != self.author)
            .chain(self.requested_reviewers.iter())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pull_request_ref() {
        let pr: PullRequestRef = "acme/widgets#42".parse().unwrap();
        assert_eq!(pr.owner, "acme");
        assert_eq!(pr.repo, "widgets");
        assert_eq!(pr.number, 42);
        assert_eq!(pr.to_string(), "acme/widgets#42");
    }

    #[test]
    fn test_invalid_refs_rejected() {
        assert!("acme/widgets".parse::<PullRequestRef>().is_err());
        assert!("acme#1".parse::<PullRequestRef>().is_err());
        assert!("acme/widgets#x".parse::<PullRequestRef>().is_err());
        assert!(PullRequestRef::from_slug("a/b/c", 1).is_err());
        assert!(PullRequestRef::from_slug("/b", 1).is_err());
    }

    #[test]
    fn test_already_involved_excludes_author() {
        let pr = PullRequest {
            author: "bob".to_string(),
            draft: false,
            requested_reviewers: vec!["carol".to_string()],
            reviewers: vec!["bob".to_string(), "alice".to_string(), "carol".to_string()],
        };

        let involved: Vec<_> = pr.already_involved().into_iter().collect();
        assert_eq!(involved, vec!["alice", "carol"]);
    }
}
