//! Outbound capabilities the assignment pipeline depends on.
//!
//! The pipeline only talks to these traits; `GitHubClient` implements all of
//! them, and tests substitute in-memory fakes.

use crate::error::AppError;
use crate::models::{PullRequest, PullRequestRef};
use async_trait::async_trait;

/// Remote store holding the reviewer roster document.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Content of the first document attached to `document_id`.
    async fn first_document(&self, document_id: &str) -> Result<String, AppError>;
}

/// Issue/pull request search backend.
#[async_trait]
pub trait ReviewSearch: Send + Sync {
    /// Number of items matching a search filter expression.
    async fn count(&self, query: &str) -> Result<u64, AppError>;
}

/// Pull request reads and the reviewer request call.
#[async_trait]
pub trait PullRequestApi: Send + Sync {
    async fn pull_request(&self, pr: &PullRequestRef) -> Result<PullRequest, AppError>;

    async fn request_reviewers(
        &self,
        pr: &PullRequestRef,
        usernames: &[String],
    ) -> Result<(), AppError>;
}
