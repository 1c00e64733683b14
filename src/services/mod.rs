//! Business logic services.
//!
//! The GitHub client implements the collaborator traits in `api`; everything
//! else depends only on those traits so it can run against fakes in tests.

pub mod api;
pub mod candidate_pool;
pub mod config_store;
pub mod github_client;
pub mod load_estimator;
pub mod orchestrator;
pub mod rate_limiter;
pub mod retry;
pub mod selector;

pub use api::{DocumentStore, PullRequestApi, ReviewSearch};
pub use config_store::ConfigSource;
pub use github_client::{GitHubClient, GitHubClientConfig};
pub use load_estimator::LoadEstimator;
pub use orchestrator::{assign_reviewers, AssignRequest, Collaborators, RunOutcome};
pub use rate_limiter::RateLimiter;
pub use retry::RetryPolicy;
