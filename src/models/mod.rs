//! Data models for the application.
//!
//! These models describe the reviewer roster, the pull request being
//! assigned, and the candidates and selections the pipeline produces.
//!
//! Models derive Serialize so they can be printed as JSON output.

pub mod config;
pub mod pull_request;
pub mod selection;
pub mod settings;

// Re-exports for convenient access
pub use config::{MentorPair, ReviewerConfig, Team};
pub use pull_request::{PullRequest, PullRequestRef};
pub use selection::{Candidate, CandidateTiers, LoadBreakdown, Rank, ReviewerSelection, Tier};
pub use settings::{LoadQuerySettings, RankingMode};
