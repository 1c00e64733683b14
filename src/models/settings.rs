//! Run settings for the assignment pipeline.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

/// Default number of reviewers a pull request should end up with.
pub const DEFAULT_TARGET_COUNT: usize = 2;

/// Default look-back window for review load, in days.
pub const DEFAULT_WINDOW_DAYS: i64 = 14;

/// Longest accepted activity window, in days.
pub const MAX_WINDOW_DAYS: i64 = 3650;

/// Default weight of mentee-driven review load.
pub const DEFAULT_MENTEE_WEIGHT: f64 = 0.5;

/// Default spacing between outbound search calls, in milliseconds.
pub const DEFAULT_RATE_INTERVAL_MS: u64 = 1000;

/// Default deadline for a single outbound call, in seconds.
pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 30;

/// Authors whose pull requests never count toward review load.
pub const DEFAULT_EXCLUDED_AUTHORS: [&str; 3] =
    ["app/dependabot", "app/renovate", "app/github-actions"];

/// How candidates are ordered within a tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RankingMode {
    /// Lowest recent review load first.
    #[default]
    Ranked,
    /// Uniform random order.
    Random,
}

impl std::fmt::Display for RankingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ranked => write!(f, "ranked"),
            Self::Random => write!(f, "random"),
        }
    }
}

/// Scope and filters of the review-load search queries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadQuerySettings {
    /// Organization the search is restricted to.
    pub org: String,

    /// Length of the trailing activity window.
    pub window_days: i64,

    /// Weight applied to mentee-driven load.
    pub mentee_weight: f64,

    /// Labels whose pull requests are ignored.
    pub excluded_labels: Vec<String>,

    /// Authors (typically bots) whose pull requests are ignored.
    pub excluded_authors: Vec<String>,
}

impl LoadQuerySettings {
    pub fn new(org: impl Into<String>) -> Self {
        Self {
            org: org.into(),
            window_days: DEFAULT_WINDOW_DAYS,
            mentee_weight: DEFAULT_MENTEE_WEIGHT,
            excluded_labels: Vec::new(),
            excluded_authors: DEFAULT_EXCLUDED_AUTHORS
                .iter()
                .map(|a| a.to_string())
                .collect(),
        }
    }

    /// Lower bound of the activity window relative to `today`.
    ///
    /// Saturates at the earliest representable date.
    pub fn since(&self, today: NaiveDate) -> NaiveDate {
        Duration::try_days(self.window_days)
            .and_then(|window| today.checked_sub_signed(window))
            .unwrap_or(NaiveDate::MIN)
    }
}
