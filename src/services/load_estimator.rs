//! Review-load estimation.
//!
//! A candidate's load is the number of pull requests they were asked to
//! review plus the number they reviewed inside a trailing window. Reviewers
//! who mentor others get half of their mentee-driven load back, so mentoring
//! counts as cheaper review work.

use crate::error::AppError;
use crate::models::settings::DEFAULT_CALL_TIMEOUT_SECS;
use crate::models::{LoadBreakdown, LoadQuerySettings, ReviewerConfig};
use crate::services::api::ReviewSearch;
use crate::services::rate_limiter::RateLimiter;
use crate::services::retry::RetryPolicy;
use chrono::NaiveDate;
use std::time::Duration;

/// Which side of the review relationship a query counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewRole {
    /// The user has a review request on the item.
    Requested,
    /// The user submitted a review on an item they did not author.
    Reviewed,
}

/// Typed search filter for one load count.
#[derive(Debug, Clone)]
pub struct ReviewQuery<'a> {
    pub role: ReviewRole,
    pub username: &'a str,
    /// When non-empty, only items authored by these users are counted.
    pub authors: &'a [String],
    pub since: NaiveDate,
    pub settings: &'a LoadQuerySettings,
}

impl ReviewQuery<'_> {
    /// Render the search filter expression.
    pub fn to_filter_expression(&self) -> String {
        let mut terms = vec!["is:pr".to_string(), format!("org:{}", self.settings.org)];

        match self.role {
            ReviewRole::Requested => {
                terms.push(format!("review-requested:{}", self.username));
            }
            ReviewRole::Reviewed => {
                terms.push(format!("reviewed-by:{}", self.username));
                terms.push(format!("-author:{}", self.username));
            }
        }

        terms.extend(self.authors.iter().map(|a| format!("author:{}", a)));
        terms.push(format!("created:>={}", self.since.format("%Y-%m-%d")));
        terms.extend(
            self.settings
                .excluded_labels
                .iter()
                .map(|l| format!("-label:{}", quote_term(l))),
        );
        terms.extend(
            self.settings
                .excluded_authors
                .iter()
                .map(|a| format!("-author:{}", a)),
        );

        terms.join(" ")
    }
}

/// Quote a search term when it contains whitespace.
fn quote_term(term: &str) -> String {
    if term.chars().any(char::is_whitespace) {
        format!("\"{}\"", term.replace('"', ""))
    } else {
        term.to_string()
    }
}

/// Computes load scores for candidates.
///
/// Every count goes through the shared rate limiter, with a per-call
/// deadline and the run's retry policy.
pub struct LoadEstimator<'a> {
    search: &'a dyn ReviewSearch,
    limiter: &'a RateLimiter,
    config: &'a ReviewerConfig,
    settings: &'a LoadQuerySettings,
    retry: RetryPolicy,
    call_timeout: Duration,
    since: NaiveDate,
}

impl<'a> LoadEstimator<'a> {
    pub fn new(
        search: &'a dyn ReviewSearch,
        limiter: &'a RateLimiter,
        config: &'a ReviewerConfig,
        settings: &'a LoadQuerySettings,
        today: NaiveDate,
    ) -> Self {
        Self {
            search,
            limiter,
            config,
            settings,
            retry: RetryPolicy::default(),
            call_timeout: Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS),
            since: settings.since(today),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Estimate the load of `username`, discounting work for their mentees.
    pub async fn estimate(&self, username: &str) -> Result<LoadBreakdown, AppError> {
        let mentees = self.config.mentees_of(username);
        self.estimate_with_mentees(username, mentees).await
    }

    /// Estimate the load of `username` given an explicit mentee list.
    pub async fn estimate_with_mentees(
        &self,
        username: &str,
        mentees: Vec<String>,
    ) -> Result<LoadBreakdown, AppError> {
        let query = |role: ReviewRole, authors: &[String]| {
            ReviewQuery {
                role,
                username,
                authors,
                since: self.since,
                settings: self.settings,
            }
            .to_filter_expression()
        };

        let requested_q = query(ReviewRole::Requested, &[]);
        let reviewed_q = query(ReviewRole::Reviewed, &[]);

        let (requested, reviewed, mentee_requested, mentee_reviewed) = if mentees.is_empty() {
            let (requested, reviewed) =
                futures::try_join!(self.count(&requested_q), self.count(&reviewed_q))?;
            (requested, reviewed, 0, 0)
        } else {
            let mentee_requested_q = query(ReviewRole::Requested, &mentees);
            let mentee_reviewed_q = query(ReviewRole::Reviewed, &mentees);
            futures::try_join!(
                self.count(&requested_q),
                self.count(&reviewed_q),
                self.count(&mentee_requested_q),
                self.count(&mentee_reviewed_q),
            )?
        };

        let breakdown = LoadBreakdown {
            username: username.to_string(),
            requested,
            reviewed,
            mentees,
            mentee_requested,
            mentee_reviewed,
            mentee_weight: self.settings.mentee_weight,
        };

        log::debug!(
            "[load] {}: requested={} reviewed={} mentee_requested={} mentee_reviewed={} score={}",
            username,
            breakdown.requested,
            breakdown.reviewed,
            breakdown.mentee_requested,
            breakdown.mentee_reviewed,
            breakdown.score()
        );

        Ok(breakdown)
    }

    /// Estimate several users concurrently, preserving input order.
    pub async fn estimate_all(
        &self,
        usernames: &[String],
    ) -> Result<Vec<LoadBreakdown>, AppError> {
        futures::future::try_join_all(usernames.iter().map(|u| self.estimate(u))).await
    }

    /// Run one count through the limiter with deadline and retries.
    async fn count(&self, query: &str) -> Result<u64, AppError> {
        let call_timeout = self.call_timeout;

        self.retry
            .run("review count", move || async move {
                self.limiter
                    .run(async {
                        match tokio::time::timeout(call_timeout, self.search.count(query)).await {
                            Ok(result) => result,
                            Err(_) => Err(AppError::timeout(
                                format!("search '{}'", query),
                                call_timeout.as_secs(),
                            )),
                        }
                    })
                    .await
            })
            .await
            .map_err(|e| match e {
                AppError::Timeout { .. } | AppError::Authentication { .. } => e,
                other => AppError::load_query(other.to_string(), query),
            })
    }
}
