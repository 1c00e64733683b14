//! Bounded retry for transient outbound failures.

use crate::error::AppError;
use std::future::Future;
use std::time::Duration;
use tokio::time;

/// Default number of attempts per call, including the first.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default wait before the first retry; doubled on each further retry.
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Retry policy applied to every outbound call.
///
/// Only errors for which [`AppError::is_transient`] holds are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
        }
    }

    /// Wait before retry number `retry` (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(retry.saturating_sub(1)))
    }

    /// Run `operation` until it succeeds, fails permanently, or attempts run out.
    pub async fn run<F, Fut, T>(&self, label: &str, mut operation: F) -> Result<T, AppError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let wait = self.backoff(attempt);
                    log::warn!(
                        "[retry] {} failed (attempt {}/{}): {}; retrying in {:?}",
                        label,
                        attempt,
                        max_attempts,
                        e,
                        wait
                    );
                    time::sleep(wait).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_secs(1));
        assert_eq!(policy.backoff(2), Duration::from_secs(2));
        assert_eq!(policy.backoff(3), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_are_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = RetryPolicy::default()
            .run("search", move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(AppError::github_api_full("Bad gateway", 502, "/search/issues"))
                } else {
                    Ok(5u64)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 5);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempts_are_bounded() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = RetryPolicy::default()
            .run("search", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AppError::network("connection reset"))
            })
            .await;

        assert!(matches!(result, Err(AppError::Network { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_failures_are_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = RetryPolicy::default()
            .run("search", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AppError::github_api_full("Validation Failed", 422, "/search/issues"))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_none_policy_makes_one_attempt() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let _ = RetryPolicy::none()
            .run("search", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(AppError::network("down"))
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
