//! Reviewer assignment pipeline for one pull request.
//!
//! Reads who is already involved, decides whether more reviewers are needed,
//! selects them from the roster and requests their review. Errors from any
//! step are returned as is; nothing is submitted after a failure.

use crate::error::AppError;
use crate::models::{
    Candidate, LoadQuerySettings, PullRequestRef, RankingMode, ReviewerConfig,
};
use crate::services::api::{DocumentStore, PullRequestApi, ReviewSearch};
use crate::services::candidate_pool;
use crate::services::config_store::{self, ConfigSource};
use crate::services::load_estimator::LoadEstimator;
use crate::services::rate_limiter::RateLimiter;
use crate::services::retry::RetryPolicy;
use crate::services::selector::{self, Ranking};
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::BTreeSet;
use std::time::Duration;

/// Everything one assignment run needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct AssignRequest {
    pub pull_request: PullRequestRef,
    pub config_source: ConfigSource,
    /// Number of reviewers the pull request should end up with.
    pub target_count: usize,
    pub mode: RankingMode,
    /// Seed for random mode; entropy when absent.
    pub seed: Option<u64>,
    pub load: LoadQuerySettings,
    pub rate_interval: Duration,
    pub call_timeout: Duration,
    pub retry: RetryPolicy,
    /// Compute the selection but skip the reviewer request.
    pub dry_run: bool,
    /// Day the load window is measured back from.
    pub today: NaiveDate,
}

/// External capabilities used by a run.
pub struct Collaborators<'a> {
    pub documents: &'a dyn DocumentStore,
    pub search: &'a dyn ReviewSearch,
    pub pull_requests: &'a dyn PullRequestApi,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Draft pull requests are left alone.
    SkippedDraft,
    /// Enough reviewers are already involved.
    AlreadySatisfied { involved: Vec<String> },
    /// Nobody in the roster is eligible.
    NoCandidates { involved: Vec<String> },
    /// Reviewers were requested (or would have been, on a dry run).
    Requested {
        involved: Vec<String>,
        reviewers: Vec<Candidate>,
        dry_run: bool,
    },
}

impl RunOutcome {
    /// Usernames newly requested by this run.
    pub fn requested_usernames(&self) -> Vec<String> {
        match self {
            Self::Requested { reviewers, .. } => {
                reviewers.iter().map(|c| c.username.clone()).collect()
            }
            _ => Vec::new(),
        }
    }
}

/// Run the assignment pipeline for one pull request.
pub async fn assign_reviewers(
    request: &AssignRequest,
    apis: &Collaborators<'_>,
) -> Result<RunOutcome, AppError> {
    let pr_ref = &request.pull_request;
    let pr = apis.pull_requests.pull_request(pr_ref).await?;

    if pr.draft {
        log::info!("[assign] {} is a draft, skipping", pr_ref);
        return Ok(RunOutcome::SkippedDraft);
    }

    let involved = pr.already_involved();
    let involved_list: Vec<String> = involved.iter().cloned().collect();
    log::info!(
        "[assign] {} by {}: {} reviewer(s) already involved {:?}",
        pr_ref,
        pr.author,
        involved.len(),
        involved_list
    );

    if involved.len() >= request.target_count {
        log::info!(
            "[assign] target of {} reviewer(s) already met",
            request.target_count
        );
        return Ok(RunOutcome::AlreadySatisfied {
            involved: involved_list,
        });
    }

    let config =
        config_store::load_config(apis.documents, &request.config_source, &request.retry).await?;

    let needed = request.target_count - involved.len();
    let chosen = choose(request, apis, &config, &pr.author, &involved, needed).await?;

    if chosen.is_empty() {
        log::info!("[assign] no eligible reviewers for {}", pr.author);
        return Ok(RunOutcome::NoCandidates {
            involved: involved_list,
        });
    }

    let usernames: Vec<String> = chosen.iter().map(|c| c.username.clone()).collect();
    if request.dry_run {
        log::info!("[assign] dry run, would request {:?}", usernames);
    } else {
        log::info!("[assign] requesting review from {:?}", usernames);
        submit(apis.pull_requests, pr_ref, &usernames, &request.retry).await?;
    }

    Ok(RunOutcome::Requested {
        involved: involved_list,
        reviewers: chosen,
        dry_run: request.dry_run,
    })
}

/// Build tiers and select `needed` reviewers with the requested ranking.
async fn choose(
    request: &AssignRequest,
    apis: &Collaborators<'_>,
    config: &ReviewerConfig,
    author: &str,
    involved: &BTreeSet<String>,
    needed: usize,
) -> Result<Vec<Candidate>, AppError> {
    let tiers = candidate_pool::build_tiers(author, config, involved);
    log::debug!(
        "[assign] {} candidate(s): mentor={:?} team={:?} group={:?}",
        tiers.len(),
        tiers.mentor,
        tiers.team,
        tiers.mentorship_group
    );

    let selection = match request.mode {
        RankingMode::Ranked => {
            let limiter = RateLimiter::start(request.rate_interval);
            let estimator =
                LoadEstimator::new(apis.search, &limiter, config, &request.load, request.today)
                    .with_retry(request.retry)
                    .with_call_timeout(request.call_timeout);
            let mut ranking = Ranking::Load(&estimator);
            let selection = selector::select_reviewers(tiers, needed, &mut ranking).await?;
            log::info!("[assign] {} load query(ies) issued", limiter.admitted());
            selection
        }
        RankingMode::Random => {
            let rng = match request.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let mut ranking = Ranking::Shuffle(rng);
            selector::select_reviewers(tiers, needed, &mut ranking).await?
        }
    };

    Ok(selection.candidates().to_vec())
}

/// Request reviews, retrying transient failures.
async fn submit(
    api: &dyn PullRequestApi,
    pr: &PullRequestRef,
    usernames: &[String],
    retry: &RetryPolicy,
) -> Result<(), AppError> {
    retry
        .run("reviewer request", move || api.request_reviewers(pr, usernames))
        .await
        .map_err(|e| match e {
            AppError::Authentication { .. } | AppError::Timeout { .. } => e,
            other => {
                let status = other.status_code();
                AppError::submission(other.to_string(), status)
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PullRequest;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeForge {
        pr: PullRequest,
        roster: &'static str,
        submitted: Mutex<Vec<Vec<String>>>,
        reject_submission: bool,
    }

    impl FakeForge {
        fn new(pr: PullRequest, roster: &'static str) -> Self {
            Self {
                pr,
                roster,
                submitted: Mutex::new(Vec::new()),
                reject_submission: false,
            }
        }
    }

    #[async_trait]
    impl DocumentStore for FakeForge {
        async fn first_document(&self, _document_id: &str) -> Result<String, AppError> {
            Ok(self.roster.to_string())
        }
    }

    #[async_trait]
    impl ReviewSearch for FakeForge {
        async fn count(&self, query: &str) -> Result<u64, AppError> {
            // carol is busier than alice
            Ok(if query.contains(":carol") { 5 } else { 1 })
        }
    }

    #[async_trait]
    impl PullRequestApi for FakeForge {
        async fn pull_request(&self, _pr: &PullRequestRef) -> Result<PullRequest, AppError> {
            Ok(self.pr.clone())
        }

        async fn request_reviewers(
            &self,
            _pr: &PullRequestRef,
            usernames: &[String],
        ) -> Result<(), AppError> {
            if self.reject_submission {
                return Err(AppError::github_api_full(
                    "Reviews may only be requested from collaborators",
                    422,
                    "/repos/acme/widgets/pulls/1/requested_reviewers",
                ));
            }
            self.submitted.lock().unwrap().push(usernames.to_vec());
            Ok(())
        }
    }

    const ROSTER: &str = "teams:\n  core: [alice, bob, carol]\n";

    fn pr(author: &str, draft: bool, requested: &[&str]) -> PullRequest {
        PullRequest {
            author: author.to_string(),
            draft,
            requested_reviewers: requested.iter().map(|s| s.to_string()).collect(),
            reviewers: Vec::new(),
        }
    }

    fn request(target_count: usize) -> AssignRequest {
        AssignRequest {
            pull_request: "acme/widgets#1".parse().unwrap(),
            config_source: ConfigSource::Remote("gist".to_string()),
            target_count,
            mode: RankingMode::Ranked,
            seed: None,
            load: LoadQuerySettings::new("acme"),
            rate_interval: Duration::from_millis(10),
            call_timeout: Duration::from_secs(5),
            retry: RetryPolicy::none(),
            dry_run: false,
            today: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        }
    }

    fn apis(forge: &FakeForge) -> Collaborators<'_> {
        Collaborators {
            documents: forge,
            search: forge,
            pull_requests: forge,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_requests_least_loaded_teammate() {
        let forge = FakeForge::new(pr("bob", false, &[]), ROSTER);
        let outcome = assign_reviewers(&request(1), &apis(&forge)).await.unwrap();

        assert_eq!(outcome.requested_usernames(), vec!["alice"]);
        assert_eq!(*forge.submitted.lock().unwrap(), vec![vec!["alice".to_string()]]);
    }

    #[tokio::test]
    async fn test_draft_is_skipped() {
        let forge = FakeForge::new(pr("bob", true, &[]), ROSTER);
        let outcome = assign_reviewers(&request(2), &apis(&forge)).await.unwrap();

        assert_eq!(outcome, RunOutcome::SkippedDraft);
        assert!(forge.submitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_enough_reviewers_is_noop() {
        let forge = FakeForge::new(pr("bob", false, &["alice", "carol"]), ROSTER);
        let outcome = assign_reviewers(&request(2), &apis(&forge)).await.unwrap();

        assert!(matches!(outcome, RunOutcome::AlreadySatisfied { .. }));
        assert!(forge.submitted.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dry_run_does_not_submit() {
        let forge = FakeForge::new(pr("bob", false, &[]), ROSTER);
        let mut req = request(2);
        req.dry_run = true;

        let outcome = assign_reviewers(&req, &apis(&forge)).await.unwrap();
        assert_eq!(outcome.requested_usernames(), vec!["alice", "carol"]);
        assert!(forge.submitted.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_submission_is_submission_error() {
        let mut forge = FakeForge::new(pr("bob", false, &[]), ROSTER);
        forge.reject_submission = true;

        let err = assign_reviewers(&request(1), &apis(&forge)).await.unwrap_err();
        match err {
            AppError::Submission { status_code, .. } => assert_eq!(status_code, Some(422)),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_random_mode_with_seed() {
        let forge = FakeForge::new(pr("bob", false, &[]), ROSTER);
        let mut req = request(2);
        req.mode = RankingMode::Random;
        req.seed = Some(9);
        req.dry_run = true;

        let outcome = assign_reviewers(&req, &apis(&forge)).await.unwrap();
        let mut picked = outcome.requested_usernames();
        picked.sort();
        assert_eq!(picked, vec!["alice", "carol"]);
    }
}
