//! Reviewer selection across candidate tiers.
//!
//! Tiers are consulted strictly in order (mentor, team, mentorship group);
//! a tier is only ranked when there is still capacity left, and ranking
//! never reorders candidates across tiers.

use crate::error::AppError;
use crate::models::{Candidate, CandidateTiers, Rank, ReviewerSelection, Tier};
use crate::services::load_estimator::LoadEstimator;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Ordering policy applied inside each non-mentor tier.
pub enum Ranking<'a> {
    /// Lowest estimated review load first; ties keep roster order.
    Load(&'a LoadEstimator<'a>),
    /// Uniform random order.
    Shuffle(StdRng),
}

impl Ranking<'_> {
    /// Rank one tier's usernames.
    pub async fn rank(
        &mut self,
        tier: Tier,
        usernames: Vec<String>,
    ) -> Result<Vec<Candidate>, AppError> {
        if tier == Tier::Mentor {
            return Ok(usernames.into_iter().map(Candidate::mentor).collect());
        }

        match self {
            Self::Load(estimator) => {
                let loads = estimator.estimate_all(&usernames).await?;
                let mut ranked: Vec<Candidate> = loads
                    .into_iter()
                    .map(|load| Candidate {
                        rank: Rank::Load(load.score()),
                        username: load.username,
                        tier,
                    })
                    .collect();
                // Stable: equal scores keep their roster order.
                ranked.sort_by(|a, b| a.rank.cmp_key(&b.rank));
                Ok(ranked)
            }
            Self::Shuffle(rng) => {
                let mut shuffled = usernames;
                shuffled.shuffle(rng);
                Ok(shuffled
                    .into_iter()
                    .enumerate()
                    .map(|(position, username)| Candidate {
                        username,
                        tier,
                        rank: Rank::Shuffled(position),
                    })
                    .collect())
            }
        }
    }
}

/// Pick up to `target` reviewers, filling from each tier in precedence order.
///
/// Running out of candidates before reaching `target` is not an error; the
/// selection is simply shorter.
pub async fn select_reviewers(
    tiers: CandidateTiers,
    target: usize,
    ranking: &mut Ranking<'_>,
) -> Result<ReviewerSelection, AppError> {
    let mut selection = ReviewerSelection::new();

    for (tier, usernames) in tiers.into_ordered() {
        let remaining = target.saturating_sub(selection.len());
        if remaining == 0 {
            break;
        }
        if usernames.is_empty() {
            log::debug!("[select] {} tier is empty", tier);
            continue;
        }

        let ranked = ranking.rank(tier, usernames).await?;
        for candidate in ranked.into_iter().take(remaining) {
            log::debug!("[select] picked {} from {} tier", candidate.username, tier);
            selection.push(candidate);
        }
    }

    Ok(selection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn tiers(mentor: Option<&str>, team: &[&str], group: &[&str]) -> CandidateTiers {
        CandidateTiers {
            mentor: mentor.map(str::to_string),
            team: team.iter().map(|s| s.to_string()).collect(),
            mentorship_group: group.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_mentor_fills_single_slot() {
        let mut ranking = Ranking::Shuffle(StdRng::seed_from_u64(1));
        let selection = select_reviewers(tiers(Some("m"), &["a", "b"], &["c"]), 1, &mut ranking)
            .await
            .unwrap();
        assert_eq!(selection.usernames(), vec!["m"]);
        assert_eq!(selection.candidates()[0].rank, Rank::Mentor);
    }

    #[tokio::test]
    async fn test_falls_through_tiers_until_target() {
        let mut ranking = Ranking::Shuffle(StdRng::seed_from_u64(7));
        let selection = select_reviewers(tiers(Some("m"), &["a"], &["c", "d"]), 3, &mut ranking)
            .await
            .unwrap();

        let picked = selection.usernames();
        assert_eq!(picked.len(), 3);
        assert_eq!(picked[0], "m");
        assert_eq!(picked[1], "a");
        assert!(picked[2] == "c" || picked[2] == "d");
        assert_eq!(selection.candidates()[2].tier, Tier::MentorshipGroup);
    }

    #[tokio::test]
    async fn test_exhausted_tiers_yield_short_selection() {
        let mut ranking = Ranking::Shuffle(StdRng::seed_from_u64(7));
        let selection = select_reviewers(tiers(None, &["a"], &[]), 4, &mut ranking)
            .await
            .unwrap();
        assert_eq!(selection.usernames(), vec!["a"]);

        let selection = select_reviewers(CandidateTiers::default(), 2, &mut ranking)
            .await
            .unwrap();
        assert!(selection.is_empty());
    }

    #[tokio::test]
    async fn test_zero_target_selects_nobody() {
        let mut ranking = Ranking::Shuffle(StdRng::seed_from_u64(7));
        let selection = select_reviewers(tiers(Some("m"), &["a"], &[]), 0, &mut ranking)
            .await
            .unwrap();
        assert!(selection.is_empty());
    }

    #[tokio::test]
    async fn test_seeded_shuffle_is_reproducible() {
        let team: Vec<String> = (0..10).map(|i| format!("user{}", i)).collect();
        let team_refs: Vec<&str> = team.iter().map(String::as_str).collect();

        let mut first = Ranking::Shuffle(StdRng::seed_from_u64(42));
        let mut second = Ranking::Shuffle(StdRng::seed_from_u64(42));
        let a = select_reviewers(tiers(None, &team_refs, &[]), 4, &mut first)
            .await
            .unwrap();
        let b = select_reviewers(tiers(None, &team_refs, &[]), 4, &mut second)
            .await
            .unwrap();
        assert_eq!(a.usernames(), b.usernames());
    }
}
