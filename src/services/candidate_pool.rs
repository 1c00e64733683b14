//! Candidate pool construction.

use crate::models::{CandidateTiers, ReviewerConfig};
use std::collections::BTreeSet;

/// Build the mentor, team and mentorship-group tiers for `author`.
///
/// `excluded` holds everyone who must not be picked (already-involved users
/// and anyone chosen earlier); the author is always excluded as well. Each
/// username appears in at most one tier, in the first tier that offers it.
/// An author without a team or group simply gets empty tiers.
pub fn build_tiers(
    author: &str,
    config: &ReviewerConfig,
    excluded: &BTreeSet<String>,
) -> CandidateTiers {
    let mut taken: BTreeSet<&str> = excluded.iter().map(String::as_str).collect();
    taken.insert(author);

    let mentor = config.mentor_of(author).filter(|m| !taken.contains(m));
    if let Some(m) = mentor {
        log::debug!("[pool] mentor of {} is {}", author, m);
        taken.insert(m);
    }

    let team = match config.team_of(author) {
        Some(t) => {
            log::debug!("[pool] {} belongs to team '{}'", author, t.id);
            take_eligible(&t.members, &mut taken)
        }
        None => Vec::new(),
    };

    let mentorship_group = match config.mentorship_group_of(author) {
        Some(group) => take_eligible(group, &mut taken),
        None => Vec::new(),
    };

    CandidateTiers {
        mentor: mentor.map(str::to_string),
        team,
        mentorship_group,
    }
}

/// Members not yet taken, in roster order; marks them as taken.
fn take_eligible<'a>(members: &'a [String], taken: &mut BTreeSet<&'a str>) -> Vec<String> {
    members
        .iter()
        .filter(|m| taken.insert(m.as_str()))
        .cloned()
        .collect()
}
