//! Candidate and selection models.

use serde::Serialize;
use std::cmp::Ordering;

/// Source pool of a candidate, consulted in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Mentor,
    Team,
    MentorshipGroup,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mentor => write!(f, "mentor"),
            Self::Team => write!(f, "team"),
            Self::MentorshipGroup => write!(f, "mentorship group"),
        }
    }
}

/// Ranking key of a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "score", rename_all = "snake_case")]
pub enum Rank {
    /// Mentors always sort ahead of any load score.
    Mentor,
    /// Estimated review load; lower is more available.
    Load(f64),
    /// Position after a random shuffle.
    Shuffled(usize),
}

impl Rank {
    /// Total order used for ranking within a tier.
    pub fn cmp_key(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Mentor, Self::Mentor) => Ordering::Equal,
            (Self::Mentor, _) => Ordering::Less,
            (_, Self::Mentor) => Ordering::Greater,
            (Self::Load(a), Self::Load(b)) => a.total_cmp(b),
            (Self::Shuffled(a), Self::Shuffled(b)) => a.cmp(b),
            (Self::Load(_), Self::Shuffled(_)) => Ordering::Less,
            (Self::Shuffled(_), Self::Load(_)) => Ordering::Greater,
        }
    }
}

/// A username with the tier it came from and its ranking key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub username: String,
    pub tier: Tier,
    pub rank: Rank,
}

impl Candidate {
    pub fn mentor(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            tier: Tier::Mentor,
            rank: Rank::Mentor,
        }
    }
}

/// Eligible candidates per tier, already filtered and deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CandidateTiers {
    pub mentor: Option<String>,
    pub team: Vec<String>,
    pub mentorship_group: Vec<String>,
}

impl CandidateTiers {
    /// Tiers in precedence order.
    pub fn into_ordered(self) -> [(Tier, Vec<String>); 3] {
        [
            (Tier::Mentor, self.mentor.into_iter().collect()),
            (Tier::Team, self.team),
            (Tier::MentorshipGroup, self.mentorship_group),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.mentor.is_none() && self.team.is_empty() && self.mentorship_group.is_empty()
    }

    pub fn len(&self) -> usize {
        usize::from(self.mentor.is_some()) + self.team.len() + self.mentorship_group.len()
    }
}

/// Ordered, duplicate-free list of chosen reviewers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ReviewerSelection {
    chosen: Vec<Candidate>,
}

impl ReviewerSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a candidate. Returns `false` if the username was already chosen.
    pub fn push(&mut self, candidate: Candidate) -> bool {
        if self.contains(&candidate.username) {
            return false;
        }
        self.chosen.push(candidate);
        true
    }

    pub fn contains(&self, username: &str) -> bool {
        self.chosen.iter().any(|c| c.username == username)
    }

    pub fn len(&self) -> usize {
        self.chosen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chosen.is_empty()
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.chosen
    }

    pub fn usernames(&self) -> Vec<String> {
        self.chosen.iter().map(|c| c.username.clone()).collect()
    }
}

/// Review-load counts for one user and the score derived from them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadBreakdown {
    pub username: String,

    /// Items where the user is a requested reviewer.
    pub requested: u64,

    /// Items the user reviewed (not authored by them).
    pub reviewed: u64,

    /// Mentees counted in the discount; empty means no discount was applied.
    pub mentees: Vec<String>,

    /// `requested` restricted to items authored by mentees.
    pub mentee_requested: u64,

    /// `reviewed` restricted to items authored by mentees.
    pub mentee_reviewed: u64,

    /// Weight applied to mentee-driven load.
    pub mentee_weight: f64,
}

impl LoadBreakdown {
    /// `requested + reviewed - weight * (mentee_requested + mentee_reviewed)`.
    ///
    /// Without mentees the raw sum is returned as is.
    pub fn score(&self) -> f64 {
        let raw = (self.requested + self.reviewed) as f64;
        if self.mentees.is_empty() {
            return raw;
        }
        raw - self.mentee_weight * (self.mentee_requested + self.mentee_reviewed) as f64
    }
}
