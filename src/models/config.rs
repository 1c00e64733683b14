//! Reviewer roster configuration model.
//!
//! The roster document is YAML (JSON is accepted as a YAML subset):
//!
//! ```yaml
//! teams:
//!   core: [alice, bob, carol]
//! mentorshipGroups:
//!   - [bob, dave, erin]
//! mentors:
//!   bob: alice
//! ```

use crate::error::AppError;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A named set of usernames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Team {
    /// Team identifier (the key in the `teams` mapping).
    pub id: String,

    /// Team members, in document order.
    pub members: Vec<String>,
}

impl Team {
    pub fn contains(&self, username: &str) -> bool {
        self.members.iter().any(|m| m == username)
    }
}

/// A mentee → mentor pair, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MentorPair {
    pub mentee: String,
    pub mentor: String,
}

/// Strongly typed reviewer roster.
///
/// Loaded fresh for every run and never mutated after validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReviewerConfig {
    /// Teams in document order.
    #[serde(default, deserialize_with = "ordered_teams")]
    pub teams: Vec<Team>,

    /// Mentorship groups in document order.
    #[serde(default)]
    pub mentorship_groups: Vec<Vec<String>>,

    /// Mentee → mentor assignments in document order.
    #[serde(default, deserialize_with = "ordered_mentors")]
    pub mentors: Vec<MentorPair>,
}

impl ReviewerConfig {
    /// Parse and validate a roster document.
    pub fn parse(content: &str) -> Result<Self, AppError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject documents that parse but cannot describe a valid roster.
    pub fn validate(&self) -> Result<(), AppError> {
        for team in &self.teams {
            if team.id.trim().is_empty() {
                return Err(AppError::config_parse_field("team id is empty", "teams"));
            }
            if team.members.iter().any(|m| m.trim().is_empty()) {
                return Err(AppError::config_parse_field(
                    format!("team '{}' lists an empty username", team.id),
                    format!("teams.{}", team.id),
                ));
            }
        }

        for (index, group) in self.mentorship_groups.iter().enumerate() {
            if group.iter().any(|m| m.trim().is_empty()) {
                return Err(AppError::config_parse_field(
                    format!("mentorship group {} lists an empty username", index),
                    format!("mentorshipGroups[{}]", index),
                ));
            }
        }

        for pair in &self.mentors {
            if pair.mentee.trim().is_empty() || pair.mentor.trim().is_empty() {
                return Err(AppError::config_parse_field(
                    "mentor entry has an empty username",
                    "mentors",
                ));
            }
            if pair.mentee == pair.mentor {
                return Err(AppError::config_parse_field(
                    format!("'{}' is listed as their own mentor", pair.mentee),
                    format!("mentors.{}", pair.mentee),
                ));
            }
        }

        Ok(())
    }

    /// The author's mentor, if one is assigned.
    pub fn mentor_of(&self, username: &str) -> Option<&str> {
        self.mentors
            .iter()
            .find(|p| p.mentee == username)
            .map(|p| p.mentor.as_str())
    }

    /// Everyone mentored by `username`, in document order.
    pub fn mentees_of(&self, username: &str) -> Vec<String> {
        self.mentors
            .iter()
            .filter(|p| p.mentor == username)
            .map(|p| p.mentee.clone())
            .collect()
    }

    /// First team (document order) whose members include `username`.
    pub fn team_of(&self, username: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.contains(username))
    }

    /// First mentorship group (list order) that includes `username`.
    pub fn mentorship_group_of(&self, username: &str) -> Option<&[String]> {
        self.mentorship_groups
            .iter()
            .find(|g| g.iter().any(|m| m == username))
            .map(Vec::as_slice)
    }
}

// serde's derived map support would lose document order, which decides
// "first team containing the author".

fn ordered_teams<'de, D>(deserializer: D) -> Result<Vec<Team>, D::Error>
where
    D: Deserializer<'de>,
{
    struct TeamsVisitor;

    impl<'de> Visitor<'de> for TeamsVisitor {
        type Value = Vec<Team>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a mapping of team id to a list of usernames")
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut teams = Vec::new();
            while let Some((id, members)) = map.next_entry::<String, Vec<String>>()? {
                teams.push(Team { id, members });
            }
            Ok(teams)
        }
    }

    deserializer.deserialize_any(TeamsVisitor)
}

fn ordered_mentors<'de, D>(deserializer: D) -> Result<Vec<MentorPair>, D::Error>
where
    D: Deserializer<'de>,
{
    struct MentorsVisitor;

    impl<'de> Visitor<'de> for MentorsVisitor {
        type Value = Vec<MentorPair>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a mapping of mentee username to mentor username")
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut pairs = Vec::new();
            while let Some((mentee, mentor)) = map.next_entry::<String, String>()? {
                pairs.push(MentorPair { mentee, mentor });
            }
            Ok(pairs)
        }
    }

    deserializer.deserialize_any(MentorsVisitor)
}
