pub mod stats;

use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Paper;

pub use stats::{
    track_submission_stats, TrackStats, TrackSubmissionReport, DEFAULT_BUCKET, SUMMARY_ROW,
};

const CHAIR_PREFIX: &str = "trackchair-";
const MEMBER_PREFIX: &str = "trackmember-";

pub fn normalize_tag(raw: &str) -> String {
    let base = raw.trim().split('#').next().unwrap_or_default();
    base.to_ascii_lowercase()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct TrackTag(String);

impl TrackTag {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TrackTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Error)]
#[error("invalid track tag: {0:?}")]
pub struct TrackTagParseError(pub String);

impl FromStr for TrackTag {
    type Err = TrackTagParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize_tag(s);
        let valid = !normalized.is_empty()
            && normalized
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(TrackTagParseError(s.to_string()));
        }
        Ok(Self(normalized))
    }
}

impl TryFrom<String> for TrackTag {
    type Error = TrackTagParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TrackTag> for String {
    fn from(value: TrackTag) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TrackRole {
    Chair(TrackTag),
    Member(TrackTag),
}

/// A member's track roles, indexed once from raw `trackchair-<tag>` /
/// `trackmember-<tag>` tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackRoles {
    roles: BTreeSet<TrackRole>,
}

impl TrackRoles {
    pub fn from_tags<S: AsRef<str>>(tags: &[S]) -> Self {
        let mut roles = BTreeSet::new();
        for raw in tags {
            let tag = normalize_tag(raw.as_ref());
            let role = if let Some(track) = tag.strip_prefix(CHAIR_PREFIX) {
                track.parse().ok().map(TrackRole::Chair)
            } else if let Some(track) = tag.strip_prefix(MEMBER_PREFIX) {
                track.parse().ok().map(TrackRole::Member)
            } else {
                None
            };
            if let Some(role) = role {
                roles.insert(role);
            }
        }
        Self { roles }
    }

    pub fn is_chair(&self, track: &TrackTag) -> bool {
        self.roles.contains(&TrackRole::Chair(track.clone()))
    }

    pub fn is_member(&self, track: &TrackTag) -> bool {
        self.roles.contains(&TrackRole::Member(track.clone()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackRole> {
        self.roles.iter()
    }
}

/// Resolves the paper's track by scanning `track_order` and returning the
/// first tag the paper carries. A paper tagged with several tracks resolves
/// to whichever comes first in `track_order`.
pub fn paper_track(paper: &Paper, track_order: &[TrackTag]) -> Option<TrackTag> {
    track_order.iter().find(|tag| paper.has_tag(tag)).cloned()
}

pub fn is_track_chair(roles: &TrackRoles, track: Option<&TrackTag>) -> bool {
    track.is_some_and(|t| roles.is_chair(t))
}

pub fn is_track_member(roles: &TrackRoles, track: &TrackTag) -> bool {
    roles.is_member(track)
}

pub fn parse_track_order<S: AsRef<str>>(raw: &[S]) -> Result<Vec<TrackTag>, TrackTagParseError> {
    let mut out: Vec<TrackTag> = Vec::with_capacity(raw.len());
    for entry in raw {
        let tag: TrackTag = entry.as_ref().parse()?;
        if !out.contains(&tag) {
            out.push(tag);
        }
    }
    Ok(out)
}
