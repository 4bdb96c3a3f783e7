use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::conflict::{classify, ConflictKind};
use crate::track::{normalize_tag, TrackRoles, TrackTag};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct PaperId(pub u32);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct MemberId(pub u32);

impl Display for PaperId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl Display for MemberId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PaperId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().trim_start_matches('#').parse().map(Self)
    }
}

impl FromStr for MemberId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// Review type codes, declared in code order so the derived ordering matches.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReviewType {
    Refusal,
    Request,
    #[default]
    None,
    External,
    PcOptional,
    Secondary,
    Primary,
    Meta,
}

impl ReviewType {
    pub const ASSIGNABLE: [ReviewType; 5] = [
        ReviewType::None,
        ReviewType::PcOptional,
        ReviewType::Secondary,
        ReviewType::Primary,
        ReviewType::Meta,
    ];

    pub fn code(self) -> i8 {
        match self {
            Self::Refusal => -3,
            Self::Request => -2,
            Self::None => 0,
            Self::External => 1,
            Self::PcOptional => 2,
            Self::Secondary => 3,
            Self::Primary => 4,
            Self::Meta => 5,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        let ty = match code {
            -3 => Self::Refusal,
            -2 => Self::Request,
            0 => Self::None,
            1 => Self::External,
            2 => Self::PcOptional,
            3 => Self::Secondary,
            4 => Self::Primary,
            5 => Self::Meta,
            _ => return None,
        };
        Some(ty)
    }

    pub fn is_assigned(self) -> bool {
        self > Self::None
    }

    pub fn is_pc_review(self) -> bool {
        self >= Self::PcOptional
    }

    pub fn as_action(self) -> &'static str {
        match self {
            Self::None | Self::Refusal | Self::Request => "clearreview",
            Self::External => "review",
            Self::PcOptional => "optionalreview",
            Self::Secondary => "secondary",
            Self::Primary => "primary",
            Self::Meta => "metareview",
        }
    }
}

impl Display for ReviewType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Refusal => "refusal",
            Self::Request => "request",
            Self::None => "none",
            Self::External => "external",
            Self::PcOptional => "optional",
            Self::Secondary => "secondary",
            Self::Primary => "primary",
            Self::Meta => "meta",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Error)]
#[error("unknown review type: {0}")]
pub struct ReviewTypeParseError(pub String);

impl FromStr for ReviewType {
    type Err = ReviewTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        if let Ok(code) = normalized.parse::<i64>() {
            return Self::from_code(code).ok_or_else(|| ReviewTypeParseError(s.to_string()));
        }
        match normalized.as_str() {
            "none" | "clear" | "clearreview" => Ok(Self::None),
            "external" | "ext" => Ok(Self::External),
            "pc" | "optional" | "optionalreview" => Ok(Self::PcOptional),
            "secondary" | "sec" => Ok(Self::Secondary),
            "primary" | "pri" => Ok(Self::Primary),
            "meta" | "metareview" => Ok(Self::Meta),
            "request" => Ok(Self::Request),
            "refusal" | "declined" => Ok(Self::Refusal),
            _ => Err(ReviewTypeParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    #[default]
    NotStarted,
    Drafted,
    Submitted,
    ApprovalRequested,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReviewRecord {
    pub reviewer: MemberId,
    pub review_type: ReviewType,
    #[serde(default)]
    pub status: ReviewStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round: Option<String>,
}

impl ReviewRecord {
    pub fn new(reviewer: MemberId, review_type: ReviewType) -> Self {
        Self {
            reviewer,
            review_type,
            status: ReviewStatus::NotStarted,
            round: None,
        }
    }

    pub fn with_status(mut self, status: ReviewStatus) -> Self {
        self.status = status;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Author {
    pub name: String,
    #[serde(default)]
    pub affiliation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Paper {
    pub id: PaperId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub topics: Vec<u32>,
    #[serde(default)]
    pub authors: Vec<Author>,
    #[serde(default)]
    pub conflicts: BTreeMap<MemberId, u32>,
    #[serde(default)]
    pub reviews: Vec<ReviewRecord>,
    #[serde(default)]
    pub preferences: BTreeMap<MemberId, i32>,
    #[serde(default)]
    pub submitted: bool,
    #[serde(default)]
    pub withdrawn: bool,
}

impl Paper {
    pub fn new(id: u32) -> Self {
        Self {
            id: PaperId(id),
            title: String::new(),
            tags: Vec::new(),
            topics: Vec::new(),
            authors: Vec::new(),
            conflicts: BTreeMap::new(),
            reviews: Vec::new(),
            preferences: BTreeMap::new(),
            submitted: true,
            withdrawn: false,
        }
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tags.push(tag.to_string());
        self
    }

    pub fn with_topics(mut self, topics: &[u32]) -> Self {
        self.topics = topics.to_vec();
        self
    }

    pub fn with_conflict(mut self, member: MemberId, kind: ConflictKind) -> Self {
        self.conflicts.insert(member, kind.code());
        self
    }

    pub fn with_review(mut self, review: ReviewRecord) -> Self {
        self.reviews.push(review);
        self
    }

    pub fn with_preference(mut self, member: MemberId, preference: i32) -> Self {
        self.preferences.insert(member, preference);
        self
    }

    pub fn with_author(mut self, name: &str, affiliation: &str) -> Self {
        self.authors.push(Author {
            name: name.to_string(),
            affiliation: affiliation.to_string(),
        });
        self
    }

    pub fn with_submitted(mut self, submitted: bool) -> Self {
        self.submitted = submitted;
        self
    }

    pub fn has_tag(&self, tag: &TrackTag) -> bool {
        self.tags.iter().any(|t| normalize_tag(t) == tag.as_str())
    }

    pub fn conflict_code(&self, member: MemberId) -> u32 {
        self.conflicts.get(&member).copied().unwrap_or(0)
    }

    pub fn conflict_kind(&self, member: MemberId) -> ConflictKind {
        classify(self.conflict_code(member))
    }

    pub fn review_by(&self, member: MemberId) -> Option<&ReviewRecord> {
        self.reviews.iter().find(|r| r.reviewer == member)
    }

    pub fn review_type(&self, member: MemberId) -> ReviewType {
        self.review_by(member)
            .map(|r| r.review_type)
            .unwrap_or(ReviewType::None)
    }

    pub fn has_reviewer(&self, member: MemberId) -> bool {
        self.review_type(member).is_assigned()
    }

    pub fn has_primary_or_secondary(&self) -> bool {
        self.reviews
            .iter()
            .any(|r| matches!(r.review_type, ReviewType::Primary | ReviewType::Secondary))
    }

    pub fn preference(&self, member: MemberId) -> i32 {
        self.preferences.get(&member).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MemberRecord {
    id: MemberId,
    email: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    affiliation: String,
    #[serde(default = "default_true")]
    is_pc: bool,
    #[serde(default)]
    is_chair: bool,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    topic_interests: BTreeMap<u32, i32>,
    #[serde(default)]
    collaborators: Vec<String>,
    #[serde(default)]
    unassignable_tracks: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(from = "MemberRecord", into = "MemberRecord")]
pub struct Member {
    pub id: MemberId,
    pub email: String,
    pub name: String,
    pub affiliation: String,
    pub is_pc: bool,
    pub is_chair: bool,
    pub tags: Vec<String>,
    pub track_roles: TrackRoles,
    pub topic_interests: BTreeMap<u32, i32>,
    pub collaborators: Vec<String>,
    pub unassignable_tracks: Vec<String>,
}

impl From<MemberRecord> for Member {
    fn from(record: MemberRecord) -> Self {
        let track_roles = TrackRoles::from_tags(record.tags.as_slice());
        Self {
            id: record.id,
            email: record.email,
            name: record.name,
            affiliation: record.affiliation,
            is_pc: record.is_pc,
            is_chair: record.is_chair,
            tags: record.tags,
            track_roles,
            topic_interests: record.topic_interests,
            collaborators: record.collaborators,
            unassignable_tracks: record.unassignable_tracks,
        }
    }
}

impl From<Member> for MemberRecord {
    fn from(member: Member) -> Self {
        Self {
            id: member.id,
            email: member.email,
            name: member.name,
            affiliation: member.affiliation,
            is_pc: member.is_pc,
            is_chair: member.is_chair,
            tags: member.tags,
            topic_interests: member.topic_interests,
            collaborators: member.collaborators,
            unassignable_tracks: member.unassignable_tracks,
        }
    }
}

impl Member {
    pub fn new(id: u32, email: &str) -> Self {
        Self {
            id: MemberId(id),
            email: email.to_string(),
            name: String::new(),
            affiliation: String::new(),
            is_pc: true,
            is_chair: false,
            tags: Vec::new(),
            track_roles: TrackRoles::default(),
            topic_interests: BTreeMap::new(),
            collaborators: Vec::new(),
            unassignable_tracks: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_affiliation(mut self, affiliation: &str) -> Self {
        self.affiliation = affiliation.to_string();
        self
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tags.push(tag.to_string());
        self.track_roles = TrackRoles::from_tags(self.tags.as_slice());
        self
    }

    pub fn with_interest(mut self, topic: u32, value: i32) -> Self {
        self.topic_interests.insert(topic, value);
        self
    }

    pub fn with_chair(mut self, is_chair: bool) -> Self {
        self.is_chair = is_chair;
        self
    }

    pub fn with_pc(mut self, is_pc: bool) -> Self {
        self.is_pc = is_pc;
        self
    }

    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.email
        } else {
            &self.name
        }
    }

    pub fn track_assignable(&self, track: Option<&TrackTag>) -> bool {
        let Some(track) = track else {
            return true;
        };
        !self
            .unassignable_tracks
            .iter()
            .any(|t| normalize_tag(t) == track.as_str())
    }
}

fn default_true() -> bool {
    true
}
