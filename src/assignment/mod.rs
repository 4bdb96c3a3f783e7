pub mod mutator;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::conflict::ConflictKind;
use crate::track::TrackTag;
use crate::types::{MemberId, PaperId, ReviewType};

pub use mutator::{apply_assignment, apply_batch, plan_assignment, plan_batch, AssignmentResult};

pub const DEFAULT_ROUND: &str = "R1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentSettings {
    pub track_order: Vec<TrackTag>,
    pub default_round: String,
}

impl Default for AssignmentSettings {
    fn default() -> Self {
        Self {
            track_order: Vec::new(),
            default_round: DEFAULT_ROUND.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DesiredAssignment {
    pub review: ReviewType,
    pub conflict: bool,
}

impl DesiredAssignment {
    pub fn review(review: ReviewType) -> Self {
        Self {
            review,
            conflict: false,
        }
    }

    pub fn conflicted() -> Self {
        Self {
            review: ReviewType::None,
            conflict: true,
        }
    }
}

#[derive(Debug, Error)]
#[error("invalid assignment value: {0:?}")]
pub struct DesiredAssignmentParseError(pub String);

impl FromStr for DesiredAssignment {
    type Err = DesiredAssignmentParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        if matches!(normalized.as_str(), "-1" | "conflict" | "conflicted") {
            return Ok(Self::conflicted());
        }
        let review: ReviewType = normalized
            .parse()
            .map_err(|_| DesiredAssignmentParseError(s.to_string()))?;
        if !ReviewType::ASSIGNABLE.contains(&review) {
            return Err(DesiredAssignmentParseError(s.to_string()));
        }
        Ok(Self::review(review))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssignmentTarget {
    pub paper: PaperId,
    pub reviewer: String,
    pub value: String,
    #[serde(default)]
    pub round: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum Action {
    Conflict(ConflictKind),
    Review(ReviewType),
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Conflict(kind) => write!(f, "conflict {}", kind.as_action()),
            Self::Review(ty) => write!(f, "{}", ty.as_action()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssignmentInstruction {
    pub paper: PaperId,
    pub reviewer: MemberId,
    pub email: String,
    pub action: Action,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchMessage {
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paper: Option<PaperId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewer: Option<String>,
    pub text: String,
}

impl BatchMessage {
    pub fn warning(paper: PaperId, reviewer: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            paper: Some(paper),
            reviewer: Some(reviewer.into()),
            text: text.into(),
        }
    }

    pub fn error(paper: Option<PaperId>, text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            paper,
            reviewer: None,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MutationBatch {
    pub instructions: Vec<AssignmentInstruction>,
    pub messages: Vec<BatchMessage>,
    #[serde(default)]
    pub papers: BTreeSet<PaperId>,
}

impl MutationBatch {
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstructionOutcome {
    pub index: usize,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExecutionReport {
    pub outcomes: Vec<InstructionOutcome>,
}

impl ExecutionReport {
    pub fn ok(&self) -> bool {
        self.outcomes.iter().all(|o| o.ok)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchOutcome {
    pub ok: bool,
    pub applied: usize,
    pub papers: BTreeMap<PaperId, bool>,
    pub messages: Vec<BatchMessage>,
    pub finished_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_form_values() {
        let cases = [
            ("0", DesiredAssignment::review(ReviewType::None)),
            ("2", DesiredAssignment::review(ReviewType::PcOptional)),
            ("3", DesiredAssignment::review(ReviewType::Secondary)),
            ("4", DesiredAssignment::review(ReviewType::Primary)),
            ("5", DesiredAssignment::review(ReviewType::Meta)),
            ("-1", DesiredAssignment::conflicted()),
            ("Primary", DesiredAssignment::review(ReviewType::Primary)),
            ("optional", DesiredAssignment::review(ReviewType::PcOptional)),
            ("conflict", DesiredAssignment::conflicted()),
        ];
        for (raw, expected) in cases {
            assert_eq!(raw.parse::<DesiredAssignment>().ok(), Some(expected), "{raw}");
        }
    }

    #[test]
    fn rejects_unassignable_values() {
        for raw in ["1", "external", "-2", "request", "refusal", "7", "", "lots"] {
            assert!(raw.parse::<DesiredAssignment>().is_err(), "{raw}");
        }
    }
}
