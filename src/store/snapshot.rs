use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::assignment::{Action, AssignmentInstruction, ExecutionReport, InstructionOutcome, MutationBatch};
use crate::conflict::ConflictKind;
use crate::error::{OracleError, Result};
use crate::store::{AssignmentExecutor, MemberStore, PaperStore};
use crate::track::TrackTag;
use crate::types::{Member, MemberId, Paper, PaperId, ReviewRecord, ReviewStatus, ReviewType};
use crate::workload::ReviewRow;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConferenceData {
    #[serde(default)]
    pub tracks: Vec<TrackTag>,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub papers: Vec<Paper>,
}

#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    data: ConferenceData,
    path: Option<PathBuf>,
}

impl SnapshotStore {
    pub fn new(data: ConferenceData) -> Self {
        Self { data, path: None }
    }

    pub fn open(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|source| OracleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let data: ConferenceData = serde_json::from_str(&raw).map_err(|e| {
            OracleError::Store(format!("failed parsing snapshot {}: {e}", path.display()))
        })?;
        info!(
            path = %path.display(),
            papers = data.papers.len(),
            members = data.members.len(),
            "opened conference snapshot"
        );
        Ok(Self {
            data,
            path: Some(path.to_path_buf()),
        })
    }

    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| OracleError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(&self.data)
            .map_err(|e| OracleError::Store(format!("failed serializing snapshot: {e}")))?;
        fs::write(path, json).map_err(|source| OracleError::Io {
            path: path.clone(),
            source,
        })
    }

    pub fn data(&self) -> &ConferenceData {
        &self.data
    }

    fn find_paper(&self, id: PaperId) -> Option<&Paper> {
        self.data.papers.iter().find(|p| p.id == id)
    }
}

impl PaperStore for SnapshotStore {
    fn paper(&self, id: PaperId) -> Result<Paper> {
        self.find_paper(id)
            .cloned()
            .ok_or_else(|| OracleError::paper_not_found(id))
    }

    fn papers(&self) -> Result<Vec<Paper>> {
        Ok(self.data.papers.clone())
    }

    fn track_tags(&self) -> Result<Vec<TrackTag>> {
        Ok(self.data.tracks.clone())
    }

    fn paper_ids_with_tag(&self, tag: &TrackTag) -> Result<BTreeSet<PaperId>> {
        Ok(self
            .data
            .papers
            .iter()
            .filter(|p| p.has_tag(tag))
            .map(|p| p.id)
            .collect())
    }

    fn review_rows(&self) -> Result<Vec<ReviewRow>> {
        let rows = self
            .data
            .papers
            .iter()
            .flat_map(|paper| {
                paper.reviews.iter().map(move |review| ReviewRow {
                    paper: paper.id,
                    reviewer: review.reviewer,
                    review_type: review.review_type,
                    status: review.status,
                    paper_submitted: paper.submitted,
                })
            })
            .collect();
        Ok(rows)
    }
}

impl MemberStore for SnapshotStore {
    fn member(&self, id: MemberId) -> Result<Member> {
        self.data
            .members
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| OracleError::member_not_found(id))
    }

    fn member_by_email(&self, email: &str) -> Result<Member> {
        self.data
            .members
            .iter()
            .find(|m| m.email.eq_ignore_ascii_case(email))
            .cloned()
            .ok_or_else(|| OracleError::member_not_found(email))
    }

    fn pc_members(&self) -> Result<Vec<Member>> {
        Ok(self
            .data
            .members
            .iter()
            .filter(|m| m.is_pc)
            .cloned()
            .collect())
    }
}

impl AssignmentExecutor for SnapshotStore {
    /// All-or-nothing: instructions run against a copy that replaces the live
    /// data only if every instruction succeeds.
    fn execute(&mut self, batch: &MutationBatch) -> Result<ExecutionReport> {
        let mut staged = self.data.papers.clone();
        let mut report = ExecutionReport::default();
        for (index, instruction) in batch.instructions.iter().enumerate() {
            let outcome = match apply_instruction(&mut staged, instruction) {
                Ok(()) => InstructionOutcome {
                    index,
                    ok: true,
                    message: None,
                },
                Err(message) => InstructionOutcome {
                    index,
                    ok: false,
                    message: Some(message),
                },
            };
            report.outcomes.push(outcome);
        }
        if report.ok() {
            self.data.papers = staged;
            debug!(instructions = batch.len(), "committed assignment batch");
        } else {
            debug!(instructions = batch.len(), "rolled back assignment batch");
        }
        Ok(report)
    }
}

fn apply_instruction(
    papers: &mut [Paper],
    instruction: &AssignmentInstruction,
) -> std::result::Result<(), String> {
    let paper = papers
        .iter_mut()
        .find(|p| p.id == instruction.paper)
        .ok_or_else(|| format!("paper {} does not exist", instruction.paper))?;
    let reviewer = instruction.reviewer;
    match instruction.action {
        Action::Conflict(ConflictKind::None) => {
            paper.conflicts.remove(&reviewer);
        }
        Action::Conflict(kind) => {
            paper.conflicts.insert(reviewer, kind.code());
        }
        Action::Review(ReviewType::None) => {
            let in_progress = paper
                .reviews
                .iter()
                .any(|r| r.reviewer == reviewer && r.status > ReviewStatus::NotStarted);
            if in_progress {
                return Err(format!(
                    "{} has a review in progress on {}",
                    instruction.email, instruction.paper
                ));
            }
            paper.reviews.retain(|r| r.reviewer != reviewer);
        }
        Action::Review(review_type) => {
            if let Some(existing) = paper.reviews.iter_mut().find(|r| r.reviewer == reviewer) {
                existing.review_type = review_type;
                if instruction.round.is_some() {
                    existing.round = instruction.round.clone();
                }
            } else {
                let mut record = ReviewRecord::new(reviewer, review_type);
                record.round = instruction.round.clone();
                paper.reviews.push(record);
            }
        }
    }
    Ok(())
}
