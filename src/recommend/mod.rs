pub mod eligibility;
pub mod engine;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::store::ConferenceStore;
use crate::track::{paper_track, TrackTag};
use crate::types::{MemberId, PaperId};
use crate::workload::{load_for_track, load_global};

pub use eligibility::{eligible_members, evaluate_member, Eligibility, IneligibleReason};
pub use engine::{rank_candidates, recommend_for, select_recommended};

pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 3;
pub const DEFAULT_WORKLOAD_CAP: u32 = 6;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecommendOptions {
    pub limit: usize,
    pub workload_cap: u32,
    pub exclude_conflicts: bool,
}

impl Default for RecommendOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_RECOMMENDATION_LIMIT,
            workload_cap: DEFAULT_WORKLOAD_CAP,
            exclude_conflicts: true,
        }
    }
}

impl RecommendOptions {
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_workload_cap(mut self, workload_cap: u32) -> Self {
        self.workload_cap = workload_cap;
        self
    }

    pub fn with_exclude_conflicts(mut self, exclude_conflicts: bool) -> Self {
        self.exclude_conflicts = exclude_conflicts;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateScore {
    pub member: MemberId,
    pub name: String,
    pub score: f64,
    pub conflict: bool,
    pub review_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_review_count: Option<u32>,
    pub preference: i32,
    pub is_trackchair: bool,
    pub assigned: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub paper: PaperId,
    pub track: Option<TrackTag>,
    pub recommended: Vec<MemberId>,
    pub all: Vec<MemberId>,
    pub scores: BTreeMap<MemberId, CandidateScore>,
    pub suppressed: bool,
}

impl Recommendation {
    pub fn candidates(&self) -> impl Iterator<Item = &CandidateScore> {
        self.all.iter().filter_map(|id| self.scores.get(id))
    }

    pub fn is_recommended(&self, member: MemberId) -> bool {
        self.recommended.contains(&member)
    }
}

pub fn recommend<S: ConferenceStore + ?Sized>(
    store: &S,
    paper_id: PaperId,
    track_order: &[TrackTag],
    options: &RecommendOptions,
) -> Result<Recommendation> {
    let paper = store.paper(paper_id)?;
    let pool = store.pc_members()?;
    let track = paper_track(&paper, track_order);
    let workload = load_global(store)?;
    let track_workload = match &track {
        Some(track) => Some(load_for_track(store, track)?),
        None => None,
    };
    Ok(recommend_for(
        store,
        &paper,
        track.as_ref(),
        &pool,
        &workload,
        track_workload.as_ref(),
        options,
    ))
}
