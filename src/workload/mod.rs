pub mod index;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::store::PaperStore;
use crate::track::TrackTag;
use crate::types::{Member, MemberId};

pub use index::{load_for_track, load_global, tally, ReviewRow};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct WorkloadCount {
    pub rev: u32,
    pub pri: u32,
    pub sec: u32,
    pub meta: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "scope", content = "track")]
pub enum WorkloadScope {
    Global,
    Track(TrackTag),
}

/// Read-only workload view built for one request. Reviewers without an entry
/// count as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadSnapshot {
    pub scope: WorkloadScope,
    counts: BTreeMap<MemberId, WorkloadCount>,
}

impl WorkloadSnapshot {
    pub fn new(scope: WorkloadScope, counts: BTreeMap<MemberId, WorkloadCount>) -> Self {
        Self { scope, counts }
    }

    pub fn empty(scope: WorkloadScope) -> Self {
        Self::new(scope, BTreeMap::new())
    }

    pub fn get(&self, member: MemberId) -> WorkloadCount {
        self.counts.get(&member).copied().unwrap_or_default()
    }

    pub fn review_count(&self, member: MemberId) -> u32 {
        self.get(member).rev
    }
}

pub fn workload_snapshot<S: PaperStore + ?Sized>(
    store: &S,
    scope: &WorkloadScope,
) -> Result<WorkloadSnapshot> {
    match scope {
        WorkloadScope::Global => load_global(store),
        WorkloadScope::Track(track) => load_for_track(store, track),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadRow {
    pub member: MemberId,
    pub name: String,
    pub email: String,
    pub global: WorkloadCount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track: Option<WorkloadCount>,
}

pub fn workload_view(
    members: &[Member],
    global: &WorkloadSnapshot,
    track: Option<&WorkloadSnapshot>,
) -> Vec<WorkloadRow> {
    let mut rows: Vec<WorkloadRow> = members
        .iter()
        .map(|m| WorkloadRow {
            member: m.id,
            name: m.display_name().to_string(),
            email: m.email.clone(),
            global: global.get(m.id),
            track: track.map(|t| t.get(m.id)),
        })
        .collect();
    rows.sort_by_key(|r| r.member);
    rows
}
