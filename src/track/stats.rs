use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::conflict::is_author;
use crate::track::{paper_track, TrackTag};
use crate::types::{Member, MemberId, Paper};

pub const DEFAULT_BUCKET: &str = "default";
pub const SUMMARY_ROW: &str = "ALL";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackStats {
    pub track: String,
    pub name: String,
    pub total_papers: usize,
    pub registered: usize,
    pub submitted: usize,
}

impl TrackStats {
    fn empty(track: &str, name: &str) -> Self {
        Self {
            track: track.to_string(),
            name: name.to_string(),
            total_papers: 0,
            registered: 0,
            submitted: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackSubmissionReport {
    pub tracks: Vec<TrackStats>,
    pub non_pc_authors_total: usize,
}

/// Per-track submission counts, one bucket per track in `track_order` plus a
/// trailing default bucket for untracked papers. Withdrawn papers are skipped.
pub fn track_submission_stats<'a, F>(
    papers: &[Paper],
    pc_members: &[Member],
    track_order: &'a [TrackTag],
    display_name: F,
) -> TrackSubmissionReport
where
    F: Fn(&'a str) -> &'a str,
{
    let mut buckets: Vec<TrackStats> = track_order
        .iter()
        .map(|t| TrackStats::empty(t.as_str(), display_name(t.as_str())))
        .collect();
    buckets.push(TrackStats::empty(DEFAULT_BUCKET, display_name(DEFAULT_BUCKET)));
    let default_idx = buckets.len() - 1;

    let pc: BTreeSet<MemberId> = pc_members.iter().filter(|m| m.is_pc).map(|m| m.id).collect();
    let mut non_pc_authors: BTreeSet<MemberId> = BTreeSet::new();

    for paper in papers.iter().filter(|p| !p.withdrawn) {
        let idx = paper_track(paper, track_order)
            .and_then(|t| track_order.iter().position(|o| *o == t))
            .unwrap_or(default_idx);
        let bucket = &mut buckets[idx];
        bucket.total_papers += 1;
        if paper.submitted {
            bucket.submitted += 1;
        } else {
            bucket.registered += 1;
        }

        non_pc_authors.extend(
            paper
                .conflicts
                .iter()
                .filter(|(id, code)| is_author(**code) && !pc.contains(*id))
                .map(|(id, _)| *id),
        );
    }

    TrackSubmissionReport {
        tracks: buckets,
        non_pc_authors_total: non_pc_authors.len(),
    }
}
