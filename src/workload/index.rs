use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::store::PaperStore;
use crate::track::TrackTag;
use crate::types::{MemberId, PaperId, ReviewStatus, ReviewType};
use crate::workload::{WorkloadCount, WorkloadScope, WorkloadSnapshot};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReviewRow {
    pub paper: PaperId,
    pub reviewer: MemberId,
    pub review_type: ReviewType,
    pub status: ReviewStatus,
    pub paper_submitted: bool,
}

impl ReviewRow {
    /// PC-level reviews count once submitted, once approval is requested, or
    /// as soon as the paper itself is submitted.
    pub fn is_countable(&self) -> bool {
        self.review_type.is_pc_review()
            && (matches!(
                self.status,
                ReviewStatus::Submitted | ReviewStatus::ApprovalRequested
            ) || self.paper_submitted)
    }
}

pub fn tally<'a, I>(rows: I) -> BTreeMap<MemberId, WorkloadCount>
where
    I: IntoIterator<Item = &'a ReviewRow>,
{
    let mut counts: BTreeMap<MemberId, WorkloadCount> = BTreeMap::new();
    for row in rows.into_iter().filter(|r| r.is_countable()) {
        let count = counts.entry(row.reviewer).or_default();
        count.rev += 1;
        match row.review_type {
            ReviewType::Primary => count.pri += 1,
            ReviewType::Secondary => count.sec += 1,
            ReviewType::Meta => count.meta += 1,
            _ => {}
        }
    }
    counts
}

pub fn load_global<S: PaperStore + ?Sized>(store: &S) -> Result<WorkloadSnapshot> {
    let rows = store.review_rows()?;
    let counts = tally(&rows);
    debug!(reviewers = counts.len(), rows = rows.len(), "loaded global workload");
    Ok(WorkloadSnapshot::new(WorkloadScope::Global, counts))
}

pub fn load_for_track<S: PaperStore + ?Sized>(
    store: &S,
    track: &TrackTag,
) -> Result<WorkloadSnapshot> {
    let papers = store.paper_ids_with_tag(track)?;
    if papers.is_empty() {
        return Ok(WorkloadSnapshot::empty(WorkloadScope::Track(track.clone())));
    }
    let rows = store.review_rows()?;
    let counts = tally(rows.iter().filter(|r| papers.contains(&r.paper)));
    debug!(%track, reviewers = counts.len(), papers = papers.len(), "loaded track workload");
    Ok(WorkloadSnapshot::new(WorkloadScope::Track(track.clone()), counts))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(paper: u32, reviewer: u32, ty: ReviewType, status: ReviewStatus, submitted: bool) -> ReviewRow {
        ReviewRow {
            paper: PaperId(paper),
            reviewer: MemberId(reviewer),
            review_type: ty,
            status,
            paper_submitted: submitted,
        }
    }

    #[test]
    fn counts_only_countable_pc_reviews() {
        let rows = vec![
            row(1, 10, ReviewType::Primary, ReviewStatus::NotStarted, true),
            row(2, 10, ReviewType::Secondary, ReviewStatus::Submitted, false),
            row(3, 10, ReviewType::Meta, ReviewStatus::ApprovalRequested, false),
            row(4, 10, ReviewType::PcOptional, ReviewStatus::Drafted, false),
            row(5, 10, ReviewType::External, ReviewStatus::Submitted, true),
            row(6, 10, ReviewType::Request, ReviewStatus::NotStarted, true),
            row(1, 11, ReviewType::PcOptional, ReviewStatus::NotStarted, true),
        ];
        let counts = tally(&rows);
        let a = counts[&MemberId(10)];
        assert_eq!(a, WorkloadCount { rev: 3, pri: 1, sec: 1, meta: 1 });
        let b = counts[&MemberId(11)];
        assert_eq!(b, WorkloadCount { rev: 1, pri: 0, sec: 0, meta: 0 });
    }

    #[test]
    fn typed_tallies_never_exceed_total() {
        let rows: Vec<ReviewRow> = (0..20)
            .map(|i| {
                let ty = ReviewType::ASSIGNABLE[(i % 5) as usize];
                row(i, 1 + i % 3, ty, ReviewStatus::Submitted, i % 2 == 0)
            })
            .collect();
        for count in tally(&rows).values() {
            assert!(count.pri + count.sec + count.meta <= count.rev);
        }
    }

    #[test]
    fn missing_reviewer_reads_as_zero() {
        let snapshot = WorkloadSnapshot::empty(WorkloadScope::Global);
        assert_eq!(snapshot.get(MemberId(99)), WorkloadCount::default());
        assert_eq!(snapshot.review_count(MemberId(99)), 0);
    }
}
