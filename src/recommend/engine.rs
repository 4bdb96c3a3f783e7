use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use crate::conflict::classify;
use crate::recommend::eligibility::eligible_members;
use crate::recommend::{CandidateScore, RecommendOptions, Recommendation};
use crate::store::ConferenceStore;
use crate::track::TrackTag;
use crate::types::{Member, MemberId, Paper};
use crate::workload::WorkloadSnapshot;

pub fn score_candidates<S: ConferenceStore + ?Sized>(
    signals: &S,
    paper: &Paper,
    track: Option<&TrackTag>,
    pool: &[Member],
    workload: &WorkloadSnapshot,
    track_workload: Option<&WorkloadSnapshot>,
    exclude_conflicts: bool,
) -> Vec<CandidateScore> {
    let mut out = Vec::new();
    for (member, is_trackchair) in eligible_members(pool, paper, track) {
        let kind = classify(paper.conflict_code(member.id));
        let conflict =
            kind.is_conflicted() || kind.is_author() || signals.potential_conflict(member, paper);
        if exclude_conflicts && conflict {
            debug!(member = %member.id, paper = %paper.id, "excluding conflicted member");
            continue;
        }
        out.push(CandidateScore {
            member: member.id,
            name: member.display_name().to_string(),
            score: signals.topic_score(paper, member),
            conflict,
            review_count: workload.review_count(member.id),
            track_review_count: track_workload.map(|w| w.review_count(member.id)),
            preference: paper.preference(member.id),
            is_trackchair,
            assigned: paper.has_reviewer(member.id),
        });
    }
    out
}

/// Topic score descending, then load ascending, then preference descending.
pub fn compare_candidates(a: &CandidateScore, b: &CandidateScore) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.review_count.cmp(&b.review_count))
        .then_with(|| b.preference.cmp(&a.preference))
}

pub fn rank_candidates(candidates: &mut [CandidateScore]) {
    candidates.sort_by(compare_candidates);
}

pub fn select_recommended(ranked: &[CandidateScore], limit: usize, workload_cap: u32) -> Vec<MemberId> {
    let mut recommended = Vec::with_capacity(limit.min(ranked.len()));
    for candidate in ranked {
        if recommended.len() >= limit {
            break;
        }
        if candidate.review_count > workload_cap {
            debug!(
                member = %candidate.member,
                review_count = candidate.review_count,
                workload_cap,
                "over workload cap, not recommending"
            );
            continue;
        }
        recommended.push(candidate.member);
    }
    recommended
}

/// Assigned reviewers first, then recommended ones, then everyone else, each
/// group keeping its ranked order.
pub fn order_for_display(ranked: &[CandidateScore], recommended: &[MemberId]) -> Vec<MemberId> {
    let recommended: BTreeSet<MemberId> = recommended.iter().copied().collect();
    let mut ordered: Vec<&CandidateScore> = ranked.iter().collect();
    ordered.sort_by_key(|c| {
        if c.assigned {
            0u8
        } else if recommended.contains(&c.member) {
            1
        } else {
            2
        }
    });
    ordered.into_iter().map(|c| c.member).collect()
}

pub fn recommend_for<S: ConferenceStore + ?Sized>(
    signals: &S,
    paper: &Paper,
    track: Option<&TrackTag>,
    pool: &[Member],
    workload: &WorkloadSnapshot,
    track_workload: Option<&WorkloadSnapshot>,
    options: &RecommendOptions,
) -> Recommendation {
    // Existing primary/secondary reviewers switch recommendations off; the
    // candidate list is still produced, always without conflicted members.
    let suppressed = paper.has_primary_or_secondary();
    let exclude_conflicts = options.exclude_conflicts || suppressed;

    let mut ranked = score_candidates(
        signals,
        paper,
        track,
        pool,
        workload,
        track_workload,
        exclude_conflicts,
    );
    rank_candidates(&mut ranked);

    let recommended = if suppressed {
        Vec::new()
    } else {
        select_recommended(&ranked, options.limit, options.workload_cap)
    };
    let all = order_for_display(&ranked, &recommended);

    info!(
        paper = %paper.id,
        track = track.map(TrackTag::as_str).unwrap_or("default"),
        candidates = all.len(),
        recommended = recommended.len(),
        suppressed,
        "computed reviewer recommendations"
    );

    let scores: BTreeMap<MemberId, CandidateScore> =
        ranked.into_iter().map(|c| (c.member, c)).collect();
    Recommendation {
        paper: paper.id,
        track: track.cloned(),
        recommended,
        all,
        scores,
        suppressed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommend::DEFAULT_WORKLOAD_CAP;

    fn candidate(id: u32, score: f64, review_count: u32, preference: i32) -> CandidateScore {
        CandidateScore {
            member: MemberId(id),
            name: format!("m{id}"),
            score,
            conflict: false,
            review_count,
            track_review_count: None,
            preference,
            is_trackchair: false,
            assigned: false,
        }
    }

    fn ids(list: &[CandidateScore]) -> Vec<u32> {
        list.iter().map(|c| c.member.0).collect()
    }

    #[test]
    fn ranks_by_score_then_load_then_preference() {
        let mut list = vec![
            candidate(1, 2.0, 0, 0),
            candidate(2, 5.0, 3, 0),
            candidate(3, 5.0, 1, -2),
            candidate(4, 5.0, 1, 4),
            candidate(5, 5.0, 1, 4),
        ];
        rank_candidates(&mut list);
        assert_eq!(ids(&list), vec![4, 5, 3, 2, 1]);
    }

    #[test]
    fn selection_skips_overloaded_members() {
        let ranked = vec![
            candidate(1, 9.0, DEFAULT_WORKLOAD_CAP + 1, 0),
            candidate(2, 8.0, DEFAULT_WORKLOAD_CAP, 0),
            candidate(3, 7.0, 0, 0),
            candidate(4, 6.0, 0, 0),
        ];
        assert_eq!(
            select_recommended(&ranked, 2, DEFAULT_WORKLOAD_CAP),
            vec![MemberId(2), MemberId(3)]
        );
        assert!(select_recommended(&ranked, 0, DEFAULT_WORKLOAD_CAP).is_empty());
        assert_eq!(select_recommended(&ranked[..1], 3, DEFAULT_WORKLOAD_CAP).len(), 0);
    }

    #[test]
    fn display_order_puts_assigned_then_recommended_first() {
        let mut assigned = candidate(4, 1.0, 5, 0);
        assigned.assigned = true;
        let ranked = vec![
            candidate(1, 9.0, 9, 0),
            candidate(2, 8.0, 0, 0),
            candidate(3, 7.0, 0, 0),
            assigned,
        ];
        let order = order_for_display(&ranked, &[MemberId(2)]);
        assert_eq!(order, vec![MemberId(4), MemberId(2), MemberId(1), MemberId(3)]);
    }
}
