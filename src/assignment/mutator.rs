use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::assignment::{
    Action, AssignmentInstruction, AssignmentSettings, AssignmentTarget, BatchMessage,
    BatchOutcome, DesiredAssignment, MutationBatch,
};
use crate::conflict::ConflictKind;
use crate::error::{OracleError, Result};
use crate::recommend::{evaluate_member, Eligibility};
use crate::store::{AssignmentExecutor, ConferenceStore};
use crate::track::paper_track;
use crate::types::{Member, MemberId, Paper, PaperId, ReviewType};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssignmentResult {
    pub batch: MutationBatch,
    pub outcome: BatchOutcome,
}

/// Diffs `desired` against the paper's current state for `member`. Returns
/// nothing when the pair already matches or when the member is an author.
pub fn plan_assignment(
    paper: &Paper,
    member: &Member,
    desired: DesiredAssignment,
    round: Option<&str>,
) -> Vec<AssignmentInstruction> {
    let current_conflict = paper.conflict_kind(member.id);
    if current_conflict.is_author() {
        debug!(paper = %paper.id, member = %member.id, "author conflict, leaving pair untouched");
        return Vec::new();
    }

    let mut out = Vec::with_capacity(2);
    let instruction = |action: Action, round: Option<&str>| AssignmentInstruction {
        paper: paper.id,
        reviewer: member.id,
        email: member.email.clone(),
        action,
        round: round.map(str::to_string),
    };

    let new_conflict = match (current_conflict, desired.conflict) {
        (ConflictKind::General { .. }, true) => current_conflict,
        (_, true) => ConflictKind::General { pinned: true },
        (_, false) => ConflictKind::None,
    };
    if new_conflict != current_conflict {
        out.push(instruction(Action::Conflict(new_conflict), None));
    }

    let new_review = if desired.conflict {
        ReviewType::None
    } else {
        desired.review
    };
    if new_review != paper.review_type(member.id) {
        let round = if new_review == ReviewType::None { None } else { round };
        out.push(instruction(Action::Review(new_review), round));
    }
    out
}

/// Resolves and validates raw targets, collecting the instructions needed to
/// reach them. Unknown papers or reviewers abort; any other bad pair is
/// skipped with a warning. When a pair is named more than once the last valid
/// target wins.
pub fn plan_batch<S: ConferenceStore + ?Sized>(
    store: &S,
    targets: &[AssignmentTarget],
    settings: &AssignmentSettings,
) -> Result<MutationBatch> {
    let mut batch = MutationBatch::default();
    let mut papers: BTreeMap<PaperId, Paper> = BTreeMap::new();
    let mut planned: Vec<((PaperId, MemberId), Vec<AssignmentInstruction>)> = Vec::new();
    for target in targets {
        let paper = match papers.entry(target.paper) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(store.paper(target.paper)?),
        };
        batch.papers.insert(paper.id);
        let member = store.resolve_member(&target.reviewer)?;
        let desired = match target.value.parse::<DesiredAssignment>() {
            Ok(desired) => desired,
            Err(e) => {
                let err = OracleError::validation(e.to_string());
                warn!(paper = %target.paper, reviewer = %target.reviewer, "{err}");
                batch
                    .messages
                    .push(BatchMessage::warning(target.paper, &member.email, err.to_string()));
                continue;
            }
        };
        let round = target.round.as_deref();
        let Some(instructions) =
            plan_target(paper, &member, desired, round, settings, &mut batch.messages)
        else {
            continue;
        };
        let pair = (paper.id, member.id);
        match planned.iter_mut().find(|(p, _)| *p == pair) {
            Some((_, slot)) => {
                debug!(paper = %paper.id, member = %member.id, "pair repeated, keeping the later target");
                *slot = instructions;
            }
            None => planned.push((pair, instructions)),
        }
    }
    batch.instructions = planned.into_iter().flat_map(|(_, i)| i).collect();
    debug!(
        targets = targets.len(),
        instructions = batch.len(),
        warnings = batch.messages.len(),
        "planned assignment batch"
    );
    Ok(batch)
}

fn plan_target(
    paper: &Paper,
    member: &Member,
    desired: DesiredAssignment,
    round: Option<&str>,
    settings: &AssignmentSettings,
    messages: &mut Vec<BatchMessage>,
) -> Option<Vec<AssignmentInstruction>> {
    let track = paper_track(paper, &settings.track_order);
    if let Eligibility::Ineligible(reason) = evaluate_member(member, paper, track.as_ref()) {
        warn!(paper = %paper.id, member = %member.id, %reason, "skipping assignment");
        let err = OracleError::validation(format!("{}: {reason}", member.email));
        messages.push(BatchMessage::warning(paper.id, &member.email, err.to_string()));
        return None;
    }
    let round = round
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(settings.default_round.as_str());
    Some(plan_assignment(paper, member, desired, Some(round)))
}

pub fn apply_batch<E: AssignmentExecutor + ?Sized>(
    executor: &mut E,
    batch: &MutationBatch,
) -> BatchOutcome {
    let mut messages = batch.messages.clone();
    let mut papers: BTreeMap<PaperId, bool> = batch
        .papers
        .iter()
        .copied()
        .chain(batch.instructions.iter().map(|i| i.paper))
        .map(|paper| (paper, true))
        .collect();

    if batch.is_empty() {
        info!("assignment batch has no changes");
        return BatchOutcome {
            ok: true,
            applied: 0,
            papers,
            messages,
            finished_at: Utc::now(),
        };
    }

    let (ok, applied) = match executor.execute(batch) {
        Ok(report) => {
            for outcome in report.outcomes.iter().filter(|o| !o.ok) {
                let paper = batch.instructions.get(outcome.index).map(|i| i.paper);
                if let Some(paper) = paper {
                    papers.insert(paper, false);
                }
                let text = outcome
                    .message
                    .clone()
                    .unwrap_or_else(|| "assignment failed".to_string());
                messages.push(BatchMessage::error(paper, text));
            }
            (report.ok(), report.outcomes.iter().filter(|o| o.ok).count())
        }
        Err(e) => {
            papers.values_mut().for_each(|ok| *ok = false);
            messages.push(BatchMessage::error(None, e.to_string()));
            (false, 0)
        }
    };

    info!(
        instructions = batch.len(),
        applied,
        ok,
        "applied assignment batch"
    );
    BatchOutcome {
        ok,
        applied,
        papers,
        messages,
        finished_at: Utc::now(),
    }
}

pub fn apply_assignment<S>(
    store: &mut S,
    paper: PaperId,
    reviewer: &str,
    desired: DesiredAssignment,
    round: Option<&str>,
    settings: &AssignmentSettings,
) -> Result<AssignmentResult>
where
    S: ConferenceStore + AssignmentExecutor + ?Sized,
{
    let current = store.paper(paper)?;
    let member = store.resolve_member(reviewer)?;
    let mut batch = MutationBatch::default();
    batch.papers.insert(current.id);
    if let Some(instructions) =
        plan_target(&current, &member, desired, round, settings, &mut batch.messages)
    {
        batch.instructions = instructions;
    }
    let outcome = apply_batch(store, &batch);
    Ok(AssignmentResult { batch, outcome })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ConferenceData, PaperStore, SnapshotStore};
    use crate::types::{ReviewRecord, ReviewStatus};

    fn store() -> SnapshotStore {
        SnapshotStore::new(ConferenceData {
            tracks: vec!["infosec".parse().unwrap()],
            members: vec![
                Member::new(1, "a@x.org").with_tag("trackmember-infosec"),
                Member::new(2, "b@x.org").with_tag("trackmember-infosec"),
                Member::new(3, "guest@x.org").with_pc(false),
                Member::new(4, "out@x.org").with_tag("trackmember-systems"),
            ],
            papers: vec![Paper::new(10)
                .with_tag("infosec")
                .with_conflict(MemberId(2), ConflictKind::Author)],
        })
    }

    fn settings() -> AssignmentSettings {
        AssignmentSettings {
            track_order: vec!["infosec".parse().unwrap()],
            ..AssignmentSettings::default()
        }
    }

    fn target(reviewer: &str, value: &str) -> AssignmentTarget {
        AssignmentTarget {
            paper: PaperId(10),
            reviewer: reviewer.to_string(),
            value: value.to_string(),
            round: None,
        }
    }

    #[test]
    fn second_application_is_a_no_op() {
        let mut store = store();
        let desired = DesiredAssignment::review(ReviewType::Primary);
        let first = apply_assignment(&mut store, PaperId(10), "1", desired, None, &settings()).unwrap();
        assert_eq!(first.batch.len(), 1);
        assert!(first.outcome.ok);
        assert_eq!(first.outcome.papers.get(&PaperId(10)), Some(&true));

        let second = apply_assignment(&mut store, PaperId(10), "a@x.org", desired, None, &settings()).unwrap();
        assert!(second.batch.is_empty());
        assert_eq!(second.outcome.applied, 0);
        let review = store.paper(PaperId(10)).unwrap().review_by(MemberId(1)).cloned().unwrap();
        assert_eq!(review.round.as_deref(), Some("R1"));
    }

    #[test]
    fn author_conflicts_survive_every_value() {
        let mut store = store();
        for value in ["0", "2", "3", "4", "5", "-1"] {
            let desired: DesiredAssignment = value.parse().unwrap();
            let result = apply_assignment(&mut store, PaperId(10), "2", desired, None, &settings()).unwrap();
            assert!(result.batch.is_empty(), "{value}");
        }
        let paper = store.paper(PaperId(10)).unwrap();
        assert_eq!(paper.conflict_kind(MemberId(2)), ConflictKind::Author);
        assert_eq!(paper.review_type(MemberId(2)), ReviewType::None);
    }

    #[test]
    fn conflict_replaces_review_and_toggles_back() {
        let mut store = store();
        let s = settings();
        apply_assignment(&mut store, PaperId(10), "1", DesiredAssignment::review(ReviewType::Secondary), None, &s).unwrap();

        let result = apply_assignment(&mut store, PaperId(10), "1", DesiredAssignment::conflicted(), None, &s).unwrap();
        let actions: Vec<Action> = result.batch.instructions.iter().map(|i| i.action).collect();
        assert_eq!(
            actions,
            vec![
                Action::Conflict(ConflictKind::General { pinned: true }),
                Action::Review(ReviewType::None),
            ]
        );
        let paper = store.paper(PaperId(10)).unwrap();
        assert!(paper.conflict_kind(MemberId(1)).is_conflicted());
        assert!(!paper.has_reviewer(MemberId(1)));

        let result = apply_assignment(&mut store, PaperId(10), "1", DesiredAssignment::review(ReviewType::PcOptional), Some("R2"), &s).unwrap();
        assert_eq!(result.batch.len(), 2);
        let paper = store.paper(PaperId(10)).unwrap();
        assert_eq!(paper.conflict_kind(MemberId(1)), ConflictKind::None);
        assert_eq!(paper.review_by(MemberId(1)).and_then(|r| r.round.clone()).as_deref(), Some("R2"));
    }

    #[test]
    fn invalid_pairs_are_skipped_with_warnings() {
        let store = store();
        let batch = plan_batch(
            &store,
            &[
                target("guest@x.org", "4"),
                target("out@x.org", "4"),
                target("1", "external"),
                target("1", "3"),
            ],
            &settings(),
        )
        .unwrap();
        assert_eq!(batch.messages.len(), 3);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.instructions[0].action, Action::Review(ReviewType::Secondary));
    }

    #[test]
    fn repeated_pair_keeps_the_later_target() {
        let mut store = store();
        let batch = plan_batch(&store, &[target("1", "-1"), target("1", "primary")], &settings()).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.instructions[0].action, Action::Review(ReviewType::Primary));
        let outcome = apply_batch(&mut store, &batch);
        assert!(outcome.ok);
        let paper = store.paper(PaperId(10)).unwrap();
        assert!(!paper.conflict_kind(MemberId(1)).is_conflicted());
        assert_eq!(paper.review_type(MemberId(1)), ReviewType::Primary);

        let batch = plan_batch(&store, &[target("1", "4"), target("a@x.org", "-1")], &settings()).unwrap();
        let actions: Vec<Action> = batch.instructions.iter().map(|i| i.action).collect();
        assert_eq!(
            actions,
            vec![
                Action::Conflict(ConflictKind::General { pinned: true }),
                Action::Review(ReviewType::None),
            ]
        );
    }

    #[test]
    fn skipped_papers_still_get_an_outcome() {
        let mut store = store();
        let batch = plan_batch(&store, &[target("guest@x.org", "4")], &settings()).unwrap();
        assert!(batch.is_empty());
        let outcome = apply_batch(&mut store, &batch);
        assert!(outcome.ok);
        assert_eq!(outcome.papers.get(&PaperId(10)), Some(&true));
        assert_eq!(outcome.messages.len(), 1);
    }

    #[test]
    fn unknown_reviewer_aborts_the_batch() {
        let store = store();
        let err = plan_batch(&store, &[target("1", "4"), target("nobody@x.org", "4")], &settings())
            .unwrap_err();
        assert!(err.is_not_found());
        let err = plan_batch(
            &store,
            &[AssignmentTarget {
                paper: PaperId(99),
                ..target("1", "4")
            }],
            &settings(),
        )
        .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn store_rejections_are_reported_per_paper() {
        let mut data = store().data().clone();
        data.papers[0]
            .reviews
            .push(ReviewRecord::new(MemberId(1), ReviewType::Primary).with_status(ReviewStatus::Drafted));
        let mut store = SnapshotStore::new(data);
        let result = apply_assignment(&mut store, PaperId(10), "1", DesiredAssignment::conflicted(), None, &settings()).unwrap();
        assert!(!result.outcome.ok);
        assert_eq!(result.outcome.papers.get(&PaperId(10)), Some(&false));
        assert!(result
            .outcome
            .messages
            .iter()
            .any(|m| m.text.contains("review in progress")));
        // rolled back as a whole
        let paper = store.paper(PaperId(10)).unwrap();
        assert_eq!(paper.conflict_kind(MemberId(1)), ConflictKind::None);
    }
}
