use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::track::{is_track_chair, is_track_member, TrackTag};
use crate::types::{Member, Paper};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IneligibleReason {
    NotPc,
    /// Conference chairs are left out unless they chair the paper's track.
    ChairOnly,
    NotAssignable,
    OutsideTrack,
}

impl Display for IneligibleReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::NotPc => "not a PC member",
            Self::ChairOnly => "chair is not a track chair for this paper",
            Self::NotAssignable => "not assignable in this track",
            Self::OutsideTrack => "not a member of the paper's track",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "status", content = "reason")]
pub enum Eligibility {
    Eligible { is_trackchair: bool },
    Ineligible(IneligibleReason),
}

impl Eligibility {
    pub fn is_eligible(self) -> bool {
        matches!(self, Self::Eligible { .. })
    }
}

pub fn evaluate_member(member: &Member, paper: &Paper, track: Option<&TrackTag>) -> Eligibility {
    if !member.is_pc {
        return Eligibility::Ineligible(IneligibleReason::NotPc);
    }
    let is_trackchair = is_track_chair(&member.track_roles, track);
    if member.is_chair && !is_trackchair {
        return Eligibility::Ineligible(IneligibleReason::ChairOnly);
    }
    if !member.track_assignable(track) && !paper.has_reviewer(member.id) && !is_trackchair {
        return Eligibility::Ineligible(IneligibleReason::NotAssignable);
    }
    if let Some(track) = track {
        if !is_track_member(&member.track_roles, track) && !is_trackchair {
            return Eligibility::Ineligible(IneligibleReason::OutsideTrack);
        }
    }
    Eligibility::Eligible { is_trackchair }
}

pub fn eligible_members<'a>(
    pool: &'a [Member],
    paper: &Paper,
    track: Option<&TrackTag>,
) -> Vec<(&'a Member, bool)> {
    pool.iter()
        .filter_map(|member| match evaluate_member(member, paper, track) {
            Eligibility::Eligible { is_trackchair } => Some((member, is_trackchair)),
            Eligibility::Ineligible(reason) => {
                tracing::debug!(member = %member.id, paper = %paper.id, ?reason, "skipping member");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MemberId, ReviewRecord, ReviewType};

    fn infosec() -> TrackTag {
        "infosec".parse().unwrap()
    }

    #[test]
    fn chairs_only_when_chairing_the_track() {
        let paper = Paper::new(1).with_tag("infosec");
        let chair = Member::new(1, "c@x.org").with_chair(true);
        let chair_tc = Member::new(2, "d@x.org")
            .with_chair(true)
            .with_tag("trackchair-infosec");
        assert_eq!(
            evaluate_member(&chair, &paper, Some(&infosec())),
            Eligibility::Ineligible(IneligibleReason::ChairOnly)
        );
        assert_eq!(
            evaluate_member(&chair_tc, &paper, Some(&infosec())),
            Eligibility::Eligible { is_trackchair: true }
        );
    }

    #[test]
    fn tracked_papers_need_members_or_chairs() {
        let paper = Paper::new(1).with_tag("infosec");
        let outsider = Member::new(1, "a@x.org").with_tag("trackmember-systems");
        let member = Member::new(2, "b@x.org").with_tag("trackmember-infosec");
        assert_eq!(
            evaluate_member(&outsider, &paper, Some(&infosec())),
            Eligibility::Ineligible(IneligibleReason::OutsideTrack)
        );
        assert!(evaluate_member(&member, &paper, Some(&infosec())).is_eligible());
        // no track filter for untracked papers
        assert!(evaluate_member(&outsider, &Paper::new(2), None).is_eligible());
    }

    #[test]
    fn existing_reviewer_bypasses_assignability() {
        let mut member = Member::new(3, "r@x.org").with_tag("trackmember-infosec");
        member.unassignable_tracks.push("infosec".to_string());
        let fresh = Paper::new(1).with_tag("infosec");
        let reviewed = Paper::new(2)
            .with_tag("infosec")
            .with_review(ReviewRecord::new(MemberId(3), ReviewType::Secondary));
        assert_eq!(
            evaluate_member(&member, &fresh, Some(&infosec())),
            Eligibility::Ineligible(IneligibleReason::NotAssignable)
        );
        assert!(evaluate_member(&member, &reviewed, Some(&infosec())).is_eligible());
    }

    #[test]
    fn non_pc_members_are_never_candidates() {
        let guest = Member::new(4, "g@x.org").with_pc(false);
        assert_eq!(
            evaluate_member(&guest, &Paper::new(1), None),
            Eligibility::Ineligible(IneligibleReason::NotPc)
        );
        let pool = vec![guest, Member::new(5, "p@x.org")];
        let eligible = eligible_members(&pool, &Paper::new(1), None);
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].0.id, MemberId(5));
    }
}
