pub mod snapshot;

use std::collections::BTreeSet;

use crate::assignment::{ExecutionReport, MutationBatch};
use crate::error::Result;
use crate::track::TrackTag;
use crate::types::{Member, MemberId, Paper, PaperId};
use crate::workload::ReviewRow;

pub use snapshot::{ConferenceData, SnapshotStore};

pub trait PaperStore {
    fn paper(&self, id: PaperId) -> Result<Paper>;

    fn papers(&self) -> Result<Vec<Paper>>;

    fn track_tags(&self) -> Result<Vec<TrackTag>>;

    fn paper_ids_with_tag(&self, tag: &TrackTag) -> Result<BTreeSet<PaperId>>;

    fn review_rows(&self) -> Result<Vec<ReviewRow>>;

    fn topic_score(&self, paper: &Paper, member: &Member) -> f64 {
        topic_interest_score(paper, member)
    }
}

pub trait MemberStore {
    fn member(&self, id: MemberId) -> Result<Member>;

    fn member_by_email(&self, email: &str) -> Result<Member>;

    fn pc_members(&self) -> Result<Vec<Member>>;

    fn potential_conflict(&self, member: &Member, paper: &Paper) -> bool {
        affiliation_conflict(member, paper)
    }

    fn resolve_member(&self, key: &str) -> Result<Member> {
        match key.trim().parse::<MemberId>() {
            Ok(id) => self.member(id),
            Err(_) => self.member_by_email(key.trim()),
        }
    }
}

pub trait ConferenceStore: PaperStore + MemberStore {}

impl<T: PaperStore + MemberStore + ?Sized> ConferenceStore for T {}

/// Applies declarative assignment batches. `&mut self` means a single store
/// handle executes one batch at a time.
pub trait AssignmentExecutor {
    fn execute(&mut self, batch: &MutationBatch) -> Result<ExecutionReport>;
}

pub fn topic_interest_score(paper: &Paper, member: &Member) -> f64 {
    paper
        .topics
        .iter()
        .filter_map(|topic| member.topic_interests.get(topic))
        .map(|v| f64::from(*v))
        .sum()
}

pub fn affiliation_conflict(member: &Member, paper: &Paper) -> bool {
    let affiliation = normalize_text(&member.affiliation);
    let collaborators: Vec<String> = member
        .collaborators
        .iter()
        .map(|c| normalize_text(c))
        .filter(|c| !c.is_empty())
        .collect();
    paper.authors.iter().any(|author| {
        let author_affiliation = normalize_text(&author.affiliation);
        let same_affiliation = !affiliation.is_empty() && affiliation == author_affiliation;
        let name = normalize_text(&author.name);
        same_affiliation || (!name.is_empty() && collaborators.contains(&name))
    })
}

fn normalize_text(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_score_sums_matching_interests() {
        let paper = Paper::new(1).with_topics(&[1, 2, 3]);
        let member = Member::new(1, "a@x.org")
            .with_interest(1, 2)
            .with_interest(3, -1)
            .with_interest(9, 5);
        assert_eq!(topic_interest_score(&paper, &member), 1.0);
    }

    #[test]
    fn affiliation_heuristic_matches_normalized_text() {
        let paper = Paper::new(1).with_author("Ada Lovelace", "  Analytical  Engines Ltd ");
        let same = Member::new(1, "a@x.org").with_affiliation("analytical engines ltd");
        let other = Member::new(2, "b@x.org").with_affiliation("Difference Works");
        let empty = Member::new(3, "c@x.org");
        assert!(affiliation_conflict(&same, &paper));
        assert!(!affiliation_conflict(&other, &paper));
        assert!(!affiliation_conflict(&empty, &Paper::new(2).with_author("X", "")));

        let mut collaborator = Member::new(4, "d@x.org");
        collaborator.collaborators.push("ADA lovelace".to_string());
        assert!(affiliation_conflict(&collaborator, &paper));
    }
}
