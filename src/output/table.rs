use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};

use crate::assignment::{BatchOutcome, MutationBatch, Severity};
use crate::recommend::Recommendation;
use crate::track::{TrackSubmissionReport, SUMMARY_ROW};
use crate::workload::WorkloadRow;

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn render_recommendation_table(rec: &Recommendation) -> String {
    let mut table = new_table();
    let mut header = vec!["Member", "Name", "Status", "Score", "Reviews"];
    let has_track = rec.track.is_some();
    if has_track {
        header.push("Track Reviews");
    }
    header.extend(["Pref", "Conflict"]);
    table.set_header(header);

    for c in rec.candidates() {
        let status = if c.assigned {
            Cell::new("ASSIGNED").fg(Color::Cyan)
        } else if rec.is_recommended(c.member) {
            Cell::new("RECOMMENDED").fg(Color::Green)
        } else {
            Cell::new("-")
        };
        let name = if c.is_trackchair {
            format!("{} (track chair)", c.name)
        } else {
            c.name.clone()
        };
        let mut row = vec![
            Cell::new(c.member.to_string()),
            Cell::new(name),
            status,
            Cell::new(format!("{:.1}", c.score)),
            Cell::new(c.review_count),
        ];
        if has_track {
            row.push(Cell::new(
                c.track_review_count
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ));
        }
        row.push(Cell::new(c.preference));
        row.push(if c.conflict {
            Cell::new("YES").fg(Color::Red)
        } else {
            Cell::new("")
        });
        table.add_row(Row::from(row));
    }

    let track = rec
        .track
        .as_ref()
        .map(|t| t.to_string())
        .unwrap_or_else(|| "none".to_string());
    let mut out = format!("Paper {} (track: {track})\n", rec.paper);
    out.push_str(&table.to_string());
    if rec.suppressed {
        out.push_str("\nPrimary/secondary reviewers already assigned; no recommendations.");
    } else if rec.recommended.is_empty() {
        out.push_str("\nNo candidate under the workload cap.");
    }
    out
}

pub fn render_workload_table(rows: &[WorkloadRow]) -> String {
    let mut table = new_table();
    let has_track = rows.iter().any(|r| r.track.is_some());
    let mut header = vec!["Member", "Name", "Reviews", "Primary", "Secondary", "Meta"];
    if has_track {
        header.extend(["Track Reviews", "Track Pri", "Track Sec", "Track Meta"]);
    }
    table.set_header(header);

    for r in rows {
        let mut row = vec![
            r.member.to_string(),
            r.name.clone(),
            r.global.rev.to_string(),
            r.global.pri.to_string(),
            r.global.sec.to_string(),
            r.global.meta.to_string(),
        ];
        if let Some(t) = r.track {
            row.extend([
                t.rev.to_string(),
                t.pri.to_string(),
                t.sec.to_string(),
                t.meta.to_string(),
            ]);
        }
        table.add_row(row);
    }
    table.to_string()
}

pub fn render_batch_table(batch: &MutationBatch) -> String {
    if batch.is_empty() {
        return "No changes.".to_string();
    }
    let mut table = new_table();
    table.set_header(vec!["Paper", "Action", "Email", "Round"]);
    for i in &batch.instructions {
        table.add_row(vec![
            i.paper.to_string(),
            i.action.to_string(),
            i.email.clone(),
            i.round.clone().unwrap_or_else(|| "-".to_string()),
        ]);
    }
    table.to_string()
}

pub fn render_outcome_table(outcome: &BatchOutcome) -> String {
    let mut out = String::new();
    let status = if outcome.ok { "OK" } else { "FAILED" };
    out.push_str(&format!(
        "{status}: {} instruction(s) applied at {}\n",
        outcome.applied,
        outcome.finished_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    if outcome.messages.is_empty() {
        return out;
    }
    let mut table = new_table();
    table.set_header(vec!["Severity", "Paper", "Reviewer", "Message"]);
    for m in &outcome.messages {
        let severity = match m.severity {
            Severity::Warning => Cell::new("WARN").fg(Color::Yellow),
            Severity::Error => Cell::new("ERROR").fg(Color::Red),
        };
        table.add_row(Row::from(vec![
            severity,
            Cell::new(m.paper.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string())),
            Cell::new(m.reviewer.clone().unwrap_or_else(|| "-".to_string())),
            Cell::new(&m.text),
        ]));
    }
    out.push_str(&table.to_string());
    out
}

pub fn render_track_stats_table(report: &TrackSubmissionReport) -> String {
    let mut table = new_table();
    table.set_header(vec!["Track", "Papers", "Registered", "Submitted", "Non-PC Authors"]);
    for s in &report.tracks {
        table.add_row(vec![
            s.name.clone(),
            s.total_papers.to_string(),
            s.registered.to_string(),
            s.submitted.to_string(),
            String::new(),
        ]);
    }
    table.add_row(vec![
        SUMMARY_ROW.to_string(),
        String::new(),
        String::new(),
        String::new(),
        report.non_pc_authors_total.to_string(),
    ]);
    table.to_string()
}
