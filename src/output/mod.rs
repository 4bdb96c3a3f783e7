pub mod csv;
pub mod json;
pub mod table;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::assignment::{BatchOutcome, MutationBatch};
use crate::recommend::Recommendation;
use crate::track::{TrackSubmissionReport, SUMMARY_ROW};
use crate::workload::WorkloadRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Table => "table",
            Self::Json => "json",
            Self::Csv => "csv",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
#[error("unknown output format: {0} (expected table, json or csv)")]
pub struct OutputFormatParseError(pub String);

impl FromStr for OutputFormat {
    type Err = OutputFormatParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            _ => Err(OutputFormatParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TabularCell {
    Text(String),
    Integer(i64),
    Number(f64),
}

impl Display for TabularCell {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Number(v) => write!(f, "{v:.2}"),
        }
    }
}

impl From<&str> for TabularCell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for TabularCell {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<u32> for TabularCell {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<i32> for TabularCell {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<usize> for TabularCell {
    fn from(value: usize) -> Self {
        Self::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for TabularCell {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for TabularCell {
    fn from(value: bool) -> Self {
        Self::Text(if value { "yes" } else { "no" }.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TabularExport {
    pub header: Vec<String>,
    pub rows: Vec<Vec<TabularCell>>,
}

impl TabularExport {
    pub fn new(header: &[&str]) -> Self {
        Self {
            header: header.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<TabularCell>) {
        self.rows.push(row);
    }
}

pub trait TabularSink {
    fn write_header(&mut self, header: &[String]) -> anyhow::Result<()>;

    fn write_row(&mut self, row: &[TabularCell]) -> anyhow::Result<()>;

    fn export(&mut self, table: &TabularExport) -> anyhow::Result<()> {
        self.write_header(&table.header)?;
        for row in &table.rows {
            self.write_row(row)?;
        }
        Ok(())
    }
}

pub fn recommendation_export(rec: &Recommendation) -> TabularExport {
    let mut out = TabularExport::new(&[
        "paper",
        "member",
        "name",
        "recommended",
        "assigned",
        "score",
        "review_count",
        "track_review_count",
        "preference",
        "conflict",
        "trackchair",
    ]);
    for c in rec.candidates() {
        out.push(vec![
            TabularCell::Integer(i64::from(rec.paper.0)),
            c.member.0.into(),
            c.name.clone().into(),
            rec.is_recommended(c.member).into(),
            c.assigned.into(),
            c.score.into(),
            c.review_count.into(),
            c.track_review_count
                .map(TabularCell::from)
                .unwrap_or_else(|| "".into()),
            c.preference.into(),
            c.conflict.into(),
            c.is_trackchair.into(),
        ]);
    }
    out
}

pub fn workload_export(rows: &[WorkloadRow]) -> TabularExport {
    let mut out = TabularExport::new(&[
        "member",
        "email",
        "rev",
        "pri",
        "sec",
        "meta",
        "track_rev",
        "track_pri",
        "track_sec",
        "track_meta",
    ]);
    for r in rows {
        let mut row: Vec<TabularCell> = vec![
            r.member.0.into(),
            r.email.clone().into(),
            r.global.rev.into(),
            r.global.pri.into(),
            r.global.sec.into(),
            r.global.meta.into(),
        ];
        match r.track {
            Some(t) => {
                for v in [t.rev, t.pri, t.sec, t.meta] {
                    row.push(TabularCell::from(v));
                }
            }
            None => row.extend(std::iter::repeat_with(|| TabularCell::from("")).take(4)),
        }
        out.push(row);
    }
    out
}

pub fn batch_export(batch: &MutationBatch) -> TabularExport {
    let mut out = TabularExport::new(&["paper", "action", "email", "round"]);
    for i in &batch.instructions {
        out.push(vec![
            TabularCell::Integer(i64::from(i.paper.0)),
            i.action.to_string().into(),
            i.email.clone().into(),
            i.round.clone().unwrap_or_default().into(),
        ]);
    }
    out
}

pub fn outcome_export(outcome: &BatchOutcome) -> TabularExport {
    let mut out = TabularExport::new(&["severity", "paper", "reviewer", "message"]);
    for m in &outcome.messages {
        out.push(vec![
            format!("{:?}", m.severity).to_lowercase().into(),
            m.paper.map(|p| p.to_string()).unwrap_or_default().into(),
            m.reviewer.clone().unwrap_or_default().into(),
            m.text.clone().into(),
        ]);
    }
    out
}

pub fn track_stats_export(report: &TrackSubmissionReport) -> TabularExport {
    let mut out = TabularExport::new(&[
        "track",
        "total_papers",
        "registered",
        "submitted",
        "non_pc_authors_total",
    ]);
    for s in &report.tracks {
        out.push(vec![
            s.name.clone().into(),
            s.total_papers.into(),
            s.registered.into(),
            s.submitted.into(),
            "".into(),
        ]);
    }
    out.push(vec![
        SUMMARY_ROW.into(),
        "".into(),
        "".into(),
        "".into(),
        report.non_pc_authors_total.into(),
    ]);
    out
}
