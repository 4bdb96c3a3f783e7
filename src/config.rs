use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::assignment::{AssignmentSettings, DEFAULT_ROUND};
use crate::recommend::{RecommendOptions, DEFAULT_RECOMMENDATION_LIMIT, DEFAULT_WORKLOAD_CAP};
use crate::track::{parse_track_order, TrackTag};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub recommendation: RecommendationConfig,
    #[serde(default)]
    pub tracks: TracksConfig,
    #[serde(default)]
    pub assignment: AssignmentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationConfig {
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default = "default_workload_cap")]
    pub workload_cap: u32,
    #[serde(default = "default_true")]
    pub exclude_conflicts: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TracksConfig {
    /// First-match resolution order. Empty means the snapshot's own order.
    #[serde(default)]
    pub order: Vec<String>,
    #[serde(default)]
    pub display_names: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentConfig {
    #[serde(default = "default_round")]
    pub default_round: String,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub snapshot_path: Option<String>,
    pub limit: Option<usize>,
    pub workload_cap: Option<u32>,
    pub include_conflicts: bool,
}

impl Config {
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config/reviewer-oracle/config.toml")
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed reading config: {}", path.display()))?;
        let parsed: Self = toml::from_str(&data)
            .with_context(|| format!("failed parsing TOML config: {}", path.display()))?;
        Ok(parsed)
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(snapshot_path) = overrides.snapshot_path {
            self.store.snapshot_path = snapshot_path;
        }
        if let Some(limit) = overrides.limit {
            self.recommendation.limit = limit;
        }
        if let Some(workload_cap) = overrides.workload_cap {
            self.recommendation.workload_cap = workload_cap;
        }
        if overrides.include_conflicts {
            self.recommendation.exclude_conflicts = false;
        }
    }

    pub fn write_template(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed creating config directory: {}", parent.display())
            })?;
        }
        fs::write(path, Self::default_template())
            .with_context(|| format!("failed writing config template: {}", path.display()))
    }

    pub fn resolved_snapshot_path(&self) -> PathBuf {
        expand_tilde(&self.store.snapshot_path)
    }

    pub fn recommend_options(&self) -> RecommendOptions {
        RecommendOptions::default()
            .with_limit(self.recommendation.limit)
            .with_workload_cap(self.recommendation.workload_cap)
            .with_exclude_conflicts(self.recommendation.exclude_conflicts)
    }

    pub fn track_order(&self, fallback: Vec<TrackTag>) -> Result<Vec<TrackTag>> {
        if self.tracks.order.is_empty() {
            return Ok(fallback);
        }
        parse_track_order(&self.tracks.order).context("invalid entry in tracks.order")
    }

    pub fn assignment_settings(&self, track_order: Vec<TrackTag>) -> AssignmentSettings {
        AssignmentSettings {
            track_order,
            default_round: self.assignment.default_round.clone(),
        }
    }

    pub fn track_display_name<'a>(&'a self, track: &'a str) -> &'a str {
        self.tracks
            .display_names
            .get(track)
            .map(String::as_str)
            .unwrap_or(track)
    }

    pub fn default_template() -> String {
        let template = r#"[store]
snapshot_path = "~/.local/share/reviewer-oracle/conference.json"

[recommendation]
# number of reviewers recommended per paper
limit = 3
# members with more counted reviews than this are never recommended
workload_cap = 6
exclude_conflicts = true

[tracks]
# first listed track wins for papers carrying several track tags;
# leave empty to use the snapshot's track list
order = []

[tracks.display_names]
# infosec = "Information Security"

[assignment]
default_round = "R1"
"#;
        template.to_string()
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
        }
    }
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            workload_cap: default_workload_cap(),
            exclude_conflicts: true,
        }
    }
}

impl Default for AssignmentConfig {
    fn default() -> Self {
        Self {
            default_round: default_round(),
        }
    }
}

fn default_snapshot_path() -> String {
    "~/.local/share/reviewer-oracle/conference.json".to_string()
}

fn default_limit() -> usize {
    DEFAULT_RECOMMENDATION_LIMIT
}

fn default_workload_cap() -> u32 {
    DEFAULT_WORKLOAD_CAP
}

fn default_round() -> String {
    DEFAULT_ROUND.to_string()
}

fn default_true() -> bool {
    true
}
