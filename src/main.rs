use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use reviewer_oracle::assignment::{apply_batch, plan_batch, AssignmentTarget};
use reviewer_oracle::config::{Config, ConfigOverrides};
use reviewer_oracle::output::csv::to_csv;
use reviewer_oracle::output::json::render_json;
use reviewer_oracle::output::table::{
    render_batch_table, render_outcome_table, render_recommendation_table,
    render_track_stats_table, render_workload_table,
};
use reviewer_oracle::output::{
    batch_export, outcome_export, recommendation_export, track_stats_export, workload_export,
    OutputFormat,
};
use reviewer_oracle::recommend::recommend;
use reviewer_oracle::store::{MemberStore, PaperStore, SnapshotStore};
use reviewer_oracle::track::{track_submission_stats, TrackTag};
use reviewer_oracle::types::PaperId;
use reviewer_oracle::workload::{load_for_track, load_global, workload_view};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "reviewer-oracle",
    about = "Reviewer recommendations and assignment workload for program committees"
)]
struct Cli {
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Conference snapshot (JSON); overrides store.snapshot_path.
    #[arg(short, long)]
    snapshot: Option<String>,
    #[arg(short, long, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    #[arg(long)]
    limit: Option<usize>,
    #[arg(long = "workload-cap")]
    workload_cap: Option<u32>,
    /// Keep conflicted members in the candidate lists.
    #[arg(long = "include-conflicts")]
    include_conflicts: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Recommend {
        #[arg(long)]
        paper: PaperId,
    },
    Workload {
        #[arg(long)]
        track: Option<TrackTag>,
    },
    Assign {
        #[arg(long)]
        paper: PaperId,
        /// Member id or email.
        #[arg(long)]
        reviewer: String,
        /// 0, optional, secondary, primary, meta or -1 / conflict.
        #[arg(long = "set")]
        value: String,
        #[arg(long)]
        round: Option<String>,
        #[arg(long = "dry-run")]
        dry_run: bool,
    },
    Tracks,
    Config {
        #[arg(long)]
        init: bool,
        #[arg(long)]
        show: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(Some(&config_path))?;
    config.apply_overrides(ConfigOverrides {
        snapshot_path: cli.snapshot.clone(),
        limit: cli.limit,
        workload_cap: cli.workload_cap,
        include_conflicts: cli.include_conflicts,
    });

    if let Commands::Config { init, show } = &cli.command {
        return handle_config_command(*init, *show, &config, &config_path);
    }

    let snapshot_path = config.resolved_snapshot_path();
    let mut store = SnapshotStore::open(&snapshot_path)
        .with_context(|| format!("failed opening snapshot {}", snapshot_path.display()))?;
    let track_order = config.track_order(store.track_tags()?)?;

    match &cli.command {
        Commands::Recommend { paper } => {
            let options = config.recommend_options();
            let rec = recommend(&store, *paper, &track_order, &options)?;
            match cli.output {
                OutputFormat::Table => println!("{}", render_recommendation_table(&rec)),
                OutputFormat::Json => println!("{}", render_json(&rec)?),
                OutputFormat::Csv => print!("{}", to_csv(&recommendation_export(&rec))?),
            }
        }
        Commands::Workload { track } => {
            let global = load_global(&store)?;
            let track_snapshot = track
                .as_ref()
                .map(|t| load_for_track(&store, t))
                .transpose()?;
            let members = store.pc_members()?;
            let rows = workload_view(&members, &global, track_snapshot.as_ref());
            match cli.output {
                OutputFormat::Table => println!("{}", render_workload_table(&rows)),
                OutputFormat::Json => println!("{}", render_json(&rows)?),
                OutputFormat::Csv => print!("{}", to_csv(&workload_export(&rows))?),
            }
        }
        Commands::Assign {
            paper,
            reviewer,
            value,
            round,
            dry_run,
        } => {
            let settings = config.assignment_settings(track_order);
            let target = AssignmentTarget {
                paper: *paper,
                reviewer: reviewer.clone(),
                value: value.clone(),
                round: round.clone(),
            };
            let batch = plan_batch(&store, &[target], &settings)?;
            for message in &batch.messages {
                warn!("{}", message.text);
            }
            if *dry_run {
                match cli.output {
                    OutputFormat::Table => println!("{}", render_batch_table(&batch)),
                    OutputFormat::Json => println!("{}", render_json(&batch)?),
                    OutputFormat::Csv => print!("{}", to_csv(&batch_export(&batch))?),
                }
                return Ok(());
            }
            let outcome = apply_batch(&mut store, &batch);
            if outcome.ok && outcome.applied > 0 {
                store.save()?;
                info!(path = %snapshot_path.display(), "saved snapshot");
            }
            match cli.output {
                OutputFormat::Table => println!("{}", render_outcome_table(&outcome)),
                OutputFormat::Json => println!("{}", render_json(&outcome)?),
                OutputFormat::Csv => print!("{}", to_csv(&outcome_export(&outcome))?),
            }
            if !outcome.ok {
                return Err(anyhow!("assignment failed for paper {paper}"));
            }
        }
        Commands::Tracks => {
            let papers = store.papers()?;
            let members = store.pc_members()?;
            let report = track_submission_stats(&papers, &members, &track_order, |t| {
                config.track_display_name(t)
            });
            match cli.output {
                OutputFormat::Table => println!("{}", render_track_stats_table(&report)),
                OutputFormat::Json => println!("{}", render_json(&report)?),
                OutputFormat::Csv => print!("{}", to_csv(&track_stats_export(&report))?),
            }
        }
        Commands::Config { .. } => {}
    }

    Ok(())
}

fn handle_config_command(
    init: bool,
    show: bool,
    config: &Config,
    config_path: &PathBuf,
) -> Result<()> {
    if init {
        Config::write_template(config_path)?;
        println!("Wrote config template to {}", config_path.display());
    }
    if show || !init {
        println!("{}", render_json(config)?);
    }
    Ok(())
}
