//! Actor Continuity CLI — `acont` command.
//!
//! Records subject activity, runs continuity evaluations against the
//! file-backed stores, and inspects persisted baselines and history.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};

use actor_continuity::stats::half_life;
use actor_continuity::storage::{FileActivityLog, FileHistoryLog, FileStateStore};
use actor_continuity::time::{now_secs, secs_to_rfc3339};
use actor_continuity::{
    ActivityEvent, ContinuityEngine, DecayProfile, EngineConfig, Feature, HistoryLog, StateStore,
};

// ── Directory helpers ─────────────────────────────────────────────────────────

fn default_data_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME not set; pass --data-dir")?;
    Ok(PathBuf::from(home).join(".continuity"))
}

fn state_dir(root: &Path) -> PathBuf {
    root.join("state")
}

fn history_dir(root: &Path) -> PathBuf {
    root.join("history")
}

fn activity_dir(root: &Path) -> PathBuf {
    root.join("activity")
}

// ── Formatting helpers ────────────────────────────────────────────────────────

fn secs_to_datetime(secs: f64) -> String {
    chrono::DateTime::from_timestamp(secs.floor() as i64, 0)
        .unwrap_or(chrono::DateTime::UNIX_EPOCH)
        .format("%Y-%m-%d %H:%M:%S UTC")
        .to_string()
}

fn format_duration(secs: f64) -> String {
    if !secs.is_finite() {
        return "never".to_string();
    }
    if secs >= 86_400.0 {
        format!("{:.1} days", secs / 86_400.0)
    } else if secs >= 3_600.0 {
        format!("{:.1} hours", secs / 3_600.0)
    } else {
        format!("{secs:.0} seconds")
    }
}

// ── CLI structure ─────────────────────────────────────────────────────────────

/// Actor Continuity CLI — track subject activity and score behavioral
/// continuity against each subject's baseline.
#[derive(Parser, Debug)]
#[command(
    name = "acont",
    about = "Actor Continuity CLI",
    version,
    long_about = "acont — Actor Continuity CLI\n\nRecord activity, evaluate behavioral continuity, and inspect\nper-subject baselines and audit history."
)]
struct Cli {
    /// Root directory for state, history and activity files (default: ~/.continuity)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Engine configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Record an activity event for a subject
    Track {
        /// Subject identifier
        #[arg(long)]
        subject: String,

        /// Action label (e.g. view, search, export_data)
        #[arg(long)]
        action: String,

        /// Optional entity the action touched
        #[arg(long)]
        entity: Option<String>,

        /// Event timestamp in Unix seconds (default: now)
        #[arg(long)]
        at: Option<f64>,
    },

    /// Evaluate continuity for a subject from its recent activity
    Evaluate {
        /// Subject identifier
        #[arg(long)]
        subject: String,

        /// Evaluation time in Unix seconds (default: now)
        #[arg(long)]
        at: Option<f64>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Display the persisted baseline for a subject
    Show {
        /// Subject identifier
        #[arg(long)]
        subject: String,
    },

    /// Display continuity history for a subject
    History {
        /// Subject identifier
        #[arg(long)]
        subject: String,

        /// Show only the most recent N rows
        #[arg(long)]
        limit: Option<usize>,
    },

    /// List subjects with a persisted baseline
    List,

    /// Print the half-life for a decay rate or profile
    HalfLife {
        /// Decay rate λ (per second)
        #[arg(long, conflicts_with = "profile")]
        lambda: Option<f64>,

        /// Decay profile (daily_active, weekly_active, monthly_active)
        #[arg(long)]
        profile: Option<String>,
    },

    /// Print the effective engine configuration as JSON
    Config,
}

// ── Main ──────────────────────────────────────────────────────────────────────

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let verbose = cli.verbose;

    let result = (|| -> Result<()> {
        let config = load_config(cli.config.as_deref())?;
        let root = match cli.data_dir {
            Some(dir) => dir,
            None => default_data_dir()?,
        };

        match cli.command {
            Commands::Track {
                subject,
                action,
                entity,
                at,
            } => cmd_track(&root, &subject, &action, entity, at, verbose),
            Commands::Evaluate { subject, at, json } => {
                cmd_evaluate(&root, config, &subject, at, json, verbose)
            }
            Commands::Show { subject } => cmd_show(&root, &subject, verbose),
            Commands::History { subject, limit } => cmd_history(&root, &subject, limit, verbose),
            Commands::List => cmd_list(&root, verbose),
            Commands::HalfLife { lambda, profile } => {
                cmd_half_life(&config, lambda, profile.as_deref())
            }
            Commands::Config => cmd_config(&config),
        }
    })();

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(p) => EngineConfig::from_file(p)
            .with_context(|| format!("failed to load config {}", p.display())),
        None => Ok(EngineConfig::default()),
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// `acont track`
fn cmd_track(
    root: &Path,
    subject: &str,
    action: &str,
    entity: Option<String>,
    at: Option<f64>,
    verbose: bool,
) -> Result<()> {
    let log = FileActivityLog::new(activity_dir(root)).context("failed to open activity log")?;
    let event = ActivityEvent::new(at.unwrap_or_else(now_secs), action, entity);
    log.record(subject, &event)
        .context("failed to record activity")?;

    if verbose {
        println!(
            "Recorded {} for {} at {}",
            event.action,
            subject,
            secs_to_rfc3339(event.timestamp)
        );
    }
    Ok(())
}

/// `acont evaluate`
fn cmd_evaluate(
    root: &Path,
    config: EngineConfig,
    subject: &str,
    at: Option<f64>,
    json: bool,
    verbose: bool,
) -> Result<()> {
    let activity =
        FileActivityLog::new(activity_dir(root)).context("failed to open activity log")?;
    let engine = ContinuityEngine::new(
        config,
        FileStateStore::new(state_dir(root)).context("failed to open state store")?,
        FileHistoryLog::new(history_dir(root)).context("failed to open history log")?,
    )?;

    let now = at.unwrap_or_else(now_secs);
    log::debug!("evaluating {subject} at {now} from {}", root.display());
    let result = engine
        .evaluate_recent(subject, &activity, now)
        .with_context(|| format!("evaluation failed for subject '{subject}'"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("Subject: {subject}");
    println!("  State:        {}", result.state);
    println!("  Score:        {:.4}", result.score);
    println!("  Confidence:   {:.4}", result.confidence);
    println!("  Distance:     {:.4}", result.distance);
    println!("  Sample Count: {}", result.sample_count);
    if verbose {
        println!("  Measured At:  {}", secs_to_datetime(now));
    }
    Ok(())
}

/// `acont show`
fn cmd_show(root: &Path, subject: &str, verbose: bool) -> Result<()> {
    let store = FileStateStore::new(state_dir(root)).context("failed to open state store")?;
    let stored = store
        .load(subject)?
        .ok_or_else(|| anyhow!("no baseline for subject '{subject}'"))?;
    let state = &stored.state;

    println!("Subject: {}", state.subject_id);
    println!("  Revision:     {}", stored.revision);
    println!("  Created:      {}", secs_to_datetime(state.created_at));
    println!("  Last Seen:    {}", secs_to_datetime(state.last_seen_at));
    println!("  Sample Count: {}", state.sample_count);
    println!("  Score:        {:.4}", state.continuity_score);
    println!("  Confidence:   {:.4}", state.continuity_confidence);

    let variance = state
        .variance()
        .context("stored baseline failed validation")?;
    println!("  Baseline:");
    for feature in Feature::ALL {
        let i = feature.index();
        println!(
            "    {:<24} mean {:>14.6}  var {:>14.6}",
            feature.as_tag(),
            state.baseline_vector[i],
            variance[i]
        );
    }

    if verbose {
        println!(
            "  Divergence (reserved): accumulated {} velocity {} mode {:?}",
            state.divergence_accumulated, state.divergence_velocity, state.divergence_mode
        );
    }
    Ok(())
}

/// `acont history`
fn cmd_history(root: &Path, subject: &str, limit: Option<usize>, verbose: bool) -> Result<()> {
    let log = FileHistoryLog::new(history_dir(root)).context("failed to open history log")?;
    let rows = log.list(subject)?;

    if rows.is_empty() {
        println!("No history for subject '{subject}'.");
        return Ok(());
    }

    let skip = limit.map_or(0, |n| rows.len().saturating_sub(n));
    println!(
        "{:<23}  {:>9}  {:>7}  {:>6}  {:>9}  {:>6}  STATE",
        "MEASURED", "SCORE", "CONF", "DECAY", "DISTANCE", "N"
    );
    for row in &rows[skip..] {
        println!(
            "{:<23}  {:>9.4}  {:>7.4}  {:>6.4}  {:>9.4}  {:>6}  {}",
            secs_to_datetime(row.measured_at),
            row.continuity_score,
            row.confidence,
            row.decay_factor,
            row.distance,
            row.sample_count,
            row.state
        );
        if verbose {
            println!("  id {}", row.id);
        }
    }
    Ok(())
}

/// `acont list`
fn cmd_list(root: &Path, verbose: bool) -> Result<()> {
    let store = FileStateStore::new(state_dir(root)).context("failed to open state store")?;
    let subjects = store.list()?;

    if subjects.is_empty() {
        println!("No subjects found.");
        return Ok(());
    }

    for subject in subjects {
        if verbose {
            match store.load(&subject) {
                Ok(Some(stored)) => println!(
                    "{subject}  n={}  score={:.4}",
                    stored.state.sample_count, stored.state.continuity_score
                ),
                Ok(None) => println!("{subject}"),
                Err(e) => println!("{subject}  (unreadable: {e})"),
            }
        } else {
            println!("{subject}");
        }
    }
    Ok(())
}

/// `acont half-life`
fn cmd_half_life(config: &EngineConfig, lambda: Option<f64>, profile: Option<&str>) -> Result<()> {
    let rate = match (lambda, profile) {
        (Some(l), _) => l,
        (None, Some(tag)) => DecayProfile::from_tag(tag)
            .ok_or_else(|| anyhow!("unknown decay profile '{tag}'"))?
            .decay_rate(),
        (None, None) => config.decay_rate,
    };
    if !(rate.is_finite() && rate >= 0.0) {
        bail!("decay rate must be finite and >= 0, got {rate}");
    }

    let t = half_life(rate);
    println!("λ = {rate}  half-life = {}", format_duration(t));
    Ok(())
}

/// `acont config`
fn cmd_config(config: &EngineConfig) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}
