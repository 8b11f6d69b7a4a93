//! `detour` — command-line driver for the disruption pipelines.
//!
//! Reads `detour.toml` (or the path given with `--config`), opens the SQLite
//! store, and runs one of the two batch jobs:
//!
//! ```
//! detour reconcile --org <uuid> --input scan.jsonl
//! detour cutover
//! detour arm | disarm
//! ```

mod source;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use detour_core::{params::ParameterStore as _, resolve::Mode};
use detour_pipeline::cutover::{SWITCH_DISABLED, SWITCH_ENABLED, SWITCH_KEY};
use detour_store_sqlite::{ChunkPolicy, DisruptionStore};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(author, version, about = "Detour disruption pipeline")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "detour.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Rebuild one organisation's disruptions from an exported scope scan.
  Reconcile {
    /// Organisation (scope) to reconcile.
    #[arg(long)]
    org: Uuid,

    /// JSON-lines export of the sparse-store scan, one record per line.
    #[arg(long)]
    input: PathBuf,

    /// Treat the scope as disruption templates (history is omitted).
    #[arg(long)]
    templates: bool,
  },

  /// Guard and promote the staged reference tables.
  Cutover {
    /// Run over these tables instead of the configured list.
    #[arg(long = "table")]
    tables: Vec<String>,
  },

  /// Arm the cutover kill-switch.
  Arm,

  /// Disarm the cutover kill-switch.
  Disarm,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the TOML configuration file; every key can also be set through
/// the `DETOUR_` environment prefix.
#[derive(Debug, Clone, Deserialize)]
struct Settings {
  #[serde(default = "default_store_path")]
  store_path:       PathBuf,
  /// Reference tables eligible for cutover.
  #[serde(default)]
  reference_tables: Vec<String>,
  #[serde(default)]
  chunk_policy:     ChunkPolicy,
}

fn default_store_path() -> PathBuf { PathBuf::from("detour.db") }

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("DETOUR"))
    .build()
    .context("failed to read config file")?;

  let settings: Settings = settings
    .try_deserialize()
    .context("failed to deserialise Settings")?;

  let store = DisruptionStore::open(&settings.store_path)
    .await
    .with_context(|| {
      format!("failed to open store at {:?}", settings.store_path)
    })?;

  match cli.command {
    Command::Reconcile { org, input, templates } => {
      let source = source::load_jsonl(&input)?;
      let mode = if templates { Mode::Template } else { Mode::Disruption };

      let report = detour_pipeline::reconcile::run(
        &source,
        &store,
        org,
        mode,
        settings.chunk_policy,
      )
      .await
      .context("reconciliation failed")?;
      tracing::info!(?report, "reconcile finished");
    }

    Command::Cutover { tables } => {
      let tables = if tables.is_empty() {
        settings.reference_tables.clone()
      } else {
        tables
      };
      anyhow::ensure!(!tables.is_empty(), "no reference tables configured");

      let report = detour_pipeline::cutover::run(&store, &store, &tables)
        .await
        .context("cutover failed")?;
      for (table, rows) in &report.promoted {
        tracing::info!(table = table.as_str(), rows = *rows, "table promoted");
      }
    }

    Command::Arm => {
      store.set(SWITCH_KEY, SWITCH_ENABLED).await?;
      tracing::info!("cutover kill-switch armed");
    }

    Command::Disarm => {
      store.set(SWITCH_KEY, SWITCH_DISABLED).await?;
      tracing::info!("cutover kill-switch disarmed");
    }
  }

  Ok(())
}
