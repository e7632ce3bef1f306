//! nvg-sync binary.
//!
//! Reads `nvg-sync.toml` (or the path given with `--config`), loads the
//! catalog inputs, optionally downloading fresh copies first, and brings the
//! SQLite mirror in line with them.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use nvg_store_sqlite::SqliteStore;
use nvg_sync::{SyncMode, config::SyncConfig, source};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Mirror the NVG archive catalog into SQLite")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "nvg-sync.toml")]
  config: PathBuf,

  /// Drop and recreate every table, then load the catalog from scratch.
  #[arg(long)]
  build: bool,

  /// Database file; overrides the configured one.
  #[arg(long, env = "NVG_DATABASE")]
  database: Option<PathBuf>,

  /// Download the inputs from their configured URLs before syncing.
  #[arg(long)]
  fetch: bool,

  /// Only log warnings and errors.
  #[arg(short, long, conflicts_with = "verbose")]
  quiet: bool,

  /// Log every batch and registered name.
  #[arg(short, long)]
  verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
  let cli = Cli::parse();

  let level = if cli.quiet {
    LevelFilter::WARN
  } else if cli.verbose {
    LevelFilter::DEBUG
  } else {
    LevelFilter::INFO
  };
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy(),
    )
    .init();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config.clone()).required(false))
    .add_source(SyncConfig::environment())
    .build()
    .context("failed to read config file")?;

  let mut sync_cfg: SyncConfig = settings
    .try_deserialize()
    .context("failed to deserialise SyncConfig")?;
  if let Some(database) = cli.database {
    sync_cfg.database = database;
  }

  let mode = if cli.build { SyncMode::Build } else { SyncMode::Incremental };

  let inputs = source::load(&sync_cfg, cli.fetch)
    .await
    .context("failed to load inputs")?;

  let store = SqliteStore::open(&sync_cfg.database)
    .await
    .with_context(|| format!("failed to open store at {}", sync_cfg.database.display()))?;

  let report = nvg_sync::run(&store, &inputs, &sync_cfg, mode)
    .await
    .context("sync failed")?;

  if report.is_unchanged() {
    info!("store already up to date");
  }

  Ok(())
}
