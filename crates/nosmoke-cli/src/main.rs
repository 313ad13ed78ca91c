//! nosmoke: a local smoking-habit log.
//!
//! Reads `nosmoke.toml` (or the path given with `--config`), overlays
//! `NOSMOKE_*` environment variables, and runs one subcommand against the
//! SQLite store. The database is opened on first use.

mod commands;
mod settings;

use std::path::PathBuf;

use clap::Parser;
use nosmoke_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::{commands::Command, settings::Settings};

#[derive(Parser)]
#[command(author, version, about = "Log cigarettes and see what they cost")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "nosmoke.toml")]
  config: PathBuf,

  /// Database file; overrides `database_path` from the configuration.
  #[arg(long)]
  database: Option<PathBuf>,

  /// Print results as JSON.
  #[arg(long, global = true)]
  json: bool,

  #[command(subcommand)]
  command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Logs go to stderr so stdout stays machine-readable.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  let settings = Settings::load(&cli.config)?;
  let database = settings::expand_tilde(&cli.database.unwrap_or(settings.database_path));
  tracing::debug!(?database, "using database");

  let store = SqliteStore::new(&database);

  commands::run(&store, cli.command, cli.json).await
}
