//! Runtime settings: an optional TOML file overlaid by `NOSMOKE_*`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use serde::Deserialize;

pub const DEFAULT_DATABASE_PATH: &str = "NoSmokingDB.sqlite3";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  /// SQLite file holding cigarettes and records. A leading `~/` is expanded.
  #[serde(default = "default_database_path")]
  pub database_path: PathBuf,
}

fn default_database_path() -> PathBuf { PathBuf::from(DEFAULT_DATABASE_PATH) }

impl Settings {
  /// Read `path` if it exists, then apply environment overrides.
  pub fn load(path: &Path) -> Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("NOSMOKE"))
      .build()
      .with_context(|| format!("failed to read config file {}", path.display()))?;

    settings
      .try_deserialize()
      .context("failed to deserialise settings")
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
