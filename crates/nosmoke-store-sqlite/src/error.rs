//! Error type for `nosmoke-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] nosmoke_core::Error),

  /// The database could not be opened, configured, or migrated.
  #[error("failed to open database: {0}")]
  Open(#[source] tokio_rusqlite::Error),

  /// The file was written by a newer build; it is left untouched.
  #[error("database schema version {found} is newer than supported version {supported}")]
  SchemaTooNew { found: u32, supported: u32 },

  #[error("constraint violation: {0}")]
  Constraint(#[source] rusqlite::Error),

  #[error("storage error: {0}")]
  Storage(#[source] tokio_rusqlite::Error),

  /// A stored row does not map back onto a domain value.
  #[error("cannot decode stored row: {0}")]
  Decode(String),
}

impl Error {
  /// Whether the connection could not be established.
  pub fn is_open_failure(&self) -> bool {
    matches!(self, Self::Open(_) | Self::SchemaTooNew { .. })
  }
}

impl From<tokio_rusqlite::Error> for Error {
  fn from(err: tokio_rusqlite::Error) -> Self {
    match err {
      tokio_rusqlite::Error::Rusqlite(e)
        if e.sqlite_error_code() == Some(rusqlite::ErrorCode::ConstraintViolation) =>
      {
        Self::Constraint(e)
      }
      other => Self::Storage(other),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
