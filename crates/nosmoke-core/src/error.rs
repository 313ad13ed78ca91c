//! Error types for `nosmoke-core`.

use thiserror::Error;

use crate::entry::{Collection, Index};

#[derive(Debug, Error)]
pub enum Error {
  /// Ids are assigned by the store on insert; callers must leave them unset.
  #[error("{collection} entry already carries id {id}")]
  IdAlreadySet { collection: Collection, id: i64 },

  #[error("{0} entry has no id")]
  MissingId(Collection),

  #[error("index {index} expects a {expected} key")]
  IndexKeyMismatch {
    index:    Index,
    expected: &'static str,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
