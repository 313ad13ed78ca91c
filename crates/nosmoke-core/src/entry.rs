//! Collections, the entries they hold, and their secondary indices.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use crate::{
  Error, Result,
  cigarette::Cigarette,
  record::{Record, RecordKind},
};

// ─── Collection ──────────────────────────────────────────────────────────────

/// A named, independently-keyed container of entries. The string form is the
/// name of the backing table.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Collection {
  Cigarettes,
  Records,
}

impl Collection {
  pub const ALL: [Collection; 2] = [Collection::Cigarettes, Collection::Records];

  /// Secondary indices defined over this collection.
  pub fn indices(self) -> &'static [Index] {
    match self {
      Self::Cigarettes => &[Index::CigaretteName, Index::CigaretteCreatedAt],
      Self::Records => &[
        Index::RecordTimestamp,
        Index::RecordKind,
        Index::RecordCigaretteId,
      ],
    }
  }
}

// ─── Entry ───────────────────────────────────────────────────────────────────

/// A value stored in one of the two collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "collection", content = "value", rename_all = "lowercase")]
pub enum Entry {
  Cigarette(Cigarette),
  Record(Record),
}

impl Entry {
  pub fn collection(&self) -> Collection {
    match self {
      Self::Cigarette(_) => Collection::Cigarettes,
      Self::Record(_) => Collection::Records,
    }
  }

  pub fn id(&self) -> Option<i64> {
    match self {
      Self::Cigarette(c) => c.id,
      Self::Record(r) => r.id,
    }
  }

  /// The same entry carrying `id` as its primary key.
  pub fn with_id(mut self, id: i64) -> Self {
    match &mut self {
      Self::Cigarette(c) => c.id = Some(id),
      Self::Record(r) => r.id = Some(id),
    }
    self
  }

  pub fn into_cigarette(self) -> Option<Cigarette> {
    match self {
      Self::Cigarette(c) => Some(c),
      Self::Record(_) => None,
    }
  }

  pub fn into_record(self) -> Option<Record> {
    match self {
      Self::Record(r) => Some(r),
      Self::Cigarette(_) => None,
    }
  }
}

impl From<Cigarette> for Entry {
  fn from(c: Cigarette) -> Self { Self::Cigarette(c) }
}

impl From<Record> for Entry {
  fn from(r: Record) -> Self { Self::Record(r) }
}

// ─── Index ───────────────────────────────────────────────────────────────────

/// A non-unique secondary index over one field of a collection.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Index {
  CigaretteName,
  CigaretteCreatedAt,
  RecordTimestamp,
  RecordKind,
  RecordCigaretteId,
}

impl Index {
  pub fn collection(self) -> Collection {
    match self {
      Self::CigaretteName | Self::CigaretteCreatedAt => Collection::Cigarettes,
      Self::RecordTimestamp | Self::RecordKind | Self::RecordCigaretteId => {
        Collection::Records
      }
    }
  }

  /// Name of the indexed field; also the backing column name.
  pub fn field(self) -> &'static str {
    match self {
      Self::CigaretteName => "name",
      Self::CigaretteCreatedAt => "created_at",
      Self::RecordTimestamp => "timestamp",
      Self::RecordKind => "kind",
      Self::RecordCigaretteId => "cigarette_id",
    }
  }

  /// Reject keys whose type cannot match the indexed field.
  pub fn check(self, key: &IndexKey) -> Result<()> {
    let expected = match self {
      Self::CigaretteName => "text",
      Self::CigaretteCreatedAt | Self::RecordTimestamp | Self::RecordCigaretteId => {
        "integer"
      }
      Self::RecordKind => "record kind",
    };

    let ok = matches!(
      (self, key),
      (Self::CigaretteName, IndexKey::Text(_))
        | (
          Self::CigaretteCreatedAt | Self::RecordTimestamp | Self::RecordCigaretteId,
          IndexKey::Integer(_)
        )
        | (Self::RecordKind, IndexKey::Kind(_))
    );

    if ok {
      Ok(())
    } else {
      Err(Error::IndexKeyMismatch { index: self, expected })
    }
  }
}

/// A value looked up in an [`Index`].
#[derive(Debug, Clone, PartialEq)]
pub enum IndexKey {
  Integer(i64),
  Text(String),
  Kind(RecordKind),
}

impl From<i64> for IndexKey {
  fn from(v: i64) -> Self { Self::Integer(v) }
}

impl From<&str> for IndexKey {
  fn from(v: &str) -> Self { Self::Text(v.to_owned()) }
}

impl From<String> for IndexKey {
  fn from(v: String) -> Self { Self::Text(v) }
}

impl From<RecordKind> for IndexKey {
  fn from(v: RecordKind) -> Self { Self::Kind(v) }
}

// ─── KeyRange ────────────────────────────────────────────────────────────────

/// Inclusive bounds over an index. A missing bound is open.
///
/// A range whose lower bound exceeds its upper bound matches nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyRange {
  pub lower: Option<IndexKey>,
  pub upper: Option<IndexKey>,
}

impl KeyRange {
  /// Every key between `lower` and `upper`, both included.
  pub fn bound(lower: impl Into<IndexKey>, upper: impl Into<IndexKey>) -> Self {
    Self {
      lower: Some(lower.into()),
      upper: Some(upper.into()),
    }
  }

  pub fn at_least(lower: impl Into<IndexKey>) -> Self {
    Self { lower: Some(lower.into()), upper: None }
  }

  pub fn at_most(upper: impl Into<IndexKey>) -> Self {
    Self { lower: None, upper: Some(upper.into()) }
  }

  /// Validate both bounds against `index`.
  pub fn check(&self, index: Index) -> Result<()> {
    for key in self.lower.iter().chain(self.upper.iter()) {
      index.check(key)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn collection_names_are_table_names() {
    assert_eq!(Collection::Cigarettes.to_string(), "cigarettes");
    assert_eq!(Collection::Records.as_ref(), "records");
  }

  #[test]
  fn every_index_belongs_to_its_collection() {
    for collection in Collection::ALL {
      for index in collection.indices() {
        assert_eq!(index.collection(), collection, "{index}");
      }
    }
  }

  #[test]
  fn entry_accessors() {
    let entry = Entry::from(Cigarette::new("Camel", 30.0, 20, 0));
    assert_eq!(entry.collection(), Collection::Cigarettes);
    assert_eq!(entry.id(), None);

    let entry = entry.with_id(4);
    assert_eq!(entry.id(), Some(4));
    assert!(entry.clone().into_record().is_none());
    assert_eq!(entry.into_cigarette().unwrap().id, Some(4));
  }

  #[test]
  fn index_key_types_are_checked() {
    assert!(Index::CigaretteName.check(&"Camel".into()).is_ok());
    assert!(Index::RecordTimestamp.check(&100_i64.into()).is_ok());
    assert!(Index::RecordKind.check(&RecordKind::Share.into()).is_ok());

    let err = Index::RecordCigaretteId.check(&"1".into()).unwrap_err();
    assert!(matches!(
      err,
      Error::IndexKeyMismatch { index: Index::RecordCigaretteId, expected: "integer" }
    ));
    assert!(Index::RecordKind.check(&"smoke".into()).is_err());
  }

  #[test]
  fn key_range_checks_both_bounds() {
    assert!(KeyRange::bound(1_i64, 2_i64).check(Index::RecordTimestamp).is_ok());
    assert!(KeyRange::at_most(2_i64).check(Index::RecordTimestamp).is_ok());
    assert!(
      KeyRange::bound(1_i64, "x")
        .check(Index::RecordTimestamp)
        .is_err()
    );
  }

  #[test]
  fn entry_serialises_with_collection_tag() {
    let entry = Entry::from(Record::new(1, "Camel", RecordKind::Smoke, 10, 11));
    let json = serde_json::to_value(&entry).unwrap();
    assert_eq!(json["collection"], "record");
    assert_eq!(json["value"]["kind"], "smoke");
  }
}
