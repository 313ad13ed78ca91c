//! Mapping between domain values and SQLite rows.
//!
//! Timestamps are stored as INTEGER epoch milliseconds, prices as REAL, and
//! `RecordKind` as its lowercase name. Rows are read into `Raw*` structs on
//! the connection thread and decoded afterwards, so decode failures surface
//! as [`Error::Decode`] instead of a SQLite error.

use std::str::FromStr as _;

use nosmoke_core::{
  cigarette::Cigarette,
  entry::{Collection, Entry, IndexKey},
  record::{Record, RecordKind},
};
use rusqlite::{Connection, Row, params, types::Value};

use crate::{Error, Result};

// ─── Columns ─────────────────────────────────────────────────────────────────

const CIGARETTE_COLUMNS: &str = "id, name, price, pack_size, created_at, updated_at";

const RECORD_COLUMNS: &str =
  "id, cigarette_id, cigarette_name, kind, price, timestamp, created_at";

pub fn columns(collection: Collection) -> &'static str {
  match collection {
    Collection::Cigarettes => CIGARETTE_COLUMNS,
    Collection::Records => RECORD_COLUMNS,
  }
}

// ─── Keys ────────────────────────────────────────────────────────────────────

pub fn encode_key(key: &IndexKey) -> Value {
  match key {
    IndexKey::Integer(v) => Value::Integer(*v),
    IndexKey::Text(s) => Value::Text(s.clone()),
    IndexKey::Kind(k) => Value::Text(k.as_ref().to_owned()),
  }
}

// ─── Writes ──────────────────────────────────────────────────────────────────

/// Write `entry` into its table. With `id` set the row under that key is
/// replaced (or created); without it SQLite assigns the next key.
///
/// Returns the row id that was written.
pub fn write_entry(conn: &Connection, entry: &Entry, id: Option<i64>) -> rusqlite::Result<i64> {
  match entry {
    Entry::Cigarette(c) => {
      conn.execute(
        "INSERT OR REPLACE INTO cigarettes (
           id, name, price, pack_size, created_at, updated_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![id, c.name, c.price, c.pack_size, c.created_at, c.updated_at],
      )?;
    }
    Entry::Record(r) => {
      conn.execute(
        "INSERT OR REPLACE INTO records (
           id, cigarette_id, cigarette_name, kind, price, timestamp, created_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
          id,
          r.cigarette_id,
          r.cigarette_name,
          r.kind.as_ref(),
          r.price,
          r.timestamp,
          r.created_at,
        ],
      )?;
    }
  }
  Ok(conn.last_insert_rowid())
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `cigarettes` row.
pub struct RawCigarette {
  pub id:         i64,
  pub name:       String,
  pub price:      f64,
  pub pack_size:  i64,
  pub created_at: i64,
  pub updated_at: i64,
}

impl RawCigarette {
  fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      name:       row.get(1)?,
      price:      row.get(2)?,
      pack_size:  row.get(3)?,
      created_at: row.get(4)?,
      updated_at: row.get(5)?,
    })
  }

  pub fn into_cigarette(self) -> Result<Cigarette> {
    let pack_size = u32::try_from(self.pack_size).map_err(|_| {
      Error::Decode(format!(
        "cigarette {} has pack size {} out of range",
        self.id, self.pack_size
      ))
    })?;

    Ok(Cigarette {
      id: Some(self.id),
      name: self.name,
      price: self.price,
      pack_size,
      created_at: self.created_at,
      updated_at: self.updated_at,
    })
  }
}

/// Raw values read directly from a `records` row.
pub struct RawRecord {
  pub id:             i64,
  pub cigarette_id:   i64,
  pub cigarette_name: String,
  pub kind:           String,
  pub price:          Option<f64>,
  pub timestamp:      i64,
  pub created_at:     i64,
}

impl RawRecord {
  fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:             row.get(0)?,
      cigarette_id:   row.get(1)?,
      cigarette_name: row.get(2)?,
      kind:           row.get(3)?,
      price:          row.get(4)?,
      timestamp:      row.get(5)?,
      created_at:     row.get(6)?,
    })
  }

  pub fn into_record(self) -> Result<Record> {
    let kind = RecordKind::from_str(&self.kind).map_err(|_| {
      Error::Decode(format!("record {} has unknown kind {:?}", self.id, self.kind))
    })?;

    Ok(Record {
      id: Some(self.id),
      cigarette_id: self.cigarette_id,
      cigarette_name: self.cigarette_name,
      kind,
      price: self.price,
      timestamp: self.timestamp,
      created_at: self.created_at,
    })
  }
}

/// A row from either table.
pub enum RawEntry {
  Cigarette(RawCigarette),
  Record(RawRecord),
}

impl RawEntry {
  /// Read a row selected with [`columns`] for `collection`.
  pub fn read(collection: Collection, row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(match collection {
      Collection::Cigarettes => Self::Cigarette(RawCigarette::read(row)?),
      Collection::Records => Self::Record(RawRecord::read(row)?),
    })
  }

  pub fn into_entry(self) -> Result<Entry> {
    Ok(match self {
      Self::Cigarette(c) => Entry::Cigarette(c.into_cigarette()?),
      Self::Record(r) => Entry::Record(r.into_record()?),
    })
  }
}
