//! [`SqliteStore`] — the SQLite implementation of [`LocalStore`].

use std::{path::PathBuf, sync::Arc};

use rusqlite::{Connection, Params, params, params_from_iter, types::Value};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use nosmoke_core::{
  day::LocalDay,
  entry::{Collection, Entry, Index, IndexKey, KeyRange},
  record::Record,
  store::LocalStore,
};

use crate::{
  Error, Result,
  encode::{RawEntry, columns, encode_key, write_entry},
  schema::{self, SCHEMA_VERSION, Upgrade},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// Where the database lives.
#[derive(Debug, Clone)]
enum Location {
  File(PathBuf),
  Memory,
}

/// Lifecycle of the store's connection, as seen from outside.
///
/// Opening and upgrading happen inside a single first call, so callers only
/// ever observe the settled states: concurrent callers wait for that call to
/// finish rather than seeing it in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
  /// Nothing has touched the database yet, or the last open attempt failed.
  Unopened,
  /// Connected and at [`SCHEMA_VERSION`].
  Open,
}

/// A nosmoke store backed by a single SQLite file.
///
/// The connection is opened (and the schema upgraded) on first use, exactly
/// once: concurrent first callers wait for the same open attempt. Cloning is
/// cheap and clones share the connection.
#[derive(Clone)]
pub struct SqliteStore {
  location: Location,
  conn:     Arc<OnceCell<tokio_rusqlite::Connection>>,
}

impl SqliteStore {
  /// A store for the database at `path`. Nothing is opened until the first
  /// operation.
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self {
      location: Location::File(path.into()),
      conn:     Arc::new(OnceCell::new()),
    }
  }

  /// A lazily-opened private in-memory store.
  pub fn in_memory() -> Self {
    Self {
      location: Location::Memory,
      conn:     Arc::new(OnceCell::new()),
    }
  }

  /// Open (or create) a store at `path` and upgrade its schema now.
  pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
    let store = Self::new(path);
    store.connection().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let store = Self::in_memory();
    store.connection().await?;
    Ok(store)
  }

  pub fn state(&self) -> ConnectionState {
    if self.conn.initialized() {
      ConnectionState::Open
    } else {
      ConnectionState::Unopened
    }
  }

  /// The schema version recorded in the database file.
  pub async fn schema_version(&self) -> Result<u32> {
    let version = self
      .connection()
      .await?
      .call(|conn| Ok(schema::user_version(conn)?))
      .await?;
    Ok(version)
  }

  async fn connection(&self) -> Result<&tokio_rusqlite::Connection> {
    self.conn.get_or_try_init(|| connect(&self.location)).await
  }

  /// Run a `SELECT` over `collection` and decode every row.
  async fn select<P>(&self, collection: Collection, clause: String, params: P) -> Result<Vec<Entry>>
  where
    P: Params + Send + 'static,
  {
    let raws: Vec<RawEntry> = self
      .connection()
      .await?
      .call(move |conn| Ok(select_rows(conn, collection, &clause, params)?))
      .await?;

    raws.into_iter().map(RawEntry::into_entry).collect()
  }

  /// Decode a selection over `records` into records.
  async fn select_records<P>(&self, clause: String, params: P) -> Result<Vec<Record>>
  where
    P: Params + Send + 'static,
  {
    Ok(
      self
        .select(Collection::Records, clause, params)
        .await?
        .into_iter()
        .filter_map(Entry::into_record)
        .collect(),
    )
  }
}

/// Open the connection, apply pragmas and bring the schema up to date.
async fn connect(location: &Location) -> Result<tokio_rusqlite::Connection> {
  let conn = match location {
    Location::File(path) => tokio_rusqlite::Connection::open(path).await,
    Location::Memory => tokio_rusqlite::Connection::open_in_memory().await,
  }
  .map_err(Error::Open)?;

  let upgrade = conn
    .call(|conn| {
      schema::configure(conn)?;
      Ok(schema::upgrade(conn)?)
    })
    .await
    .map_err(Error::Open)?;

  match upgrade {
    Upgrade::Current => debug!(?location, version = SCHEMA_VERSION, "opened database"),
    Upgrade::Upgraded { from } => {
      info!(?location, from, to = SCHEMA_VERSION, "upgraded database schema");
    }
    Upgrade::TooNew { found } => {
      warn!(?location, found, supported = SCHEMA_VERSION, "refusing newer database");
      return Err(Error::SchemaTooNew { found, supported: SCHEMA_VERSION });
    }
  }

  Ok(conn)
}

fn select_rows<P: Params>(
  conn: &Connection,
  collection: Collection,
  clause: &str,
  params: P,
) -> rusqlite::Result<Vec<RawEntry>> {
  let sql = format!("SELECT {} FROM {collection} {clause}", columns(collection));
  let mut stmt = conn.prepare(&sql)?;
  stmt
    .query_map(params, |row| RawEntry::read(collection, row))?
    .collect()
}

// ─── LocalStore impl ─────────────────────────────────────────────────────────

impl LocalStore for SqliteStore {
  type Error = Error;

  // ── Generic operations ──────────────────────────────────────────────────

  async fn add(&self, entry: Entry) -> Result<i64> {
    let collection = entry.collection();
    if let Some(id) = entry.id() {
      return Err(nosmoke_core::Error::IdAlreadySet { collection, id }.into());
    }

    let id = self
      .connection()
      .await?
      .call(move |conn| Ok(write_entry(conn, &entry, None)?))
      .await?;

    debug!(%collection, id, "added entry");
    Ok(id)
  }

  async fn get_all(&self, collection: Collection) -> Result<Vec<Entry>> {
    let entries = self.select(collection, "ORDER BY id".to_owned(), []).await?;
    debug!(%collection, count = entries.len(), "listed entries");
    Ok(entries)
  }

  async fn get(&self, collection: Collection, id: i64) -> Result<Option<Entry>> {
    let entries = self
      .select(collection, "WHERE id = ?1".to_owned(), [id])
      .await?;
    Ok(entries.into_iter().next())
  }

  async fn update(&self, entry: Entry) -> Result<()> {
    let collection = entry.collection();
    let id = entry
      .id()
      .ok_or(nosmoke_core::Error::MissingId(collection))?;

    self
      .connection()
      .await?
      .call(move |conn| {
        write_entry(conn, &entry, Some(id))?;
        Ok(())
      })
      .await?;

    debug!(%collection, id, "updated entry");
    Ok(())
  }

  async fn delete(&self, collection: Collection, id: i64) -> Result<()> {
    let removed = self
      .connection()
      .await?
      .call(move |conn| {
        Ok(conn.execute(&format!("DELETE FROM {collection} WHERE id = ?1"), params![id])?)
      })
      .await?;

    debug!(%collection, id, removed, "deleted entry");
    Ok(())
  }

  async fn get_by_index(&self, index: Index, key: IndexKey) -> Result<Vec<Entry>> {
    index.check(&key)?;

    let clause = format!("WHERE {} = ?1 ORDER BY id", index.field());
    self
      .select(index.collection(), clause, [encode_key(&key)])
      .await
  }

  async fn get_by_index_range(&self, index: Index, range: KeyRange) -> Result<Vec<Entry>> {
    range.check(index)?;

    let field = index.field();
    let mut conds: Vec<String> = vec![];
    let mut values: Vec<Value> = vec![];
    if let Some(lower) = &range.lower {
      values.push(encode_key(lower));
      conds.push(format!("{field} >= ?{}", values.len()));
    }
    if let Some(upper) = &range.upper {
      values.push(encode_key(upper));
      conds.push(format!("{field} <= ?{}", values.len()));
    }

    let where_clause = if conds.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", conds.join(" AND "))
    };
    let clause = format!("{where_clause} ORDER BY {field}, id");

    self
      .select(index.collection(), clause, params_from_iter(values))
      .await
  }

  // ── Record queries ──────────────────────────────────────────────────────

  async fn get_latest_record(&self) -> Result<Option<Record>> {
    let latest = self
      .select_records("ORDER BY timestamp DESC, id DESC LIMIT 1".to_owned(), [])
      .await?;
    Ok(latest.into_iter().next())
  }

  async fn get_today_records(&self) -> Result<Vec<Record>> {
    let today = LocalDay::today();
    self.get_records_by_date_range(today.start, today.end).await
  }

  async fn get_records_by_date_range(&self, start: i64, end: i64) -> Result<Vec<Record>> {
    let records = self
      .get_by_index_range(Index::RecordTimestamp, KeyRange::bound(start, end))
      .await?
      .into_iter()
      .filter_map(Entry::into_record)
      .collect::<Vec<_>>();

    debug!(start, end, count = records.len(), "queried records by date range");
    Ok(records)
  }
}
