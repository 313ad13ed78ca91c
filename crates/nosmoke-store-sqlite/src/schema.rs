//! SQL schema and versioned upgrades for the nosmoke SQLite store.
//!
//! The schema version lives in `PRAGMA user_version`. Opening a database below
//! [`SCHEMA_VERSION`] runs the missing steps of [`MIGRATIONS`] in a single
//! immediate transaction; a database already at the current version is not
//! touched.

use std::{thread, time::Duration};

use rusqlite::{Connection, ErrorCode, TransactionBehavior};

/// Version the code expects on disk.
pub const SCHEMA_VERSION: u32 = 1;

/// Switching a file to WAL needs an exclusive lock and does not wait on the
/// busy handler, so a second connection opening the same new file retries.
const WAL_ATTEMPTS: u32 = 10;
const WAL_BACKOFF: Duration = Duration::from_millis(20);

/// `MIGRATIONS[n]` takes a database from version `n` to version `n + 1`.
/// Each step is idempotent so a half-created schema can be completed.
const MIGRATIONS: [&str; SCHEMA_VERSION as usize] = [V1];

const V1: &str = "
CREATE TABLE IF NOT EXISTS cigarettes (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT    NOT NULL,
    price       REAL    NOT NULL,
    pack_size   INTEGER NOT NULL CHECK (pack_size > 0),
    created_at  INTEGER NOT NULL,   -- epoch ms
    updated_at  INTEGER NOT NULL    -- epoch ms
);

CREATE INDEX IF NOT EXISTS cigarettes_name_idx       ON cigarettes(name);
CREATE INDEX IF NOT EXISTS cigarettes_created_at_idx ON cigarettes(created_at);

-- cigarette_id is not a foreign key: records outlive the cigarette they
-- reference.
CREATE TABLE IF NOT EXISTS records (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    cigarette_id    INTEGER NOT NULL,
    cigarette_name  TEXT    NOT NULL,
    kind            TEXT    NOT NULL CHECK (kind IN ('smoke', 'share')),
    price           REAL,
    timestamp       INTEGER NOT NULL,   -- epoch ms, logical event time
    created_at      INTEGER NOT NULL    -- epoch ms, write time
);

CREATE INDEX IF NOT EXISTS records_timestamp_idx    ON records(timestamp);
CREATE INDEX IF NOT EXISTS records_kind_idx         ON records(kind);
CREATE INDEX IF NOT EXISTS records_cigarette_id_idx ON records(cigarette_id);
";

/// What [`upgrade`] found and did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upgrade {
  /// Already at [`SCHEMA_VERSION`]; nothing ran.
  Current,
  /// Migrated from `from` to [`SCHEMA_VERSION`].
  Upgraded { from: u32 },
  /// The file is newer than this build understands; nothing ran.
  TooNew { found: u32 },
}

/// Per-connection settings, applied on every open outside any transaction.
/// Runs on the connection's own thread, so sleeping between attempts does
/// not block the runtime.
pub fn configure(conn: &Connection) -> rusqlite::Result<()> {
  let mut attempt = 1;
  loop {
    match enable_wal(conn) {
      Err(e) if is_busy(&e) && attempt < WAL_ATTEMPTS => {
        thread::sleep(WAL_BACKOFF * attempt);
        attempt += 1;
      }
      result => return result,
    }
  }
}

/// Put a file database into WAL mode unless it already is. In-memory
/// databases stay in `memory` mode.
fn enable_wal(conn: &Connection) -> rusqlite::Result<()> {
  if journal_mode(conn)?.eq_ignore_ascii_case("wal") {
    return Ok(());
  }
  conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
    row.get::<_, String>(0)
  })?;
  Ok(())
}

pub fn journal_mode(conn: &Connection) -> rusqlite::Result<String> {
  conn.pragma_query_value(None, "journal_mode", |row| row.get(0))
}

fn is_busy(err: &rusqlite::Error) -> bool {
  matches!(
    err.sqlite_error_code(),
    Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
  )
}

pub fn user_version(conn: &Connection) -> rusqlite::Result<u32> {
  conn.pragma_query_value(None, "user_version", |row| row.get(0))
}

/// Bring the database up to [`SCHEMA_VERSION`].
pub fn upgrade(conn: &mut Connection) -> rusqlite::Result<Upgrade> {
  let found = user_version(conn)?;
  if found > SCHEMA_VERSION {
    return Ok(Upgrade::TooNew { found });
  }
  if found == SCHEMA_VERSION {
    return Ok(Upgrade::Current);
  }

  // Re-read under the write lock. The immediate transaction waits on the
  // busy handler, so a second connection sees the first one's upgrade here.
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
  let from = user_version(&tx)?;
  if from >= SCHEMA_VERSION {
    return Ok(Upgrade::Current);
  }

  for step in &MIGRATIONS[from as usize..] {
    tx.execute_batch(step)?;
  }
  tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
  tx.commit()?;

  Ok(Upgrade::Upgraded { from })
}

#[cfg(test)]
mod tests {
  use nosmoke_core::entry::Collection;

  use super::*;

  fn count_objects(conn: &Connection, kind: &str) -> i64 {
    conn
      .query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = ?1 AND name NOT LIKE 'sqlite_%'",
        [kind],
        |row| row.get(0),
      )
      .unwrap()
  }

  #[test]
  fn fresh_database_is_upgraded() {
    let mut conn = Connection::open_in_memory().unwrap();
    assert_eq!(upgrade(&mut conn).unwrap(), Upgrade::Upgraded { from: 0 });
    assert_eq!(user_version(&conn).unwrap(), SCHEMA_VERSION);
    assert_eq!(count_objects(&conn, "table"), 2);
    assert_eq!(count_objects(&conn, "index"), 5);
  }

  #[test]
  fn second_upgrade_is_a_no_op() {
    let mut conn = Connection::open_in_memory().unwrap();
    upgrade(&mut conn).unwrap();

    let cookie: i64 = conn
      .pragma_query_value(None, "schema_version", |row| row.get(0))
      .unwrap();
    assert_eq!(upgrade(&mut conn).unwrap(), Upgrade::Current);
    let cookie_after: i64 = conn
      .pragma_query_value(None, "schema_version", |row| row.get(0))
      .unwrap();

    assert_eq!(cookie, cookie_after);
    assert_eq!(count_objects(&conn, "index"), 5);
  }

  #[test]
  fn partially_created_schema_is_completed() {
    let mut conn = Connection::open_in_memory().unwrap();
    conn
      .execute_batch(
        "CREATE TABLE cigarettes (
           id INTEGER PRIMARY KEY AUTOINCREMENT,
           name TEXT NOT NULL,
           price REAL NOT NULL,
           pack_size INTEGER NOT NULL CHECK (pack_size > 0),
           created_at INTEGER NOT NULL,
           updated_at INTEGER NOT NULL
         );",
      )
      .unwrap();

    assert_eq!(upgrade(&mut conn).unwrap(), Upgrade::Upgraded { from: 0 });
    assert_eq!(count_objects(&conn, "table"), 2);
    assert_eq!(count_objects(&conn, "index"), 5);
  }

  #[test]
  fn every_declared_index_exists_in_the_schema() {
    let mut conn = Connection::open_in_memory().unwrap();
    upgrade(&mut conn).unwrap();

    let mut declared = 0;
    for collection in Collection::ALL {
      for index in collection.indices() {
        assert_eq!(index.collection(), collection);
        let found: i64 = conn
          .query_row(
            "SELECT COUNT(*)
               FROM pragma_index_list(?1) AS l
               JOIN pragma_index_info(l.name) AS i
              WHERE i.name = ?2",
            [collection.as_ref(), index.field()],
            |row| row.get(0),
          )
          .unwrap();
        assert_eq!(found, 1, "no SQL index for {index}");
        declared += 1;
      }
    }
    assert_eq!(count_objects(&conn, "index"), declared);
  }

  #[test]
  fn configure_switches_file_to_wal_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wal.sqlite3");

    let first = Connection::open(&path).unwrap();
    configure(&first).unwrap();
    assert_eq!(journal_mode(&first).unwrap(), "wal");

    // Already in WAL: a second connection skips the switch even while the
    // first holds a write lock.
    first.execute_batch("BEGIN IMMEDIATE").unwrap();
    let second = Connection::open(&path).unwrap();
    configure(&second).unwrap();
    assert_eq!(journal_mode(&second).unwrap(), "wal");
    first.execute_batch("COMMIT").unwrap();
  }

  #[test]
  fn configure_leaves_memory_database_alone() {
    let conn = Connection::open_in_memory().unwrap();
    configure(&conn).unwrap();
    assert_eq!(journal_mode(&conn).unwrap(), "memory");
  }

  #[test]
  fn newer_database_is_left_alone() {
    let mut conn = Connection::open_in_memory().unwrap();
    conn.pragma_update(None, "user_version", 99).unwrap();

    assert_eq!(upgrade(&mut conn).unwrap(), Upgrade::TooNew { found: 99 });
    assert_eq!(count_objects(&conn, "table"), 0);
  }
}
