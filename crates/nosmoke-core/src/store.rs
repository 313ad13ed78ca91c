//! The `LocalStore` trait.
//!
//! Implemented by storage backends (e.g. `nosmoke-store-sqlite`). Callers such
//! as the `nosmoke` CLI depend on this abstraction, not on a concrete backend.

use std::future::Future;

use crate::{
  entry::{Collection, Entry, Index, IndexKey, KeyRange},
  record::Record,
};

/// Persistent storage for cigarettes and smoking records.
///
/// Every operation touches exactly one collection. Sequences of calls are not
/// atomic: a failure between "add cigarette" and "add record" leaves the
/// first write in place.
///
/// Misses are not errors. Lookups return `None` or an empty `Vec`.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait LocalStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Generic operations ──────────────────────────────────────────────────

  /// Insert `entry` into its collection and return the assigned id.
  ///
  /// The entry must not carry an id; ids only ever increase and are never
  /// reused within a collection.
  fn add(&self, entry: Entry) -> impl Future<Output = Result<i64, Self::Error>> + Send + '_;

  /// Every entry in `collection`, in primary-key order.
  fn get_all(
    &self,
    collection: Collection,
  ) -> impl Future<Output = Result<Vec<Entry>, Self::Error>> + Send + '_;

  fn get(
    &self,
    collection: Collection,
    id: i64,
  ) -> impl Future<Output = Result<Option<Entry>, Self::Error>> + Send + '_;

  /// Replace the entry stored under `entry`'s id, inserting it if absent.
  /// The entry must carry an id.
  fn update(&self, entry: Entry) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Remove an entry. Deleting an id that does not exist succeeds.
  fn delete(
    &self,
    collection: Collection,
    id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Entries whose indexed field equals `key`, in primary-key order.
  fn get_by_index(
    &self,
    index: Index,
    key: IndexKey,
  ) -> impl Future<Output = Result<Vec<Entry>, Self::Error>> + Send + '_;

  /// Entries whose indexed field lies within `range`, in index order.
  fn get_by_index_range(
    &self,
    index: Index,
    range: KeyRange,
  ) -> impl Future<Output = Result<Vec<Entry>, Self::Error>> + Send + '_;

  // ── Record queries ──────────────────────────────────────────────────────

  /// The record with the greatest `timestamp`, if any.
  fn get_latest_record(
    &self,
  ) -> impl Future<Output = Result<Option<Record>, Self::Error>> + Send + '_;

  /// Records whose `timestamp` falls on the current local calendar day.
  fn get_today_records(
    &self,
  ) -> impl Future<Output = Result<Vec<Record>, Self::Error>> + Send + '_;

  /// Records with `start <= timestamp <= end`, in timestamp order.
  /// `start > end` yields nothing.
  fn get_records_by_date_range(
    &self,
    start: i64,
    end: i64,
  ) -> impl Future<Output = Result<Vec<Record>, Self::Error>> + Send + '_;
}
