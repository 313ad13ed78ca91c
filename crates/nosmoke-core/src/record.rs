//! Record — one timestamped smoking event.
//!
//! Records copy the cigarette's name at the time they are written so that
//! history stays readable after the cigarette is renamed or deleted. The
//! store never checks that `cigarette_id` still exists.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{Error, Result, cigarette::Cigarette, entry::Collection};

/// What happened to the cigarette.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RecordKind {
  /// Smoked by the user.
  #[default]
  Smoke,
  /// Given away to someone else.
  Share,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
  /// Assigned by the store on insert; `None` until then.
  pub id:             Option<i64>,
  pub cigarette_id:   i64,
  /// Copy of the cigarette's name when the record was written.
  pub cigarette_name: String,
  pub kind:           RecordKind,
  /// Cost attributed to this event, if known.
  pub price:          Option<f64>,
  /// When the event happened, in epoch milliseconds. May be backdated.
  pub timestamp:      i64,
  /// When the record was written, in epoch milliseconds.
  pub created_at:     i64,
}

impl Record {
  /// A not-yet-persisted record with no price.
  pub fn new(
    cigarette_id: i64,
    cigarette_name: impl Into<String>,
    kind: RecordKind,
    timestamp: i64,
    created_at: i64,
  ) -> Self {
    Self {
      id: None,
      cigarette_id,
      cigarette_name: cigarette_name.into(),
      kind,
      price: None,
      timestamp,
      created_at,
    }
  }

  /// A record for one unit of a persisted `cigarette`, priced at its unit
  /// price.
  pub fn for_cigarette(
    cigarette: &Cigarette,
    kind: RecordKind,
    timestamp: i64,
    created_at: i64,
  ) -> Result<Self> {
    let cigarette_id = cigarette
      .id
      .ok_or(Error::MissingId(Collection::Cigarettes))?;

    Ok(Self {
      price: cigarette.unit_price(),
      ..Self::new(cigarette_id, &*cigarette.name, kind, timestamp, created_at)
    })
  }
}
