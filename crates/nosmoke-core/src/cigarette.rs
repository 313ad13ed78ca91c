//! Cigarette — a catalog entry for something the user tracks.

use serde::{Deserialize, Serialize};

/// A kind of cigarette the user smokes, priced per pack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cigarette {
  /// Assigned by the store on insert; `None` until then.
  pub id:         Option<i64>,
  /// Display label. Not unique.
  pub name:       String,
  /// Price of one pack.
  pub price:      f64,
  /// Units per pack; the store rejects zero.
  pub pack_size:  u32,
  /// Epoch milliseconds.
  pub created_at: i64,
  /// Epoch milliseconds.
  pub updated_at: i64,
}

impl Cigarette {
  /// A not-yet-persisted cigarette created (and last updated) at `now`.
  pub fn new(name: impl Into<String>, price: f64, pack_size: u32, now: i64) -> Self {
    Self {
      id: None,
      name: name.into(),
      price,
      pack_size,
      created_at: now,
      updated_at: now,
    }
  }

  /// Price of a single cigarette, or `None` for an empty pack.
  pub fn unit_price(&self) -> Option<f64> {
    (self.pack_size > 0).then(|| self.price / f64::from(self.pack_size))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn new_leaves_id_unset() {
    let c = Cigarette::new("Marlboro", 24.0, 20, 1_000);
    assert_eq!(c.id, None);
    assert_eq!(c.created_at, 1_000);
    assert_eq!(c.updated_at, 1_000);
  }

  #[test]
  fn unit_price_divides_pack_price() {
    let c = Cigarette::new("Marlboro", 24.0, 20, 0);
    assert_eq!(c.unit_price(), Some(1.2));
  }

  #[test]
  fn unit_price_of_empty_pack_is_none() {
    let c = Cigarette::new("Nothing", 10.0, 0, 0);
    assert_eq!(c.unit_price(), None);
  }
}
