//! Calendar-day boundaries expressed as epoch milliseconds.

use chrono::{DateTime, Days, Local, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};

/// Current time in epoch milliseconds.
pub fn now_millis() -> i64 { Utc::now().timestamp_millis() }

/// The inclusive millisecond span of one calendar day in some time zone:
/// `start` is local midnight, `end` is one millisecond before the next
/// local midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalDay {
  pub start: i64,
  pub end:   i64,
}

impl LocalDay {
  /// The day containing the current instant in the system time zone.
  pub fn today() -> Self { Self::containing(&Local::now()) }

  /// The day containing `instant`, in `instant`'s own time zone.
  pub fn containing<Tz: TimeZone>(instant: &DateTime<Tz>) -> Self {
    Self::of(instant.date_naive(), &instant.timezone())
  }

  pub fn of<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Self {
    let start = day_start(date, tz);
    let end = date
      .checked_add_days(Days::new(1))
      .map(|next| day_start(next, tz) - 1)
      .unwrap_or(i64::MAX);
    Self { start, end }
  }

  pub fn contains(&self, timestamp: i64) -> bool {
    (self.start..=self.end).contains(&timestamp)
  }
}

/// First instant of `date` in `tz`. Where a DST transition skips midnight,
/// the day starts at the first local time that exists.
fn day_start<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> i64 {
  let midnight = date.and_time(NaiveTime::MIN);
  (0..=3)
    .find_map(|hours| {
      tz.from_local_datetime(&(midnight + TimeDelta::hours(hours)))
        .earliest()
    })
    .map(|dt| dt.timestamp_millis())
    .unwrap_or_else(|| midnight.and_utc().timestamp_millis())
}

#[cfg(test)]
mod tests {
  use chrono::FixedOffset;

  use super::*;

  const HOUR: i64 = 3_600_000;

  #[test]
  fn utc_day_spans_whole_day() {
    let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
    let day = LocalDay::of(date, &Utc);

    assert_eq!(day.start, 1_710_028_800_000);
    assert_eq!(day.end - day.start, 24 * HOUR - 1);
  }

  #[test]
  fn offset_shifts_boundaries() {
    let tz = FixedOffset::east_opt(8 * 3600).unwrap();
    let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
    let day = LocalDay::of(date, &tz);

    assert_eq!(day.start, 1_710_028_800_000 - 8 * HOUR);
  }

  #[test]
  fn bounds_are_inclusive() {
    let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let day = LocalDay::of(date, &Utc);

    assert!(day.contains(day.start));
    assert!(day.contains(day.end));
    assert!(!day.contains(day.start - 1));
    assert!(!day.contains(day.end + 1));
  }

  #[test]
  fn containing_uses_instants_zone() {
    let tz = FixedOffset::west_opt(5 * 3600).unwrap();
    // 2024-01-02 02:00 UTC is still 2024-01-01 at UTC-5.
    let instant = Utc
      .with_ymd_and_hms(2024, 1, 2, 2, 0, 0)
      .unwrap()
      .with_timezone(&tz);
    let day = LocalDay::containing(&instant);

    let expected = LocalDay::of(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), &tz);
    assert_eq!(day, expected);
    assert!(day.contains(instant.timestamp_millis()));
  }

  #[test]
  fn today_contains_now() {
    assert!(LocalDay::today().contains(now_millis()));
  }
}
