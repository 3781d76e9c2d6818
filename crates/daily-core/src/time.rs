//! Day-level time helpers.
//!
//! This module provides [`SyncWindow`], the span of local calendar days a
//! cache is authoritative for, plus conversions between local days and the
//! UTC instants a provider expects.

use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A half-open range of local calendar days `[start_day, end_day)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncWindow {
    /// First day covered (inclusive).
    pub start_day: NaiveDate,
    /// First day past the window (exclusive).
    pub end_day: NaiveDate,
}

impl SyncWindow {
    /// Creates a window spanning `half_window_days` on each side of `day`.
    pub fn around(day: NaiveDate, half_window_days: u64) -> Self {
        let span = Days::new(half_window_days);
        Self {
            start_day: day.checked_sub_days(span).unwrap_or(NaiveDate::MIN),
            end_day: day.checked_add_days(span).unwrap_or(NaiveDate::MAX),
        }
    }

    /// Returns true if `day` falls inside the window.
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start_day <= day && day < self.end_day
    }

    /// Whole days between the window start and `day` (negative if before).
    pub fn days_from_start(&self, day: NaiveDate) -> i64 {
        (day - self.start_day).num_days()
    }

    /// Whole days between `day` and the window end (negative if after).
    pub fn days_to_end(&self, day: NaiveDate) -> i64 {
        (self.end_day - day).num_days()
    }

    /// Returns true if `day` lies within `threshold` days of either edge,
    /// or outside the window altogether.
    pub fn is_near_edge(&self, day: NaiveDate, threshold: i64) -> bool {
        self.days_from_start(day) < threshold || self.days_to_end(day) < threshold
    }

    /// Returns the window bounds as UTC instants at local midnight.
    pub fn to_utc_range<Tz: TimeZone>(&self, tz: &Tz) -> (DateTime<Utc>, DateTime<Utc>) {
        (
            local_midnight_utc(self.start_day, tz),
            local_midnight_utc(self.end_day, tz),
        )
    }
}

/// Returns the UTC instant of local midnight at the start of `day`.
///
/// When midnight is ambiguous the earlier instant is used; when it does not
/// exist (a DST gap at midnight) the day's start is read as UTC.
pub fn local_midnight_utc<Tz: TimeZone>(day: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let midnight = day.and_time(chrono::NaiveTime::MIN);
    tz.from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| midnight.and_utc())
}

/// Checks whether `instant` falls on `day` in the given timezone.
pub fn is_on_day<Tz: TimeZone>(instant: DateTime<Utc>, day: NaiveDate, tz: &Tz) -> bool {
    instant.with_timezone(tz).date_naive() == day
}
