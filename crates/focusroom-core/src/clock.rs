//! Wall clock access and naive local calendar days.
//!
//! Every date in Focusroom is a naive local calendar day. Timestamps are
//! milliseconds since the Unix epoch and are mapped to days through the
//! host's local offset.

use std::cell::Cell;

use chrono::{Local, LocalResult, NaiveDate, NaiveTime, TimeZone};

use crate::error::ValidationError;

const DAY_FORMAT: &str = "%d.%m.%Y";

/// Source of "now" for the scheduler and statistics.
pub trait Clock {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;

    /// Today's local calendar day.
    fn today(&self) -> NaiveDate {
        day_of(self.now_ms())
    }
}

/// The real clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Local::now().timestamp_millis()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A settable clock for tests and replays.
#[derive(Debug, Clone, Default)]
pub struct FixedClock {
    now_ms: Cell<i64>,
}

impl FixedClock {
    pub fn at(now_ms: i64) -> Self {
        Self {
            now_ms: Cell::new(now_ms),
        }
    }

    /// Clock pinned to local noon on `date`.
    pub fn on(date: NaiveDate) -> Self {
        Self::at(local_noon_ms(date))
    }

    pub fn set(&self, now_ms: i64) {
        self.now_ms.set(now_ms);
    }

    pub fn advance_ms(&self, delta_ms: i64) {
        self.now_ms.set(self.now_ms.get() + delta_ms);
    }
}

impl Clock for FixedClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.get()
    }
}

/// Local calendar day containing `epoch_ms`.
///
/// Out-of-range timestamps fall back to the UTC day.
pub fn day_of(epoch_ms: i64) -> NaiveDate {
    match Local.timestamp_millis_opt(epoch_ms) {
        LocalResult::Single(dt) => dt.date_naive(),
        LocalResult::Ambiguous(earliest, _) => earliest.date_naive(),
        LocalResult::None => chrono::DateTime::from_timestamp_millis(epoch_ms)
            .map(|dt| dt.date_naive())
            .unwrap_or_default(),
    }
}

/// Epoch milliseconds of local noon on `date`.
///
/// Noon keeps clear of midnight daylight-saving gaps.
pub fn local_noon_ms(date: NaiveDate) -> i64 {
    let noon = date.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default());
    match Local.from_local_datetime(&noon) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.timestamp_millis(),
        LocalResult::None => noon.and_utc().timestamp_millis(),
    }
}

/// Parse a `dd.MM.yyyy` calendar day. ISO `yyyy-MM-dd` is accepted too.
pub fn parse_day(input: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = input.trim();
    NaiveDate::parse_from_str(trimmed, DAY_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y-%m-%d"))
        .map_err(|_| ValidationError::InvalidDate(input.to_string()))
}

/// Render a calendar day as `dd.MM.yyyy`.
pub fn format_day(date: NaiveDate) -> String {
    date.format(DAY_FORMAT).to_string()
}
