//! Wall-clock utilities for record tags and log file names.
//!
//! This module provides the `Clock` abstraction the logger reads the current
//! time from, plus the two fixed-width renderings of a timestamp used on disk.

use std::fmt::Write as _;

use chrono::{Local, NaiveDateTime};
use parking_lot::Mutex;

/// Format of the timestamp inside a record tag: `YYYY-MM-DD HH:MM:SS`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format of a log file name: the record timestamp with every `:` replaced by `-`.
pub const FILE_STAMP_FORMAT: &str = "%Y-%m-%d %H-%M-%S";

/// Source of local wall-clock time.
///
/// The logger only needs calendar fields down to the second, so implementations
/// return a timezone-free local `NaiveDateTime`.
///
/// # Examples
///
/// ```
/// # use rolling_logger::clock::{Clock, ManualClock, format_timestamp};
/// let clock = ManualClock::from_ymd_hms(2024, 3, 7, 9, 5, 3);
/// assert_eq!(format_timestamp(clock.now()), "2024-03-07 09:05:03");
/// ```
pub trait Clock: Send + Sync {
    /// Returns the current local time.
    fn now(&self) -> NaiveDateTime;
}

/// Clock backed by the operating system's local time zone.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalClock;

impl Clock for LocalClock {
    #[inline]
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock that only moves when told to.
///
/// Useful for tests and for replaying logs with synthetic times: each rotation
/// can be given a distinct, predictable file name by advancing the clock.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
}

impl ManualClock {
    /// Creates a clock frozen at `now`.
    pub fn new(now: NaiveDateTime) -> Self {
        Self { now: Mutex::new(now) }
    }

    /// Creates a clock frozen at the given calendar date and time.
    ///
    /// # Panics
    ///
    /// Panics if the fields do not form a valid date and time.
    pub fn from_ymd_hms(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Self {
        let now = chrono::NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_opt(hour, min, sec))
            .unwrap_or_else(|| panic!("invalid date {year}-{month}-{day} {hour}:{min}:{sec}"));
        Self::new(now)
    }

    /// Moves the clock to `now`.
    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock() = now;
    }

    /// Moves the clock forward by `secs` seconds.
    pub fn advance_secs(&self, secs: i64) {
        let mut now = self.now.lock();
        *now += chrono::Duration::seconds(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock()
    }
}

/// Renders `time` as `YYYY-MM-DD HH:MM:SS`.
pub fn format_timestamp(time: NaiveDateTime) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}

/// Renders `time` as a file name stem, `YYYY-MM-DD HH-MM-SS`.
pub fn file_stamp(time: NaiveDateTime) -> String {
    time.format(FILE_STAMP_FORMAT).to_string()
}

/// Appends the record timestamp to `out` without an intermediate allocation.
#[inline]
pub(crate) fn write_timestamp(out: &mut String, time: NaiveDateTime) {
    // Writing into a String cannot fail.
    let _ = write!(out, "{}", time.format(TIMESTAMP_FORMAT));
}

/// Parses a file name stem produced by [`file_stamp`].
pub fn parse_file_stamp(stem: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(stem, FILE_STAMP_FORMAT).ok()
}
