//! crates/care_directory_core/src/availability.rs
//!
//! Decides when only pharmacies on night/Sunday duty count as available.

use chrono::{Datelike, Local, NaiveDateTime, NaiveTime, Timelike, Weekday};

use crate::ports::Clock;

// (seconds from midnight, nanoseconds) so the comparison stays exact to the nanosecond.
const NIGHT_STARTS_AFTER: (u32, u32) = (23 * 3600, 0);
const NIGHT_ENDS_BEFORE: (u32, u32) = (8 * 3600, 0);

/// True strictly after 23:00 or strictly before 08:00.
///
/// 23:00:00.000 and 08:00:00.000 are themselves day time.
pub fn is_night_window(time: NaiveTime) -> bool {
    let t = (time.num_seconds_from_midnight(), time.nanosecond());
    t > NIGHT_STARTS_AFTER || t < NIGHT_ENDS_BEFORE
}

/// Whether the open-tonight restriction must be forced on at `now`.
pub fn must_force_open_filter(now: NaiveDateTime) -> bool {
    is_night_window(now.time()) || now.weekday() == Weekday::Sun
}

/// The open-tonight constraint to hand to a pharmacy filter: `Some(true)` when
/// forced, otherwise no constraint at all.
pub fn open_tonight_constraint(now: NaiveDateTime) -> Option<bool> {
    must_force_open_filter(now).then_some(true)
}

/// Reads the host's local wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}
