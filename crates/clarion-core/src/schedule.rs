//! Next-fire-instant computation for weekly recurring schedules.
//!
//! Pure functions, no state. The scan is timezone-generic so tests can pin a
//! zone; [`next_fire_instant`] is the convenience wrapper over the current
//! local timezone.

use chrono::{DateTime, Datelike, Duration, Local, NaiveTime, TimeZone};

use crate::alarm::WeekdaySet;

/// A weekday+time-of-day pair is unique within a 7-day window, so scanning
/// day offsets 0..=7 from today always reaches the earliest occurrence
/// (offset 7 covers a same-weekday schedule whose slot already passed today).
const LOOKAHEAD_DAYS: i64 = 7;

/// Compute the earliest instant strictly after `now` that lands on an active
/// weekday at `hour:minute:00` in `now`'s timezone.
///
/// Returns `None` for an empty weekday set (a valid "never fires" state) or
/// an out-of-range time-of-day. A wall-clock time that does not exist in the
/// zone (DST spring-forward gap) skips to the next candidate day; ambiguous
/// times resolve to the earlier instant.
pub fn next_fire_in<Tz: TimeZone>(
    hour: u32,
    minute: u32,
    weekdays: WeekdaySet,
    now: &DateTime<Tz>,
) -> Option<DateTime<Tz>> {
    if weekdays.is_empty() {
        return None;
    }
    let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
    let today = now.date_naive();

    for offset in 0..=LOOKAHEAD_DAYS {
        let date = today.checked_add_signed(Duration::days(offset))?;
        let Some(candidate) = now
            .timezone()
            .from_local_datetime(&date.and_time(time))
            .earliest()
        else {
            continue;
        };
        if candidate <= *now {
            continue;
        }
        // The weekday check uses the candidate's date, not `now`.
        if weekdays.contains_weekday(date.weekday()) {
            return Some(candidate);
        }
    }
    None
}

/// [`next_fire_in`] against the current local timezone and wall clock.
pub fn next_fire_instant(hour: u32, minute: u32, weekdays: WeekdaySet) -> Option<DateTime<Local>> {
    next_fire_in(hour, minute, weekdays, &Local::now())
}
