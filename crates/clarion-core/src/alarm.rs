//! Alarm record types.
//!
//! An [`Alarm`] pairs a local wall-clock time-of-day with the set of weekdays
//! it is active on. The id doubles as the registration key in the external
//! wake-timer service. Presentation fields (language, volume, vibration,
//! label) are opaque to the scheduling core; they travel as an
//! [`AnnouncePayload`] attached to each registration and are handed to the
//! announcer unchanged at fire time.

use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// Stable ordinal alarm identifier, assigned by the store at creation.
pub type AlarmId = i64;

const DAY_ABBREV: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Set of active weekdays, encoded as a bitmask over indices
/// 0=Sunday .. 6=Saturday.
///
/// May be empty, which makes the alarm inert even while enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    /// All seven weekdays.
    pub const EVERY_DAY: WeekdaySet = WeekdaySet(0b0111_1111);

    pub fn empty() -> Self {
        WeekdaySet(0)
    }

    /// Build from weekday indices. Indices above 6 are ignored.
    pub fn from_days<I: IntoIterator<Item = u8>>(days: I) -> Self {
        let mut set = Self::empty();
        for day in days {
            set.insert(day);
        }
        set
    }

    pub fn insert(&mut self, day: u8) {
        if day < 7 {
            self.0 |= 1 << day;
        }
    }

    pub fn remove(&mut self, day: u8) {
        if day < 7 {
            self.0 &= !(1 << day);
        }
    }

    pub fn contains(self, day: u8) -> bool {
        day < 7 && self.0 & (1 << day) != 0
    }

    pub fn contains_weekday(self, weekday: Weekday) -> bool {
        self.contains(weekday.num_days_from_sunday() as u8)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterate the member indices in ascending order.
    pub fn days(self) -> impl Iterator<Item = u8> {
        (0u8..7).filter(move |&d| self.contains(d))
    }

    /// Comma-separated index encoding, e.g. `"0,1,2"` (the storage format).
    pub fn to_csv(self) -> String {
        self.days()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Parse the comma-separated index encoding. Empty and malformed
    /// elements are skipped.
    pub fn from_csv(s: &str) -> Self {
        Self::from_days(
            s.split(',')
                .filter(|part| !part.is_empty())
                .filter_map(|part| part.trim().parse::<u8>().ok()),
        )
    }
}

impl std::fmt::Display for WeekdaySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "none");
        }
        let names: Vec<&str> = self.days().map(|d| DAY_ABBREV[d as usize]).collect();
        write!(f, "{}", names.join(","))
    }
}

/// Presentation fields carried opaquely from registration to announcement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnouncePayload {
    pub language_code: String,
    pub volume: f32,
    pub vibrate: bool,
    pub label: String,
}

impl Default for AnnouncePayload {
    fn default() -> Self {
        Self {
            language_code: "ko".to_string(),
            volume: 1.0,
            vibrate: true,
            label: String::new(),
        }
    }
}

/// A recurring weekly alarm record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alarm {
    pub id: AlarmId,
    /// Local wall-clock hour, 0-23.
    pub hour: u32,
    /// Local wall-clock minute, 0-59.
    pub minute: u32,
    pub weekdays: WeekdaySet,
    pub enabled: bool,
    pub language_code: String,
    pub volume: f32,
    pub vibrate: bool,
    pub label: String,
    /// Set only by the trigger handler.
    pub last_fired_at: Option<DateTime<Utc>>,
}

impl Alarm {
    /// Whether this alarm should have a live registration: enabled with at
    /// least one active weekday.
    pub fn is_armable(&self) -> bool {
        self.enabled && !self.weekdays.is_empty()
    }

    pub fn payload(&self) -> AnnouncePayload {
        AnnouncePayload {
            language_code: self.language_code.clone(),
            volume: self.volume,
            vibrate: self.vibrate,
            label: self.label.clone(),
        }
    }
}

/// Fields for a new alarm, before the store assigns an id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlarmDraft {
    pub hour: u32,
    pub minute: u32,
    pub weekdays: WeekdaySet,
    pub enabled: bool,
    pub language_code: String,
    pub volume: f32,
    pub vibrate: bool,
    pub label: String,
}

impl Default for AlarmDraft {
    fn default() -> Self {
        let payload = AnnouncePayload::default();
        Self {
            hour: 7,
            minute: 0,
            weekdays: WeekdaySet::empty(),
            enabled: true,
            language_code: payload.language_code,
            volume: payload.volume,
            vibrate: payload.vibrate,
            label: payload.label,
        }
    }
}

impl AlarmDraft {
    pub fn new(hour: u32, minute: u32, weekdays: WeekdaySet) -> Self {
        Self {
            hour,
            minute,
            weekdays,
            ..Self::default()
        }
    }
}
