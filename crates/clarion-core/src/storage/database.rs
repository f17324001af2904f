//! SQLite-backed alarm store.
//!
//! Schema mirrors the alarm record: wall-clock time-of-day, CSV-encoded
//! weekday set, enabled flag, presentation fields, and a single last-fired
//! timestamp. Listing is ordered by (hour, minute).

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use super::AlarmStore;
use crate::alarm::{Alarm, AlarmDraft, AlarmId, WeekdaySet};
use crate::error::StoreError;

/// SQLite database holding alarm records.
///
/// The connection sits behind a mutex so the store can be shared across the
/// trigger handler, the reconciliation loop, and the user-edit path.
pub struct AlarmDb {
    conn: Mutex<Connection>,
}

impl AlarmDb {
    /// Open the database at `<data_dir>/alarms.db`.
    pub fn open() -> Result<Self, StoreError> {
        let path = super::data_dir()
            .map_err(|e| StoreError::MigrationFailed(e.to_string()))?
            .join("alarms.db");
        Self::open_at(&path)
    }

    /// Open (or create) the database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: PathBuf::from(path),
            source,
        })?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (tests and ephemeral hosts).
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), StoreError> {
        self.conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS alarms (
                    id            INTEGER PRIMARY KEY AUTOINCREMENT,
                    hour          INTEGER NOT NULL,
                    minute        INTEGER NOT NULL,
                    days_of_week  TEXT NOT NULL DEFAULT '',
                    enabled       INTEGER NOT NULL DEFAULT 1,
                    language_code TEXT NOT NULL DEFAULT 'ko',
                    volume        REAL NOT NULL DEFAULT 1.0,
                    vibrate       INTEGER NOT NULL DEFAULT 1,
                    label         TEXT NOT NULL DEFAULT '',
                    last_fired_at TEXT
                );

                CREATE INDEX IF NOT EXISTS idx_alarms_time ON alarms(hour, minute);",
            )
            .map_err(|e| StoreError::MigrationFailed(e.to_string()))
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

fn row_to_alarm(row: &Row<'_>) -> rusqlite::Result<Alarm> {
    let days: String = row.get("days_of_week")?;
    let last_fired: Option<String> = row.get("last_fired_at")?;
    Ok(Alarm {
        id: row.get("id")?,
        hour: row.get("hour")?,
        minute: row.get("minute")?,
        weekdays: WeekdaySet::from_csv(&days),
        enabled: row.get("enabled")?,
        language_code: row.get("language_code")?,
        volume: row.get::<_, f64>("volume")? as f32,
        vibrate: row.get("vibrate")?,
        label: row.get("label")?,
        // A corrupt timestamp degrades to "never fired" rather than failing
        // the whole row.
        last_fired_at: last_fired
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc)),
    })
}

const SELECT_COLUMNS: &str = "id, hour, minute, days_of_week, enabled, \
     language_code, volume, vibrate, label, last_fired_at";

impl AlarmStore for AlarmDb {
    fn list(&self) -> Result<Vec<Alarm>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM alarms ORDER BY hour, minute"
        ))?;
        let alarms = stmt
            .query_map([], row_to_alarm)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(alarms)
    }

    fn get(&self, id: AlarmId) -> Result<Option<Alarm>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM alarms WHERE id = ?1"
        ))?;
        let mut rows = stmt.query_map(params![id], row_to_alarm)?;
        rows.next().transpose().map_err(StoreError::from)
    }

    fn insert(&self, draft: &AlarmDraft) -> Result<Alarm, StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO alarms (hour, minute, days_of_week, enabled, \
             language_code, volume, vibrate, label)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                draft.hour,
                draft.minute,
                draft.weekdays.to_csv(),
                draft.enabled,
                draft.language_code,
                draft.volume as f64,
                draft.vibrate,
                draft.label,
            ],
        )?;
        let id = conn.last_insert_rowid();
        Ok(Alarm {
            id,
            hour: draft.hour,
            minute: draft.minute,
            weekdays: draft.weekdays,
            enabled: draft.enabled,
            language_code: draft.language_code.clone(),
            volume: draft.volume,
            vibrate: draft.vibrate,
            label: draft.label.clone(),
            last_fired_at: None,
        })
    }

    fn update(&self, alarm: &Alarm) -> Result<bool, StoreError> {
        let changed = self.conn()?.execute(
            "UPDATE alarms SET hour = ?2, minute = ?3, days_of_week = ?4, \
             enabled = ?5, language_code = ?6, volume = ?7, vibrate = ?8, \
             label = ?9 WHERE id = ?1",
            params![
                alarm.id,
                alarm.hour,
                alarm.minute,
                alarm.weekdays.to_csv(),
                alarm.enabled,
                alarm.language_code,
                alarm.volume as f64,
                alarm.vibrate,
                alarm.label,
            ],
        )?;
        Ok(changed > 0)
    }

    fn delete(&self, id: AlarmId) -> Result<bool, StoreError> {
        let changed = self
            .conn()?
            .execute("DELETE FROM alarms WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    fn set_last_fired(&self, id: AlarmId, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.conn()?.execute(
            "UPDATE alarms SET last_fired_at = ?2 WHERE id = ?1",
            params![id, at.to_rfc3339()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(hour: u32, minute: u32, days: &[u8]) -> AlarmDraft {
        AlarmDraft::new(hour, minute, WeekdaySet::from_days(days.iter().copied()))
    }

    #[test]
    fn insert_assigns_sequential_ids() {
        let db = AlarmDb::open_memory().unwrap();
        let a = db.insert(&draft(7, 0, &[1])).unwrap();
        let b = db.insert(&draft(8, 0, &[2])).unwrap();
        assert!(b.id > a.id);
        assert_eq!(db.get(a.id).unwrap().unwrap(), a);
    }

    #[test]
    fn list_orders_by_time_of_day() {
        let db = AlarmDb::open_memory().unwrap();
        db.insert(&draft(9, 15, &[0])).unwrap();
        db.insert(&draft(6, 30, &[0])).unwrap();
        db.insert(&draft(6, 5, &[0])).unwrap();

        let times: Vec<(u32, u32)> = db
            .list()
            .unwrap()
            .iter()
            .map(|a| (a.hour, a.minute))
            .collect();
        assert_eq!(times, vec![(6, 5), (6, 30), (9, 15)]);
    }

    #[test]
    fn update_persists_changes_and_reports_missing_rows() {
        let db = AlarmDb::open_memory().unwrap();
        let mut alarm = db.insert(&draft(7, 0, &[1, 2])).unwrap();

        alarm.minute = 45;
        alarm.enabled = false;
        alarm.label = "stand-up".into();
        assert!(db.update(&alarm).unwrap());

        let stored = db.get(alarm.id).unwrap().unwrap();
        assert_eq!(stored.minute, 45);
        assert!(!stored.enabled);
        assert_eq!(stored.label, "stand-up");

        alarm.id = 9999;
        assert!(!db.update(&alarm).unwrap());
    }

    #[test]
    fn delete_removes_the_row() {
        let db = AlarmDb::open_memory().unwrap();
        let alarm = db.insert(&draft(7, 0, &[1])).unwrap();
        assert!(db.delete(alarm.id).unwrap());
        assert!(!db.delete(alarm.id).unwrap());
        assert!(db.get(alarm.id).unwrap().is_none());
    }

    #[test]
    fn last_fired_roundtrips_through_rfc3339() {
        let db = AlarmDb::open_memory().unwrap();
        let alarm = db.insert(&draft(7, 0, &[1])).unwrap();
        assert_eq!(alarm.last_fired_at, None);

        let at = Utc::now();
        db.set_last_fired(alarm.id, at).unwrap();
        let stored = db.get(alarm.id).unwrap().unwrap();
        assert_eq!(stored.last_fired_at, Some(at));
    }

    #[test]
    fn set_last_fired_on_missing_id_is_a_noop() {
        let db = AlarmDb::open_memory().unwrap();
        db.set_last_fired(12345, Utc::now()).unwrap();
        assert!(db.list().unwrap().is_empty());
    }

    #[test]
    fn records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alarms.db");
        let id = {
            let db = AlarmDb::open_at(&path).unwrap();
            db.insert(&draft(7, 0, &[1, 5])).unwrap().id
        };

        let reopened = AlarmDb::open_at(&path).unwrap();
        let stored = reopened.get(id).unwrap().unwrap();
        assert_eq!(stored.weekdays, WeekdaySet::from_days([1, 5]));
    }

    #[test]
    fn weekdays_roundtrip_through_csv_column() {
        let db = AlarmDb::open_memory().unwrap();
        let alarm = db.insert(&draft(7, 0, &[0, 3, 6])).unwrap();
        let stored = db.get(alarm.id).unwrap().unwrap();
        assert_eq!(stored.weekdays, WeekdaySet::from_days([0, 3, 6]));
    }
}
