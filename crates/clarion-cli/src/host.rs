//! File-backed wake-timer stand-in.
//!
//! Persists registrations to a JSON file under the data directory so they
//! survive across CLI invocations. This is the development host for the
//! `WakeTimerService` seam; a platform port binds the same trait to the real
//! wake-timer primitive. Registrations can be dropped out-of-band
//! (`watchdog drop`) to exercise the reconciliation loop.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use clarion_core::registrar::WakeTimerService;
use clarion_core::{AlarmId, AnnouncePayload, RegistrarError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub at: DateTime<Utc>,
    pub payload: AnnouncePayload,
}

type Registrations = BTreeMap<AlarmId, Registration>;

/// JSON-file-backed [`WakeTimerService`].
pub struct FileWakeTimer {
    path: PathBuf,
    // Serializes read-modify-write cycles against the file.
    lock: Mutex<()>,
}

impl FileWakeTimer {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Open at `<data_dir>/registrations.json`.
    pub fn open_default() -> Result<Self, RegistrarError> {
        let dir = clarion_core::storage::data_dir()
            .map_err(|e| RegistrarError::Unavailable(e.to_string()))?;
        Ok(Self::open(dir.join("registrations.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Registrations, RegistrarError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => serde_json::from_str(&content)
                .map_err(|e| RegistrarError::Unavailable(format!("corrupt registration file: {e}"))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Registrations::new()),
            Err(e) => Err(RegistrarError::Unavailable(e.to_string())),
        }
    }

    fn save(&self, registrations: &Registrations) -> Result<(), RegistrarError> {
        let content = serde_json::to_string_pretty(registrations)
            .map_err(|e| RegistrarError::Unavailable(e.to_string()))?;
        std::fs::write(&self.path, content).map_err(|e| RegistrarError::Unavailable(e.to_string()))
    }

    /// All live registrations, for inspection.
    pub fn snapshot(&self) -> Result<Vec<(AlarmId, Registration)>, RegistrarError> {
        let _guard = self.lock.lock().unwrap();
        Ok(self.load()?.into_iter().collect())
    }

    /// Remove and return every registration due at or before `now`
    /// (one-shot semantics: a delivered timer no longer exists).
    pub fn take_due(&self, now: DateTime<Utc>) -> Result<Vec<(AlarmId, Registration)>, RegistrarError> {
        let _guard = self.lock.lock().unwrap();
        let mut registrations = self.load()?;
        let due: Vec<AlarmId> = registrations
            .iter()
            .filter(|(_, reg)| reg.at <= now)
            .map(|(&id, _)| id)
            .collect();
        let taken = due
            .into_iter()
            .filter_map(|id| registrations.remove(&id).map(|reg| (id, reg)))
            .collect();
        self.save(&registrations)?;
        Ok(taken)
    }

    /// Remove and return the registration for `id`, regardless of due time.
    pub fn consume(&self, id: AlarmId) -> Result<Option<Registration>, RegistrarError> {
        let _guard = self.lock.lock().unwrap();
        let mut registrations = self.load()?;
        let taken = registrations.remove(&id);
        if taken.is_some() {
            self.save(&registrations)?;
        }
        Ok(taken)
    }

    /// Remove a registration without going through `cancel`, simulating the
    /// host silently dropping it. Returns whether anything was dropped.
    pub fn drop_registration(&self, id: AlarmId) -> Result<bool, RegistrarError> {
        Ok(self.consume(id)?.is_some())
    }
}

impl WakeTimerService for FileWakeTimer {
    fn register_one_shot(
        &self,
        id: AlarmId,
        at: DateTime<Utc>,
        payload: &AnnouncePayload,
    ) -> Result<(), RegistrarError> {
        let _guard = self.lock.lock().unwrap();
        let mut registrations = self.load()?;
        registrations.insert(
            id,
            Registration {
                at,
                payload: payload.clone(),
            },
        );
        self.save(&registrations)
    }

    fn cancel(&self, id: AlarmId) -> Result<(), RegistrarError> {
        let _guard = self.lock.lock().unwrap();
        let mut registrations = self.load()?;
        if registrations.remove(&id).is_some() {
            self.save(&registrations)?;
        }
        Ok(())
    }

    fn probe(&self, id: AlarmId) -> Result<bool, RegistrarError> {
        let _guard = self.lock.lock().unwrap();
        Ok(self.load()?.contains_key(&id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn timer() -> (tempfile::TempDir, FileWakeTimer) {
        let dir = tempfile::tempdir().unwrap();
        let timer = FileWakeTimer::open(dir.path().join("registrations.json"));
        (dir, timer)
    }

    #[test]
    fn register_probe_cancel_roundtrip() {
        let (_dir, timer) = timer();
        assert!(!timer.probe(1).unwrap());

        timer
            .register_one_shot(1, Utc::now(), &AnnouncePayload::default())
            .unwrap();
        assert!(timer.probe(1).unwrap());

        timer.cancel(1).unwrap();
        assert!(!timer.probe(1).unwrap());
        // Idempotent.
        timer.cancel(1).unwrap();
    }

    #[test]
    fn same_key_registration_overwrites() {
        let (_dir, timer) = timer();
        let first = Utc::now();
        let second = first + Duration::hours(1);
        timer
            .register_one_shot(1, first, &AnnouncePayload::default())
            .unwrap();
        timer
            .register_one_shot(1, second, &AnnouncePayload::default())
            .unwrap();

        let snapshot = timer.snapshot().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].1.at, second);
    }

    #[test]
    fn registrations_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registrations.json");
        FileWakeTimer::open(&path)
            .register_one_shot(3, Utc::now(), &AnnouncePayload::default())
            .unwrap();

        let reopened = FileWakeTimer::open(&path);
        assert!(reopened.probe(3).unwrap());
    }

    #[test]
    fn take_due_removes_only_due_entries() {
        let (_dir, timer) = timer();
        let now = Utc::now();
        timer
            .register_one_shot(1, now - Duration::minutes(1), &AnnouncePayload::default())
            .unwrap();
        timer
            .register_one_shot(2, now + Duration::hours(1), &AnnouncePayload::default())
            .unwrap();

        let due = timer.take_due(now).unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].0, 1);
        assert!(!timer.probe(1).unwrap());
        assert!(timer.probe(2).unwrap());
    }

    #[test]
    fn drop_registration_reports_whether_anything_was_dropped() {
        let (_dir, timer) = timer();
        timer
            .register_one_shot(5, Utc::now(), &AnnouncePayload::default())
            .unwrap();
        assert!(timer.drop_registration(5).unwrap());
        assert!(!timer.drop_registration(5).unwrap());
    }
}
