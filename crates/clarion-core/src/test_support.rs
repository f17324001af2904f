//! Shared in-memory fakes for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::alarm::{Alarm, AlarmId, AnnouncePayload, WeekdaySet};
use crate::error::RegistrarError;
use crate::storage::AlarmDb;
use crate::trigger::{AnnounceRequest, Announcer, StayAwake, WakeGuard};

pub fn test_alarm(id: AlarmId, hour: u32, minute: u32, weekdays: WeekdaySet) -> Alarm {
    Alarm {
        id,
        hour,
        minute,
        weekdays,
        enabled: true,
        language_code: "ko".into(),
        volume: 1.0,
        vibrate: true,
        label: String::new(),
        last_fired_at: None,
    }
}

pub fn mem_store() -> Arc<AlarmDb> {
    Arc::new(AlarmDb::open_memory().expect("in-memory store"))
}

/// In-memory [`crate::registrar::WakeTimerService`] with failure injection
/// and out-of-band drops, standing in for the unreliable host service.
#[derive(Default)]
pub struct InMemoryWakeTimer {
    registrations: Mutex<HashMap<AlarmId, (DateTime<Utc>, AnnouncePayload)>>,
    deny_permission: AtomicBool,
    unavailable: AtomicBool,
    fail_register: Mutex<HashSet<AlarmId>>,
}

impl InMemoryWakeTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deny_permission(&self, deny: bool) {
        self.deny_permission.store(deny, Ordering::SeqCst);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make `register_one_shot` fail with `Unavailable` for one id only.
    pub fn fail_register_for(&self, id: AlarmId) {
        self.fail_register.lock().unwrap().insert(id);
    }

    /// Remove a registration without going through `cancel`, simulating the
    /// host silently dropping it under power saving.
    pub fn drop_out_of_band(&self, id: AlarmId) {
        self.registrations.lock().unwrap().remove(&id);
    }

    pub fn registered_at(&self, id: AlarmId) -> Option<DateTime<Utc>> {
        self.registrations.lock().unwrap().get(&id).map(|(at, _)| *at)
    }

    pub fn payload_for(&self, id: AlarmId) -> Option<AnnouncePayload> {
        self.registrations
            .lock()
            .unwrap()
            .get(&id)
            .map(|(_, p)| p.clone())
    }

    pub fn len(&self) -> usize {
        self.registrations.lock().unwrap().len()
    }

    fn check_reachable(&self) -> Result<(), RegistrarError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RegistrarError::Unavailable("injected outage".into()));
        }
        Ok(())
    }
}

impl crate::registrar::WakeTimerService for InMemoryWakeTimer {
    fn register_one_shot(
        &self,
        id: AlarmId,
        at: DateTime<Utc>,
        payload: &AnnouncePayload,
    ) -> Result<(), RegistrarError> {
        if self.deny_permission.load(Ordering::SeqCst) {
            return Err(RegistrarError::PermissionDenied);
        }
        self.check_reachable()?;
        if self.fail_register.lock().unwrap().contains(&id) {
            return Err(RegistrarError::Unavailable("injected per-id failure".into()));
        }
        self.registrations
            .lock()
            .unwrap()
            .insert(id, (at, payload.clone()));
        Ok(())
    }

    fn cancel(&self, id: AlarmId) -> Result<(), RegistrarError> {
        self.check_reachable()?;
        self.registrations.lock().unwrap().remove(&id);
        Ok(())
    }

    fn probe(&self, id: AlarmId) -> Result<bool, RegistrarError> {
        self.check_reachable()?;
        Ok(self.registrations.lock().unwrap().contains_key(&id))
    }
}

/// Records announce requests in invocation order.
#[derive(Default)]
pub struct RecordingAnnouncer {
    requests: Mutex<Vec<AnnounceRequest>>,
}

impl RecordingAnnouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<AnnounceRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Announcer for RecordingAnnouncer {
    fn announce(&self, request: &AnnounceRequest) {
        self.requests.lock().unwrap().push(request.clone());
    }
}

/// Counts acquisitions and releases so tests can assert the guard is
/// released on every exit path.
#[derive(Default)]
pub struct CountingStayAwake {
    acquired: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
}

impl CountingStayAwake {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

impl StayAwake for CountingStayAwake {
    fn acquire(&self, _tag: &'static str, _timeout: Duration) -> WakeGuard {
        self.acquired.fetch_add(1, Ordering::SeqCst);
        let released = self.released.clone();
        WakeGuard::with_release(move || {
            released.fetch_add(1, Ordering::SeqCst);
        })
    }
}
