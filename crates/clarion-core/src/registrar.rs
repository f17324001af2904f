//! Registration choke point over the external one-shot wake-timer service.
//!
//! Every register/cancel mutation in the system flows through
//! [`TimerRegistrar`], which pairs the schedule calculator with the external
//! service. The service is modelled as a trait so hosts supply the platform
//! binding and tests supply an in-memory fake.
//!
//! Concurrent callers for the same alarm id are not serialized: same-key
//! registration atomically replaces, so races resolve last-write-wins and any
//! stale outcome is repaired within one reconciliation cadence.

use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use tracing::{info, warn};

use crate::alarm::{Alarm, AlarmId, AnnouncePayload};
use crate::error::RegistrarError;
use crate::schedule;

/// External one-shot wake-timer service, keyed by alarm id.
///
/// Registrations do not survive a full system restart and may be silently
/// dropped by the host under power-saving states.
pub trait WakeTimerService: Send + Sync {
    /// Register a one-shot wake timer, atomically replacing any existing
    /// registration under the same id (never duplicating it).
    fn register_one_shot(
        &self,
        id: AlarmId,
        at: DateTime<Utc>,
        payload: &AnnouncePayload,
    ) -> Result<(), RegistrarError>;

    /// Cancel the registration for `id`. No-op if nothing is registered.
    fn cancel(&self, id: AlarmId) -> Result<(), RegistrarError>;

    /// Existence probe with no-create semantics: must not register anything
    /// as a side effect.
    fn probe(&self, id: AlarmId) -> Result<bool, RegistrarError>;
}

/// Schedule-aware wrapper over a [`WakeTimerService`].
#[derive(Clone)]
pub struct TimerRegistrar {
    service: Arc<dyn WakeTimerService>,
}

impl TimerRegistrar {
    pub fn new(service: Arc<dyn WakeTimerService>) -> Self {
        Self { service }
    }

    /// Compute the alarm's next fire instant and register it, replacing any
    /// existing registration.
    ///
    /// An alarm with no active weekdays has nothing to arm; any stale
    /// registration is cancelled instead and `Ok(None)` is returned.
    ///
    /// # Errors
    /// Service failures are returned to the caller, which should log or
    /// surface them and leave the previous registration as the best-effort
    /// state.
    pub fn arm_next(
        &self,
        alarm: &Alarm,
        now: DateTime<Local>,
    ) -> Result<Option<DateTime<Utc>>, RegistrarError> {
        if alarm.weekdays.is_empty() {
            warn!(
                alarm_id = alarm.id,
                "alarm has no active weekdays, cancelling any existing registration"
            );
            self.disarm(alarm.id)?;
            return Ok(None);
        }

        let Some(at) = schedule::next_fire_in(alarm.hour, alarm.minute, alarm.weekdays, &now)
        else {
            // Unreachable for a non-empty set with a valid time-of-day.
            warn!(alarm_id = alarm.id, "no valid next fire instant");
            return Ok(None);
        };
        let at_utc = at.with_timezone(&Utc);
        self.service
            .register_one_shot(alarm.id, at_utc, &alarm.payload())?;
        info!(
            alarm_id = alarm.id,
            fire_at = %at,
            weekdays = %alarm.weekdays,
            lead_min = (at_utc - now.with_timezone(&Utc)).num_minutes(),
            "registered next firing"
        );
        Ok(Some(at_utc))
    }

    /// Cancel the registration for `id`. Idempotent.
    pub fn disarm(&self, id: AlarmId) -> Result<(), RegistrarError> {
        self.service.cancel(id)?;
        info!(alarm_id = id, "cancelled registration");
        Ok(())
    }

    /// Whether a live registration exists for `id`. Never mutates the
    /// external service.
    pub fn exists(&self, id: AlarmId) -> Result<bool, RegistrarError> {
        self.service.probe(id)
    }
}
