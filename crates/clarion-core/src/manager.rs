//! User-edit path over the alarm store.
//!
//! Every mutation immediately flows through the timer registrar so the
//! external service tracks the intended state. Permission denial is the only
//! registrar failure that propagates to the caller (it needs a user-facing
//! prompt); a transient outage is logged and left for the reconciliation
//! loop to repair.

use std::sync::Arc;

use chrono::Local;
use tracing::warn;

use crate::alarm::{Alarm, AlarmDraft, AlarmId};
use crate::error::{CoreError, RegistrarError, Result};
use crate::registrar::TimerRegistrar;
use crate::storage::AlarmStore;

/// Create/update/toggle/delete operations for alarms.
pub struct AlarmManager {
    store: Arc<dyn AlarmStore>,
    registrar: TimerRegistrar,
}

impl AlarmManager {
    pub fn new(store: Arc<dyn AlarmStore>, registrar: TimerRegistrar) -> Self {
        Self { store, registrar }
    }

    pub fn list(&self) -> Result<Vec<Alarm>> {
        Ok(self.store.list()?)
    }

    pub fn get(&self, id: AlarmId) -> Result<Option<Alarm>> {
        Ok(self.store.get(id)?)
    }

    /// Create an alarm and, if enabled, register its next firing.
    pub fn create(&self, draft: AlarmDraft) -> Result<Alarm> {
        validate_time(draft.hour, draft.minute)?;
        let alarm = self.store.insert(&draft)?;
        if alarm.enabled {
            self.arm(&alarm)?;
        }
        Ok(alarm)
    }

    /// Persist an edited alarm and realign its registration.
    pub fn update(&self, alarm: Alarm) -> Result<Alarm> {
        validate_time(alarm.hour, alarm.minute)?;
        if !self.store.update(&alarm)? {
            return Err(CoreError::RecordNotFound(alarm.id));
        }
        if alarm.enabled {
            self.arm(&alarm)?;
        } else {
            self.disarm_best_effort(alarm.id);
        }
        Ok(alarm)
    }

    /// Toggle the enabled flag, arming or disarming accordingly.
    pub fn set_enabled(&self, id: AlarmId, enabled: bool) -> Result<Alarm> {
        let Some(mut alarm) = self.store.get(id)? else {
            return Err(CoreError::RecordNotFound(id));
        };
        alarm.enabled = enabled;
        self.store.update(&alarm)?;
        if enabled {
            self.arm(&alarm)?;
        } else {
            self.disarm_best_effort(id);
        }
        Ok(alarm)
    }

    /// Delete an alarm, cancelling its registration before the record is
    /// removed. Returns false when the id had no record.
    pub fn delete(&self, id: AlarmId) -> Result<bool> {
        self.disarm_best_effort(id);
        Ok(self.store.delete(id)?)
    }

    fn arm(&self, alarm: &Alarm) -> Result<()> {
        match self.registrar.arm_next(alarm, Local::now()) {
            Ok(_) => Ok(()),
            Err(RegistrarError::PermissionDenied) => {
                Err(CoreError::Registrar(RegistrarError::PermissionDenied))
            }
            Err(e @ RegistrarError::Unavailable(_)) => {
                warn!(alarm_id = alarm.id, error = %e, "arming failed, left for reconciliation");
                Ok(())
            }
        }
    }

    // If the cancel fails the registration outlives the intent; the trigger
    // handler's defensive cancel at fire time is the backstop.
    fn disarm_best_effort(&self, id: AlarmId) {
        if let Err(e) = self.registrar.disarm(id) {
            warn!(alarm_id = id, error = %e, "cancel failed, will be cleared at fire time");
        }
    }
}

fn validate_time(hour: u32, minute: u32) -> Result<()> {
    if hour > 23 || minute > 59 {
        return Err(CoreError::InvalidTime { hour, minute });
    }
    Ok(())
}
