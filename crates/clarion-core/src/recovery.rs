//! One-shot re-registration after a full system restart.
//!
//! No registration survives a restart in the external wake-timer service,
//! so this pass is unconditionally required and assumes zero prior state.
//! Per-alarm failures are isolated; one bad alarm never prevents the rest
//! from being rescheduled.

use chrono::Local;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::error::StoreError;
use crate::registrar::TimerRegistrar;
use crate::storage::AlarmStore;

/// Counts reported after a restart-recovery pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecoverySummary {
    /// All alarm records in the store.
    pub total: usize,
    /// Records with `enabled == true`.
    pub enabled: usize,
    /// Enabled records successfully re-registered.
    pub rescheduled: usize,
}

impl RecoverySummary {
    pub fn message(&self) -> String {
        format!(
            "Rescheduled {} of {} enabled alarms ({} total).",
            self.rescheduled, self.enabled, self.total
        )
    }
}

/// Re-register timers for every enabled alarm.
///
/// # Errors
/// Fails only when the store itself cannot be read; registrar failures are
/// logged per alarm and reflected in the counts.
pub fn recover_after_restart(
    store: &dyn AlarmStore,
    registrar: &TimerRegistrar,
) -> Result<RecoverySummary, StoreError> {
    info!("system restart detected, re-registering alarms");
    let alarms = store.list()?;

    let mut summary = RecoverySummary {
        total: alarms.len(),
        enabled: 0,
        rescheduled: 0,
    };
    for alarm in &alarms {
        if !alarm.enabled {
            continue;
        }
        summary.enabled += 1;
        match registrar.arm_next(alarm, Local::now()) {
            Ok(Some(_)) => summary.rescheduled += 1,
            Ok(None) => {
                debug!(alarm_id = alarm.id, "enabled alarm has no active weekdays, left disarmed");
            }
            Err(e) => {
                error!(alarm_id = alarm.id, error = %e, "failed to reschedule after restart");
            }
        }
    }

    info!(
        rescheduled = summary.rescheduled,
        enabled = summary.enabled,
        total = summary.total,
        "restart recovery finished"
    );
    Ok(summary)
}
