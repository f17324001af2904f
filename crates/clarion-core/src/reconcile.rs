//! Periodic probe-and-repair of external registrations.
//!
//! The wake-timer service may silently drop registrations under power-saving
//! states and offers no notification when it does, so polling is the only
//! observable signal. Each pass probes every enabled alarm with a no-create
//! existence check and re-registers the ones that went missing. The default
//! cadence of 15 minutes bounds the worst-case window during which an enabled
//! alarm can sit unarmed after a silent drop.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::StoreError;
use crate::registrar::TimerRegistrar;
use crate::storage::AlarmStore;

pub const DEFAULT_INTERVAL_MINUTES: u64 = 15;
pub const MIN_INTERVAL_MINUTES: u64 = 1;
pub const MAX_INTERVAL_MINUTES: u64 = 1440;

/// Configuration for the reconciliation loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Minutes between passes.
    pub interval_minutes: u64,
    /// First delay after a whole-pass failure.
    pub initial_backoff_secs: u64,
    /// Backoff ceiling.
    pub max_backoff_secs: u64,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            interval_minutes: DEFAULT_INTERVAL_MINUTES,
            initial_backoff_secs: 30,
            max_backoff_secs: 900,
        }
    }
}

impl ReconcileConfig {
    pub fn with_interval(mut self, minutes: u64) -> Self {
        self.interval_minutes = minutes.clamp(MIN_INTERVAL_MINUTES, MAX_INTERVAL_MINUTES);
        self
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes * 60)
    }
}

/// Result of one reconciliation pass across all alarms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PassSummary {
    /// Enabled alarms probed.
    pub checked: usize,
    /// Missing registrations that were re-registered.
    pub repaired: usize,
    /// Probes or re-registrations that failed (left for the next pass).
    pub failed: usize,
}

impl PassSummary {
    pub fn message(&self) -> String {
        if self.repaired == 0 && self.failed == 0 {
            format!("All {} enabled alarms are properly registered.", self.checked)
        } else {
            format!(
                "Repaired {} of {} enabled alarms ({} failures).",
                self.repaired, self.checked, self.failed
            )
        }
    }
}

/// Probes and repairs wake-timer registrations for every enabled alarm.
pub struct Reconciler {
    store: Arc<dyn AlarmStore>,
    registrar: TimerRegistrar,
    config: ReconcileConfig,
}

impl Reconciler {
    pub fn new(store: Arc<dyn AlarmStore>, registrar: TimerRegistrar) -> Self {
        Self::with_config(store, registrar, ReconcileConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn AlarmStore>,
        registrar: TimerRegistrar,
        config: ReconcileConfig,
    ) -> Self {
        Self {
            store,
            registrar,
            config,
        }
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// One pass over every enabled alarm.
    ///
    /// # Errors
    /// Fails only when the store cannot be read; the caller should retry the
    /// whole pass with backoff. Per-alarm probe or registration failures are
    /// logged, counted, and left for the next pass.
    pub fn run_pass(&self) -> Result<PassSummary, StoreError> {
        let alarms = self.store.list()?;
        let mut summary = PassSummary {
            checked: 0,
            repaired: 0,
            failed: 0,
        };

        for alarm in alarms.iter().filter(|a| a.enabled) {
            summary.checked += 1;
            match self.registrar.exists(alarm.id) {
                Ok(true) => {}
                Ok(false) => {
                    warn!(alarm_id = alarm.id, "registration missing, re-registering");
                    match self.registrar.arm_next(alarm, Local::now()) {
                        Ok(Some(_)) => summary.repaired += 1,
                        // No active weekdays: disarmed is the intended state.
                        Ok(None) => {}
                        Err(e) => {
                            summary.failed += 1;
                            error!(alarm_id = alarm.id, error = %e, "repair failed");
                        }
                    }
                }
                Err(e) => {
                    summary.failed += 1;
                    error!(alarm_id = alarm.id, error = %e, "existence probe failed");
                }
            }
        }

        info!(
            checked = summary.checked,
            repaired = summary.repaired,
            failed = summary.failed,
            "reconciliation pass complete"
        );
        Ok(summary)
    }

    /// Drive passes at the configured cadence, forever.
    ///
    /// A failed pass is retried with capped exponential backoff; the loop is
    /// never permanently stopped by a failure. Stopping is host-level only:
    /// drop or abort the future.
    pub async fn run_forever(&self) {
        let mut backoff = Duration::from_secs(self.config.initial_backoff_secs);
        loop {
            match self.run_pass() {
                Ok(_) => {
                    backoff = Duration::from_secs(self.config.initial_backoff_secs);
                    tokio::time::sleep(self.config.interval()).await;
                }
                Err(e) => {
                    error!(
                        error = %e,
                        retry_in_secs = backoff.as_secs(),
                        "reconciliation pass failed, retrying with backoff"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff =
                        (backoff * 2).min(Duration::from_secs(self.config.max_backoff_secs));
                }
            }
        }
    }
}
