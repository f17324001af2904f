//! Fire-time handling.
//!
//! The host invokes [`TriggerHandler::handle`] when a wake timer fires.
//! Announcement starts before any store or registrar work so time-to-sound
//! stays minimal; the reschedule then runs as a blocking task inside a scoped
//! stay-awake guard with a hard timeout, and the guard is released on every
//! exit path. Failures in the guarded section are logged and reported, never
//! retried here -- the reconciliation loop is the backstop for a missing
//! registration.
//!
//! ## Phases per firing
//!
//! ```text
//! Fired -> SideEffectsStarted -> Rescheduled | Cancelled -> Done
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::alarm::{AlarmId, AnnouncePayload};
use crate::registrar::TimerRegistrar;
use crate::storage::AlarmStore;

/// Hard ceiling on how long the stay-awake guard may be held.
pub const DEFAULT_GUARD_TIMEOUT: Duration = Duration::from_secs(60);

/// What the announcer is invoked with: the payload stored at registration
/// time, passed through unchanged.
#[derive(Debug, Clone, Serialize)]
pub struct AnnounceRequest {
    pub alarm_id: AlarmId,
    pub payload: AnnouncePayload,
    pub fired_at: DateTime<Utc>,
}

/// Announcement collaborator (text-to-speech, ringtone, vibration).
///
/// Fire-and-forget from the core's perspective: playback lifecycle belongs
/// to the implementation.
pub trait Announcer: Send + Sync {
    fn announce(&self, request: &AnnounceRequest);
}

/// Announcer that only logs; useful for headless hosts and development.
pub struct LogAnnouncer;

impl Announcer for LogAnnouncer {
    fn announce(&self, request: &AnnounceRequest) {
        info!(
            alarm_id = request.alarm_id,
            language = %request.payload.language_code,
            volume = request.payload.volume,
            vibrate = request.payload.vibrate,
            label = %request.payload.label,
            "alarm announcement"
        );
    }
}

/// Scoped guarantee that the host will not suspend the process.
///
/// Implementations return a [`WakeGuard`] that releases on drop; the handler
/// additionally bounds the guarded section with a hard timeout so a hung
/// downstream call cannot hold the resource indefinitely.
pub trait StayAwake: Send + Sync {
    fn acquire(&self, tag: &'static str, timeout: Duration) -> WakeGuard;
}

/// RAII release handle for a stay-awake acquisition.
pub struct WakeGuard {
    on_release: Option<Box<dyn FnOnce() + Send>>,
}

impl WakeGuard {
    /// A guard with no underlying resource.
    pub fn noop() -> Self {
        Self { on_release: None }
    }

    pub fn with_release(f: impl FnOnce() + Send + 'static) -> Self {
        Self {
            on_release: Some(Box::new(f)),
        }
    }
}

impl Drop for WakeGuard {
    fn drop(&mut self) {
        if let Some(release) = self.on_release.take() {
            release();
        }
    }
}

/// Stay-awake source for hosts that never suspend.
pub struct NoopStayAwake;

impl StayAwake for NoopStayAwake {
    fn acquire(&self, _tag: &'static str, _timeout: Duration) -> WakeGuard {
        WakeGuard::noop()
    }
}

/// Per-firing lifecycle phase, logged as each transition happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FiringPhase {
    Fired,
    SideEffectsStarted,
    Rescheduled,
    Cancelled,
    Done,
}

/// Terminal result of one firing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "result")]
pub enum FiringOutcome {
    /// The next occurrence was registered.
    Rescheduled { next_at: DateTime<Utc> },
    /// Record missing, disabled, or no active weekdays: registration cleared.
    Cancelled,
    /// Unresolvable id from the host; nothing to act on.
    Dropped,
    /// Store or registrar failure. Left for the reconciliation loop.
    Failed { message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct FiringReport {
    pub alarm_id: AlarmId,
    pub fired_at: DateTime<Utc>,
    pub outcome: FiringOutcome,
}

/// Handles a wake-timer firing end to end.
pub struct TriggerHandler {
    store: Arc<dyn AlarmStore>,
    registrar: TimerRegistrar,
    announcer: Arc<dyn Announcer>,
    stay_awake: Arc<dyn StayAwake>,
    guard_timeout: Duration,
}

impl TriggerHandler {
    pub fn new(
        store: Arc<dyn AlarmStore>,
        registrar: TimerRegistrar,
        announcer: Arc<dyn Announcer>,
        stay_awake: Arc<dyn StayAwake>,
    ) -> Self {
        Self {
            store,
            registrar,
            announcer,
            stay_awake,
            guard_timeout: DEFAULT_GUARD_TIMEOUT,
        }
    }

    pub fn with_guard_timeout(mut self, timeout: Duration) -> Self {
        self.guard_timeout = timeout;
        self
    }

    /// Entry point for hosts that deliver the alarm id as a raw integer.
    /// Non-positive ids are logged and dropped without side effects.
    pub async fn handle_raw(&self, raw_id: i64, payload: AnnouncePayload) -> FiringReport {
        if raw_id <= 0 {
            error!(raw_id, "invalid alarm id in trigger invocation, dropping");
            return FiringReport {
                alarm_id: raw_id,
                fired_at: Utc::now(),
                outcome: FiringOutcome::Dropped,
            };
        }
        self.handle(raw_id, payload).await
    }

    /// Process one firing: announce, record last-fired, re-arm or disarm.
    ///
    /// The returned future completes only after the guarded reschedule work
    /// has finished or timed out, so the caller can treat completion as the
    /// end of the invocation.
    pub async fn handle(&self, alarm_id: AlarmId, payload: AnnouncePayload) -> FiringReport {
        let fired_at = Utc::now();
        info!(alarm_id, phase = ?FiringPhase::Fired, "wake timer fired");

        // Announce before anything that can block on I/O.
        self.announcer.announce(&AnnounceRequest {
            alarm_id,
            payload,
            fired_at,
        });
        info!(alarm_id, phase = ?FiringPhase::SideEffectsStarted, "announcer invoked");

        let guard = self.stay_awake.acquire("trigger-rearm", self.guard_timeout);
        let store = self.store.clone();
        let registrar = self.registrar.clone();
        let work =
            tokio::task::spawn_blocking(move || rearm(store.as_ref(), &registrar, alarm_id, fired_at));
        let outcome = match tokio::time::timeout(self.guard_timeout, work).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(join_err)) => {
                error!(alarm_id, error = %join_err, "reschedule task failed");
                FiringOutcome::Failed {
                    message: join_err.to_string(),
                }
            }
            Err(_) => {
                error!(
                    alarm_id,
                    timeout_secs = self.guard_timeout.as_secs(),
                    "reschedule exceeded the stay-awake window"
                );
                FiringOutcome::Failed {
                    message: "reschedule timed out".to_string(),
                }
            }
        };
        drop(guard);
        info!(alarm_id, phase = ?FiringPhase::Done, ?outcome, "firing handled");

        FiringReport {
            alarm_id,
            fired_at,
            outcome,
        }
    }
}

fn rearm(
    store: &dyn AlarmStore,
    registrar: &TimerRegistrar,
    alarm_id: AlarmId,
    fired_at: DateTime<Utc>,
) -> FiringOutcome {
    if let Err(e) = store.set_last_fired(alarm_id, fired_at) {
        error!(alarm_id, error = %e, "failed to record last-fired time");
        return FiringOutcome::Failed {
            message: e.to_string(),
        };
    }

    let alarm = match store.get(alarm_id) {
        Ok(alarm) => alarm,
        Err(e) => {
            error!(alarm_id, error = %e, "alarm lookup failed");
            return FiringOutcome::Failed {
                message: e.to_string(),
            };
        }
    };

    match alarm {
        Some(alarm) if alarm.is_armable() => match registrar.arm_next(&alarm, Local::now()) {
            Ok(Some(next_at)) => {
                info!(alarm_id, phase = ?FiringPhase::Rescheduled, %next_at, "next occurrence armed");
                FiringOutcome::Rescheduled { next_at }
            }
            // Weekday set emptied concurrently: the registrar disarmed it.
            Ok(None) => {
                info!(alarm_id, phase = ?FiringPhase::Cancelled, "no next occurrence");
                FiringOutcome::Cancelled
            }
            Err(e) => {
                error!(alarm_id, error = %e, "re-registration failed, reconciliation will repair");
                FiringOutcome::Failed {
                    message: e.to_string(),
                }
            }
        },
        other => {
            if other.is_none() {
                info!(alarm_id, "no alarm record, nothing to reschedule");
            }
            // Disabled, inert, or deleted: make sure nothing stays registered.
            if let Err(e) = registrar.disarm(alarm_id) {
                warn!(alarm_id, error = %e, "defensive cancel failed");
            }
            info!(alarm_id, phase = ?FiringPhase::Cancelled, "registration cleared");
            FiringOutcome::Cancelled
        }
    }
}
