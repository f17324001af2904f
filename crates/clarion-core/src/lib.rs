//! # Clarion Core Library
//!
//! Core business logic for Clarion, a recurring wake-up alarm scheduler that
//! stays reliable on hosts which aggressively suspend processes and silently
//! drop scheduled timers. The CLI binary is a thin layer over this library.
//!
//! ## Architecture
//!
//! - **Schedule**: pure next-fire-instant computation for weekly schedules
//! - **Registrar**: the single choke point for register/cancel mutations
//!   against the external one-shot wake-timer service
//! - **Trigger**: fire-time handling -- announce first, then re-arm inside a
//!   scoped stay-awake guard
//! - **Recovery**: re-derives every registration after a full system restart
//! - **Reconcile**: periodic probe-and-repair of silently dropped
//!   registrations
//! - **Storage**: SQLite alarm store and TOML configuration
//!
//! Intended state (enabled alarms armed, disabled alarms disarmed) is
//! eventually consistent: a silent drop or a lost race is repaired within one
//! reconciliation cadence.

pub mod alarm;
pub mod error;
pub mod manager;
pub mod reconcile;
pub mod recovery;
pub mod registrar;
pub mod schedule;
pub mod storage;
pub mod trigger;

#[cfg(test)]
pub(crate) mod test_support;

pub use alarm::{Alarm, AlarmDraft, AlarmId, AnnouncePayload, WeekdaySet};
pub use error::{ConfigError, CoreError, RegistrarError, StoreError};
pub use manager::AlarmManager;
pub use reconcile::{PassSummary, ReconcileConfig, Reconciler};
pub use recovery::{recover_after_restart, RecoverySummary};
pub use registrar::{TimerRegistrar, WakeTimerService};
pub use schedule::{next_fire_in, next_fire_instant};
pub use storage::{AlarmDb, AlarmStore, Config};
pub use trigger::{
    Announcer, FiringOutcome, FiringReport, LogAnnouncer, NoopStayAwake, StayAwake,
    TriggerHandler, WakeGuard,
};
