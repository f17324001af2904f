//! Persistence: SQLite alarm store and TOML configuration.

pub mod config;
pub mod database;

pub use config::Config;
pub use database::AlarmDb;

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::alarm::{Alarm, AlarmDraft, AlarmId};
use crate::error::{ConfigError, StoreError};

/// Alarm record store.
///
/// Injected into every component so hosts and tests can substitute their
/// own backend; [`AlarmDb`] is the bundled SQLite implementation.
pub trait AlarmStore: Send + Sync {
    /// All alarms, ordered by (hour, minute).
    fn list(&self) -> Result<Vec<Alarm>, StoreError>;

    fn get(&self, id: AlarmId) -> Result<Option<Alarm>, StoreError>;

    /// Insert a new alarm and return it with its assigned id.
    fn insert(&self, draft: &AlarmDraft) -> Result<Alarm, StoreError>;

    /// Update an existing alarm. Returns false when no row matched the id.
    fn update(&self, alarm: &Alarm) -> Result<bool, StoreError>;

    /// Delete by id. Returns false when no row matched.
    fn delete(&self, id: AlarmId) -> Result<bool, StoreError>;

    /// Record the last firing timestamp. A missing id is a no-op.
    fn set_last_fired(&self, id: AlarmId, at: DateTime<Utc>) -> Result<(), StoreError>;
}

/// Returns the clarion data directory, creating it if needed.
///
/// Defaults to `~/.config/clarion/`; set `CLARION_DATA_DIR` to override
/// (used by the CLI tests to isolate state).
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("CLARION_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("clarion"),
    };
    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(e.to_string()))?;
    Ok(dir)
}
