//! Core error types for clarion-core.
//!
//! The taxonomy follows the failure policy of the scheduling subsystem:
//! permission denial is the only condition meant to reach a user-facing
//! prompt; store and wake-timer failures are logged and left for the
//! reconciliation loop to repair. An empty weekday set is a valid
//! "never fires" state, not an error.

use std::path::PathBuf;
use thiserror::Error;

use crate::alarm::AlarmId;

/// Top-level error type for clarion-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Alarm store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Wake-timer registration errors
    #[error("Registrar error: {0}")]
    Registrar(#[from] RegistrarError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// No alarm record exists for the given id
    #[error("No alarm with id {0}")]
    RecordNotFound(AlarmId),

    /// Time-of-day out of range
    #[error("Invalid time of day {hour:02}:{minute:02}")]
    InvalidTime { hour: u32, minute: u32 },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Alarm-store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the alarm database
    #[error("Failed to open alarm database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Alarm database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Alarm database is locked")]
    Locked,

    /// Connection mutex was poisoned by a panicking holder
    #[error("Alarm database connection poisoned")]
    Poisoned,
}

/// Errors from the external wake-timer service.
///
/// Both variants are non-fatal to the caller: the previous registration
/// (if any) stays in place as the best-effort state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrarError {
    /// The host denies exact-timing scheduling privileges. Surfaced to the
    /// user-facing layer rather than retried automatically.
    #[error("Host denied exact wake-timer scheduling")]
    PermissionDenied,

    /// The wake-timer service is unreachable. Logged and left for the
    /// reconciliation loop.
    #[error("Wake-timer service unavailable: {0}")]
    Unavailable(String),
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Data directory could not be resolved or created
    #[error("Failed to resolve data directory: {0}")]
    DataDir(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    StoreError::Locked
                } else {
                    StoreError::QueryFailed(err.to_string())
                }
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
