//! TOML-based application configuration.
//!
//! Stored at `<data_dir>/config.toml`. Covers the reconciliation cadence,
//! the stay-awake ceiling for trigger handling, and announcer defaults for
//! newly created alarms.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

fn default_reconcile_interval_min() -> u64 {
    15
}

fn default_stay_awake_timeout_secs() -> u64 {
    60
}

fn default_language() -> String {
    "ko".to_string()
}

fn default_volume() -> f32 {
    1.0
}

fn default_true() -> bool {
    true
}

/// Defaults applied to newly created alarms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnouncerConfig {
    #[serde(default = "default_language")]
    pub language_code: String,
    #[serde(default = "default_volume")]
    pub volume: f32,
    #[serde(default = "default_true")]
    pub vibrate: bool,
}

impl Default for AnnouncerConfig {
    fn default() -> Self {
        Self {
            language_code: default_language(),
            volume: default_volume(),
            vibrate: default_true(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Reconciliation cadence in minutes.
    #[serde(default = "default_reconcile_interval_min")]
    pub reconcile_interval_min: u64,
    /// Hard ceiling on the stay-awake window during trigger handling.
    #[serde(default = "default_stay_awake_timeout_secs")]
    pub stay_awake_timeout_secs: u64,
    #[serde(default)]
    pub announcer: AnnouncerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reconcile_interval_min: default_reconcile_interval_min(),
            stay_awake_timeout_secs: default_stay_awake_timeout_secs(),
            announcer: AnnouncerConfig::default(),
        }
    }
}

impl Config {
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(super::data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing (and returning) the defaults when the file
    /// does not exist yet.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }

    pub fn stay_awake_timeout(&self) -> Duration {
        Duration::from_secs(self.stay_awake_timeout_secs)
    }
}
