pub mod alarm;
pub mod boot;
pub mod config;
pub mod fire;
pub mod watchdog;

use std::sync::Arc;

use clarion_core::{AlarmDb, TimerRegistrar};

use crate::host::FileWakeTimer;

/// Shared handles every command builds on: the SQLite store and the
/// file-backed wake-timer stand-in, both under the data directory.
pub(crate) struct Handles {
    pub store: Arc<AlarmDb>,
    pub service: Arc<FileWakeTimer>,
}

impl Handles {
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            store: Arc::new(AlarmDb::open()?),
            service: Arc::new(FileWakeTimer::open_default()?),
        })
    }

    pub fn registrar(&self) -> TimerRegistrar {
        TimerRegistrar::new(self.service.clone())
    }
}
