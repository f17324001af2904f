//! Registration watchdog.
//!
//! `check` runs a single reconciliation pass; `run` drives the full
//! development host loop: reconciliation at the configured cadence plus
//! delivery of due registrations through the trigger handler. `drop`
//! removes a registration out-of-band, simulating a silent host drop, so
//! the self-healing path can be observed end to end.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::Subcommand;
use tracing::warn;

use clarion_core::{
    Config, LogAnnouncer, NoopStayAwake, ReconcileConfig, Reconciler, TriggerHandler,
};

use super::Handles;

#[derive(Subcommand)]
pub enum WatchdogAction {
    /// Run a single reconciliation pass and exit
    Check,
    /// Run the reconciliation loop and deliver due alarms (never exits)
    Run {
        /// Minutes between reconciliation passes (default from config)
        #[arg(long)]
        interval_min: Option<u64>,
    },
    /// Drop a registration out-of-band (simulates a silent host drop)
    Drop { id: i64 },
}

pub async fn run(action: WatchdogAction) -> Result<(), Box<dyn std::error::Error>> {
    let handles = Handles::open()?;

    match action {
        WatchdogAction::Check => {
            let reconciler = Reconciler::new(handles.store.clone(), handles.registrar());
            let summary = reconciler.run_pass()?;
            eprintln!("{}", summary.message());
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        WatchdogAction::Run { interval_min } => {
            let config = Config::load_or_default();
            let interval = interval_min.unwrap_or(config.reconcile_interval_min);
            let reconciler = Arc::new(Reconciler::with_config(
                handles.store.clone(),
                handles.registrar(),
                ReconcileConfig::default().with_interval(interval),
            ));
            tokio::spawn({
                let reconciler = reconciler.clone();
                async move { reconciler.run_forever().await }
            });

            let handler = TriggerHandler::new(
                handles.store.clone(),
                handles.registrar(),
                Arc::new(LogAnnouncer),
                Arc::new(NoopStayAwake),
            )
            .with_guard_timeout(config.stay_awake_timeout());

            let mut ticker = tokio::time::interval(Duration::from_secs(1));
            loop {
                ticker.tick().await;
                let due = match handles.service.take_due(Utc::now()) {
                    Ok(due) => due,
                    Err(e) => {
                        warn!(error = %e, "could not read due registrations");
                        continue;
                    }
                };
                for (id, registration) in due {
                    let report = handler.handle(id, registration.payload).await;
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
            }
        }
        WatchdogAction::Drop { id } => {
            let dropped = handles.service.drop_registration(id)?;
            println!("{{\"dropped\": {dropped}}}");
        }
    }
    Ok(())
}
