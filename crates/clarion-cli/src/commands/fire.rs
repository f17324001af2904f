//! Simulated host trigger delivery.
//!
//! Consumes the live registration for the alarm (one-shot semantics) and
//! invokes the trigger handler with its stored payload, exactly as the host
//! would on a real firing.

use std::sync::Arc;

use clarion_core::{Config, LogAnnouncer, NoopStayAwake, TriggerHandler};

use super::Handles;

pub async fn run(id: i64) -> Result<(), Box<dyn std::error::Error>> {
    let handles = Handles::open()?;
    let config = Config::load_or_default();

    // Payload priority: live registration, then the stored record's
    // presentation fields, then defaults (the handler drops unresolvable
    // ids itself).
    let payload = match handles.service.consume(id)? {
        Some(registration) => registration.payload,
        None => {
            use clarion_core::AlarmStore as _;
            handles
                .store
                .get(id)?
                .map(|alarm| alarm.payload())
                .unwrap_or_default()
        }
    };

    let handler = TriggerHandler::new(
        handles.store.clone(),
        handles.registrar(),
        Arc::new(LogAnnouncer),
        Arc::new(NoopStayAwake),
    )
    .with_guard_timeout(config.stay_awake_timeout());

    let report = handler.handle_raw(id, payload).await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
