//! Restart recovery command.
//!
//! The host runs `clarion boot` once after a full system restart: no
//! registration survives one, so every enabled alarm is re-registered from
//! the store.

use clarion_core::recover_after_restart;

use super::Handles;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let handles = Handles::open()?;
    let summary = recover_after_restart(handles.store.as_ref(), &handles.registrar())?;
    eprintln!("{}", summary.message());
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
