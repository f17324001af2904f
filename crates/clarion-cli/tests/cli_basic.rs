//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run against an isolated data
//! directory and verify outputs.

use std::path::Path;
use std::process::Command;

/// Run a CLI command against the given data directory.
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-p", "clarion-cli", "--"])
        .args(args)
        .env("CLARION_DATA_DIR", data_dir)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn test_help() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["--help"]);
    assert_eq!(code, 0, "help failed");
    assert!(stdout.contains("alarm"));
    assert!(stdout.contains("watchdog"));
}

#[test]
fn test_alarm_add_list_remove() {
    let dir = tempfile::tempdir().unwrap();

    let (stdout, stderr, code) = run_cli(
        dir.path(),
        &["alarm", "add", "07:30", "--days", "mon,wed,fri", "--label", "wake up"],
    );
    assert_eq!(code, 0, "alarm add failed: {stderr}");
    let alarm: serde_json::Value = serde_json::from_str(&stdout).expect("add output not JSON");
    let id = alarm["id"].as_i64().expect("no id in add output");
    assert_eq!(alarm["hour"], 7);
    assert_eq!(alarm["minute"], 30);
    assert_eq!(alarm["label"], "wake up");

    let (stdout, _, code) = run_cli(dir.path(), &["alarm", "list", "--json"]);
    assert_eq!(code, 0, "alarm list failed");
    let alarms: serde_json::Value = serde_json::from_str(&stdout).expect("list output not JSON");
    assert_eq!(alarms.as_array().map(Vec::len), Some(1));

    let (_, stderr, code) = run_cli(dir.path(), &["alarm", "remove", &id.to_string()]);
    assert_eq!(code, 0, "alarm remove failed: {stderr}");

    let (stdout, _, code) = run_cli(dir.path(), &["alarm", "list", "--json"]);
    assert_eq!(code, 0);
    let alarms: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(alarms.as_array().map(Vec::len), Some(0));
}

#[test]
fn test_alarm_enable_disable() {
    let dir = tempfile::tempdir().unwrap();

    let (stdout, _, code) = run_cli(dir.path(), &["alarm", "add", "06:00", "--disabled"]);
    assert_eq!(code, 0);
    let alarm: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let id = alarm["id"].as_i64().unwrap().to_string();
    assert_eq!(alarm["enabled"], false);

    let (stdout, _, code) = run_cli(dir.path(), &["alarm", "enable", &id]);
    assert_eq!(code, 0, "alarm enable failed");
    let alarm: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(alarm["enabled"], true);

    let (stdout, _, code) = run_cli(dir.path(), &["alarm", "show", &id]);
    assert_eq!(code, 0, "alarm show failed");
    let shown: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(shown["registered"], true);
    assert!(shown["next_fire_at"].is_string());

    let (stdout, _, code) = run_cli(dir.path(), &["alarm", "disable", &id]);
    assert_eq!(code, 0, "alarm disable failed");
    let alarm: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(alarm["enabled"], false);
}

#[test]
fn test_boot_reschedules_enabled_alarms() {
    let dir = tempfile::tempdir().unwrap();

    let (_, _, code) = run_cli(dir.path(), &["alarm", "add", "08:00"]);
    assert_eq!(code, 0);
    let (_, _, code) = run_cli(dir.path(), &["alarm", "add", "09:00", "--disabled"]);
    assert_eq!(code, 0);

    let (stdout, _, code) = run_cli(dir.path(), &["boot"]);
    assert_eq!(code, 0, "boot failed");
    let summary: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(summary["total"], 2);
    assert_eq!(summary["enabled"], 1);
    assert_eq!(summary["rescheduled"], 1);
}

#[test]
fn test_watchdog_repairs_dropped_registration() {
    let dir = tempfile::tempdir().unwrap();

    let (stdout, _, code) = run_cli(dir.path(), &["alarm", "add", "08:00"]);
    assert_eq!(code, 0);
    let alarm: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let id = alarm["id"].as_i64().unwrap().to_string();

    let (_, _, code) = run_cli(dir.path(), &["watchdog", "drop", &id]);
    assert_eq!(code, 0, "watchdog drop failed");

    let (stdout, _, code) = run_cli(dir.path(), &["watchdog", "check"]);
    assert_eq!(code, 0, "watchdog check failed");
    let summary: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(summary["checked"], 1);
    assert_eq!(summary["repaired"], 1);
    assert_eq!(summary["failed"], 0);

    let (stdout, _, code) = run_cli(dir.path(), &["alarm", "show", &id]);
    assert_eq!(code, 0);
    let shown: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(shown["registered"], true);
}

#[test]
fn test_config_roundtrip() {
    let dir = tempfile::tempdir().unwrap();

    let (stdout, _, code) = run_cli(
        dir.path(),
        &["config", "set", "--reconcile-interval-min", "5"],
    );
    assert_eq!(code, 0, "config set failed");
    assert!(stdout.contains("reconcile_interval_min = 5"));

    let (stdout, _, code) = run_cli(dir.path(), &["config", "show"]);
    assert_eq!(code, 0, "config show failed");
    assert!(stdout.contains("reconcile_interval_min = 5"));
}

#[test]
fn test_invalid_time_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["alarm", "add", "25:00"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("error"));
}
