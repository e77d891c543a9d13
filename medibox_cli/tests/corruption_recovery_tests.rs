//! Corruption recovery tests for the medibox binary.
//!
//! These tests verify the system can handle:
//! - Corrupted box files
//! - Hand-edited schedules the normalizer cannot read
//! - Missing data directories

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn cli(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("medibox"));
    cmd.env("XDG_CONFIG_HOME", dir.join("config"))
        .arg("--data-dir")
        .arg(dir.join("data"))
        .arg("--now")
        .arg("2026-10-15T07:00:00+00:00");
    cmd
}

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

#[test]
fn test_corrupted_box_file_falls_back_to_defaults() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("data");
    fs::create_dir_all(&data_dir).unwrap();
    fs::write(data_dir.join("box.json"), "{ invalid json }}}}").unwrap();

    cli(temp_dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("#4 Compartment 4"));
}

#[test]
fn test_malformed_schedule_is_skipped() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("data");
    fs::create_dir_all(&data_dir).unwrap();
    fs::write(
        data_dir.join("box.json"),
        r#"{
  "compartments": [
    {
      "id": 1,
      "remaining_quantity": 10,
      "low_stock_threshold": 2,
      "schedules": [
        { "id": "6f1c1a4e-3c39-4a8e-9d53-6f3c0a0f9b01", "time": "teatime" },
        { "id": "6f1c1a4e-3c39-4a8e-9d53-6f3c0a0f9b02", "time": "2019-05-01T20:30:00" }
      ]
    }
  ]
}"#,
    )
    .unwrap();

    cli(temp_dir.path())
        .args(["session", "--take", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ Took 20:30 Compartment 1 (#1), 9 left"))
        .stdout(predicate::str::contains("All 1 doses taken for today."));
}

#[test]
fn test_duplicate_compartments_are_rejected() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("data");
    fs::create_dir_all(&data_dir).unwrap();
    fs::write(
        data_dir.join("box.json"),
        r#"{"compartments": [
            {"id": 1, "remaining_quantity": 1, "low_stock_threshold": 0},
            {"id": 1, "remaining_quantity": 2, "low_stock_threshold": 0}
        ]}"#,
    )
    .unwrap();

    cli(temp_dir.path())
        .arg("today")
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate compartment"));
}

#[test]
fn test_missing_data_dir_is_created_on_write() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path())
        .arg("restock")
        .assert()
        .success();

    assert!(temp_dir.path().join("data/box.json").exists());
}
