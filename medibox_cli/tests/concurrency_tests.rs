//! Concurrency tests for the medibox binary.
//!
//! The session cursor lives only inside one process, so every run starts at
//! the first dose again. Inventory writes go through the locked box file.

use assert_cmd::Command;
use std::io::Write;
use std::path::Path;
use std::process::Stdio;
use std::thread;
use std::time::Duration;
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

fn remaining(dir: &Path, slot: u64) -> u64 {
    let contents = std::fs::read_to_string(dir.join("data/box.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&contents).unwrap();
    value["compartments"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["id"].as_u64() == Some(slot))
        .and_then(|c| c["remaining_quantity"].as_u64())
        .unwrap()
}

#[test]
fn test_sequential_sessions_restart_at_first_dose() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .args(["schedule", "add", "--slot", "1", "--at", "08:00"])
        .assert()
        .success();
    cli(temp_dir.path())
        .args(["schedule", "add", "--slot", "2", "--at", "09:00"])
        .assert()
        .success();

    for i in 0..5 {
        thread::sleep(Duration::from_millis(i * 5));
        cli(temp_dir.path())
            .args(["session", "--take", "1"])
            .assert()
            .success();
    }

    assert_eq!(remaining(temp_dir.path(), 1), 25);
    assert_eq!(remaining(temp_dir.path(), 2), 30);
}

#[test]
fn test_readers_alongside_writers() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .args(["schedule", "add", "--slot", "3", "--at", "12:00"])
        .assert()
        .success();

    // Readers only take shared locks and never write the box file
    let readers: Vec<_> = ["today", "alerts", "list"]
        .into_iter()
        .enumerate()
        .map(|(i, command)| {
            let dir = temp_dir.path().to_path_buf();
            thread::spawn(move || {
                for _ in 0..5 {
                    thread::sleep(Duration::from_millis(i as u64 * 3));
                    cli(&dir)
                        .arg(command)
                        .timeout(Duration::from_secs(10))
                        .assert()
                        .success();
                }
            })
        })
        .collect();

    // One writer at a time, racing the readers
    for _ in 0..3 {
        cli(temp_dir.path())
            .args(["session", "--take", "1"])
            .timeout(Duration::from_secs(10))
            .assert()
            .success();
        thread::sleep(Duration::from_millis(5));
    }

    for handle in readers {
        handle.join().expect("Reader thread panicked");
    }

    assert_eq!(remaining(temp_dir.path(), 3), 27);
}

#[test]
fn test_restock_during_open_session_is_kept() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .args(["restock", "--quantity", "3"])
        .assert()
        .success();
    cli(temp_dir.path())
        .args(["schedule", "add", "--slot", "1", "--at", "08:00"])
        .assert()
        .success();

    let mut session = std::process::Command::new(assert_cmd::cargo::cargo_bin!("medibox"))
        .env("XDG_CONFIG_HOME", temp_dir.path().join("config"))
        .arg("--data-dir")
        .arg(temp_dir.path().join("data"))
        .arg("--now")
        .arg("2026-10-15T07:00:00+00:00")
        .arg("session")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("Failed to start session");

    // Edit the box from another process while the session is waiting on input
    cli(temp_dir.path())
        .args(["restock", "--quantity", "30"])
        .assert()
        .success();

    {
        let mut stdin = session.stdin.take().expect("Session stdin not piped");
        stdin.write_all(b"\nq\n").expect("Failed to write to session");
    }
    let output = session.wait_with_output().expect("Session did not exit");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("29 left"));

    assert_eq!(remaining(temp_dir.path(), 1), 29);
    assert_eq!(remaining(temp_dir.path(), 2), 30);
}
