//! Corruption recovery tests for the liftmon binary.
//!
//! These tests verify the system can handle:
//! - Corrupted workout log lines
//! - Corrupted companion records (user progression still counts)
//! - Corrupted profile records (reported, never overwritten)

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::io::Write as IoWrite;
use std::path::Path;
use tempfile::TempDir;

fn cli(data_dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("liftmon"));
    cmd.env("XDG_CONFIG_HOME", data_dir.join("config"))
        .arg("--data-dir")
        .arg(data_dir);
    cmd
}

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

fn write_workout(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("workout.json");
    fs::write(
        &path,
        r#"{
            "exercises": [
                {
                    "name": "Bench Press",
                    "sets": [
                        { "set_number": 1, "weight": 60, "reps": 8, "completed": true },
                        { "set_number": 2, "weight": 60, "reps": 8, "completed": true }
                    ],
                    "total_sets": 2,
                    "completed_sets": 2
                }
            ],
            "duration_seconds": 120
        }"#,
    )
    .expect("Failed to write workout");
    path
}

fn start(data_dir: &Path) {
    cli(data_dir)
        .args(["start", "--user", "sam", "--species", "squirtle"])
        .assert()
        .success();
}

#[test]
fn test_corrupted_log_lines_are_skipped() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    start(data_dir);

    fs::create_dir_all(data_dir.join("workouts")).unwrap();
    let mut log = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(data_dir.join("workouts/sam.jsonl"))
        .unwrap();
    writeln!(log, "{{ invalid json }}").unwrap();
    writeln!(log, "{{ \"partial\": ").unwrap();
    drop(log);

    let workout = write_workout(data_dir);
    let output = cli(data_dir)
        .args(["log", "--user", "sam", "--json", "--workout"])
        .arg(&workout)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    // Nothing readable came before, so this counts as a first workout
    let result: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(result["award"]["improvement_bonus"], 15);
}

#[test]
fn test_corrupted_companion_does_not_block_user_progress() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    start(data_dir);

    let companion_path = data_dir.join("companions/sam.json");
    fs::write(&companion_path, "{ broken").unwrap();

    let workout = write_workout(data_dir);
    cli(data_dir)
        .args(["log", "--user", "sam", "--workout"])
        .arg(&workout)
        .assert()
        .success()
        .stdout(predicate::str::contains("companion progress unavailable"));

    // User progression was committed
    let profile: Value =
        serde_json::from_str(&fs::read_to_string(data_dir.join("profiles/sam.json")).unwrap())
            .unwrap();
    assert_eq!(profile["total_workouts"], 1);

    // The corrupted record is left for inspection rather than replaced
    assert_eq!(fs::read_to_string(&companion_path).unwrap(), "{ broken");
}

#[test]
fn test_corrupted_profile_is_reported() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    start(data_dir);

    let profile_path = data_dir.join("profiles/sam.json");
    fs::write(&profile_path, "{ invalid json }}}}").unwrap();

    cli(data_dir)
        .args(["status", "--user", "sam"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("corrupted record"));

    assert_eq!(
        fs::read_to_string(&profile_path).unwrap(),
        "{ invalid json }}}}"
    );
}

#[test]
fn test_missing_companion_is_recreated_from_selection() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    start(data_dir);

    fs::remove_file(data_dir.join("companions/sam.json")).unwrap();

    let workout = write_workout(data_dir);
    cli(data_dir)
        .args(["log", "--user", "sam", "--workout"])
        .arg(&workout)
        .assert()
        .success()
        .stdout(predicate::str::contains("Squirtle gained"));

    assert!(data_dir.join("companions/sam.json").exists());
}
