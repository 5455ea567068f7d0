//! CLI integration tests
//!
//! Tests the c64ap CLI using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;

fn c64ap() -> Command {
    let mut cmd = Command::cargo_bin("c64ap")
        .expect("Failed to locate c64ap binary - ensure it's built before running tests");
    cmd.env_remove("C64AP_CONFIG").env_remove("C64AP_PASSWORD");
    cmd
}

#[test]
fn test_cli_help() {
    c64ap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("c64ap"))
        .stdout(predicate::str::contains("Celeste 64 multiworld randomizer client"));
}

#[test]
fn test_cli_version() {
    c64ap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("c64ap"));
}

#[test]
fn test_cli_run_help() {
    c64ap()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--slot"))
        .stdout(predicate::str::contains("--no-presence"));
}

#[test]
fn test_cli_no_command_fails() {
    c64ap().assert().failure();
}

#[test]
fn test_locations_lists_strawberries() {
    c64ap()
        .args(["locations", "--category", "strawberry"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1/0"))
        .stdout(predicate::str::contains("0xca0000"))
        .stdout(predicate::str::contains("Friend").not());
}

#[test]
fn test_locations_are_listed_by_id() {
    let output = c64ap().arg("locations").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let position = |name: &str| stdout.find(name).unwrap();
    assert!(position("1/0 ") < position("1/29"));
    assert!(position("1/29") < position("Friend - Granny"));
    assert!(position("Car - Secret Island") < position("Checkpoint - Intro"));
}

#[test]
fn test_locations_unknown_category() {
    c64ap()
        .args(["locations", "--category", "balloon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown category"));
}

#[test]
fn test_items_lists_unlocks() {
    c64ap()
        .arg("items")
        .assert()
        .success()
        .stdout(predicate::str::contains("Strawberry"))
        .stdout(predicate::str::contains("Spring"))
        .stdout(predicate::str::contains("Checkpoint - Granny"));
}

#[test]
fn test_progress_reads_save() {
    let dir = tempfile::tempdir().unwrap();
    let save = dir.path().join("save.json");
    std::fs::write(
        &save,
        r#"{"flags": {"Strawberries": 3, "ItemRcv": 4, "Spring": 1}, "strawberries": ["1/0", "1/5"]}"#,
    )
    .unwrap();

    c64ap()
        .args(["progress", "--required", "20", "--save"])
        .arg(&save)
        .assert()
        .success()
        .stdout(predicate::str::contains("x03/20"))
        .stdout(predicate::str::contains("Items received: 4"))
        .stdout(predicate::str::contains("strawberry"));
}

#[test]
fn test_progress_rejects_corrupt_save() {
    let dir = tempfile::tempdir().unwrap();
    let save = dir.path().join("save.json");
    std::fs::write(&save, "not json").unwrap();

    c64ap()
        .args(["progress", "--save"])
        .arg(&save)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load save"));
}

#[test]
fn test_config_init_set_get() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("client.toml");

    c64ap()
        .arg("--config")
        .arg(&config)
        .args(["config", "init"])
        .assert()
        .success();
    assert!(config.exists());

    c64ap()
        .arg("--config")
        .arg(&config)
        .args(["config", "set", "connection.url", "ws://localhost:38281"])
        .assert()
        .success();

    c64ap()
        .arg("--config")
        .arg(&config)
        .args(["config", "get", "connection.url"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ws://localhost:38281"));
}

#[test]
fn test_config_get_missing_key() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("client.toml");

    c64ap()
        .arg("--config")
        .arg(&config)
        .args(["config", "init"])
        .assert()
        .success();

    c64ap()
        .arg("--config")
        .arg(&config)
        .args(["config", "get", "connection.nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Key not found"));
}

#[test]
fn test_config_path_honors_flag() {
    c64ap()
        .args(["--config", "/tmp/somewhere/client.toml", "config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/tmp/somewhere/client.toml"));
}

#[test]
fn test_run_with_missing_config_fails() {
    let dir = tempfile::tempdir().unwrap();

    c64ap()
        .arg("--config")
        .arg(dir.path().join("missing.toml"))
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));
}
