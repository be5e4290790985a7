//! Integration tests for the CLI binary.
//!
//! Verifies that the `acont` binary responds to basic flags and drives a
//! track → evaluate → show → history round trip against a temp data dir.
//!
//! This test is registered as a [[test]] in the actor-continuity-cli crate
//! so that CARGO_BIN_EXE_acont is available.

use std::path::Path;
use std::process::{Command, Output};

const T0: f64 = 1_699_999_200.0;

/// Get a Command pointing to the `acont` binary.
fn acont_binary() -> Command {
    Command::new(env!("CARGO_BIN_EXE_acont"))
}

fn acont(data_dir: &Path, args: &[&str]) -> Output {
    acont_binary()
        .arg("--data-dir")
        .arg(data_dir)
        .args(args)
        .output()
        .expect("failed to execute acont")
}

fn stdout_of(output: &Output) -> String {
    assert!(
        output.status.success(),
        "acont should exit with success, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn track_session(data_dir: &Path, subject: &str) {
    let actions = ["view", "search", "analyze"];
    let entities = ["AAPL", "GOOGL", "MSFT"];
    for i in 0..10 {
        let at = (T0 + i as f64 * 30.0).to_string();
        stdout_of(&acont(
            data_dir,
            &[
                "track",
                "--subject",
                subject,
                "--action",
                actions[i % 3],
                "--entity",
                entities[i % 3],
                "--at",
                &at,
            ],
        ));
    }
}

#[test]
fn cli_responds_to_help() {
    let output = acont_binary()
        .arg("--help")
        .output()
        .expect("failed to execute acont --help");

    let stdout = stdout_of(&output);
    assert!(
        stdout.contains("acont") || stdout.contains("Usage"),
        "acont --help output should contain usage information, got: {stdout}"
    );
}

#[test]
fn cli_responds_to_version() {
    let output = acont_binary()
        .arg("--version")
        .output()
        .expect("failed to execute acont --version");

    let stdout = stdout_of(&output);
    assert!(
        stdout.contains("0.1"),
        "acont --version should contain version info, got: {stdout}"
    );
}

#[test]
fn cli_exits_with_error_on_unknown_flag() {
    let output = acont_binary()
        .arg("--nonexistent-flag")
        .output()
        .expect("failed to execute acont");

    assert!(
        !output.status.success(),
        "acont should fail on an unknown flag"
    );
}

#[test]
fn cli_track_evaluate_show_history() {
    let dir = tempfile::tempdir().unwrap();
    track_session(dir.path(), "alice");

    let at = (T0 + 600.0).to_string();
    let stdout = stdout_of(&acont(
        dir.path(),
        &["evaluate", "--subject", "alice", "--at", &at, "--json"],
    ));
    let result: serde_json::Value = serde_json::from_str(&stdout).expect("evaluate --json");
    assert_eq!(result["sample_count"], 1);
    assert_eq!(result["state"], "learning");
    assert_eq!(result["score"], 1.0);

    let show = stdout_of(&acont(dir.path(), &["show", "--subject", "alice"]));
    assert!(show.contains("Sample Count: 1"), "show output: {show}");
    assert!(show.contains("session_duration"), "show output: {show}");

    let history = stdout_of(&acont(dir.path(), &["history", "--subject", "alice"]));
    assert!(history.contains("learning"), "history output: {history}");

    let list = stdout_of(&acont(dir.path(), &["list"]));
    assert_eq!(list.trim(), "alice");
}

#[test]
fn cli_history_verbose_shows_row_ids() {
    let dir = tempfile::tempdir().unwrap();
    track_session(dir.path(), "carol");
    let at = (T0 + 600.0).to_string();
    stdout_of(&acont(
        dir.path(),
        &["evaluate", "--subject", "carol", "--at", &at],
    ));

    let plain = stdout_of(&acont(dir.path(), &["history", "--subject", "carol"]));
    assert!(!plain.contains("chist_"), "history output: {plain}");

    let verbose = stdout_of(&acont(
        dir.path(),
        &["--verbose", "history", "--subject", "carol"],
    ));
    assert!(verbose.contains("id chist_"), "history output: {verbose}");
}

#[test]
fn cli_evaluate_without_enough_activity_is_neutral() {
    let dir = tempfile::tempdir().unwrap();
    let at = T0.to_string();
    stdout_of(&acont(
        dir.path(),
        &["track", "--subject", "bob", "--action", "login", "--at", &at],
    ));

    let stdout = stdout_of(&acont(
        dir.path(),
        &["evaluate", "--subject", "bob", "--at", &at, "--json"],
    ));
    let result: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(result["state"], "learning");
    assert_eq!(result["confidence"], 0.0);

    // Nothing was persisted.
    let output = acont(dir.path(), &["show", "--subject", "bob"]);
    assert!(!output.status.success());
}

#[test]
fn cli_rejects_path_like_subject() {
    let dir = tempfile::tempdir().unwrap();
    let output = acont(
        dir.path(),
        &["track", "--subject", "../escape", "--action", "view"],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error:"));
}

#[test]
fn cli_half_life_reports_hours_for_default_rate() {
    let dir = tempfile::tempdir().unwrap();
    let stdout = stdout_of(&acont(dir.path(), &["half-life", "--lambda", "0.0001"]));
    assert!(stdout.contains("1.9 hours"), "half-life output: {stdout}");

    let stdout = stdout_of(&acont(dir.path(), &["half-life", "--profile", "weekly"]));
    assert!(stdout.contains("half-life"), "half-life output: {stdout}");
}

#[test]
fn cli_config_prints_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let stdout = stdout_of(&acont(dir.path(), &["config"]));
    let config: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(config["max_events"], 100);
    assert_eq!(config["decay_rate"], 0.0001);
}
