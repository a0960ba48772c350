//! E2E tests for the `sadstate` binary.
//!
//! No server is started: these cover argument handling, config layering
//! and the failure path of the result document.

mod common;

use common::{sadstate_cmd, DEAD_HOST};
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;

#[test]
fn help_lists_commands() {
    let (mut cmd, _guard) = sadstate_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(contains("auth"))
        .stdout(contains("project"))
        .stdout(contains("profile"));
}

#[test]
fn missing_command_is_usage_error() {
    let (mut cmd, _guard) = sadstate_cmd();
    cmd.assert().failure().stderr(contains("Usage"));
}

#[test]
fn zero_ticket_is_rejected() {
    let (mut cmd, _guard) = sadstate_cmd();
    cmd.args(["auth", "set", "0", "pw"])
        .assert()
        .failure()
        .stderr(contains("zero"));
}

#[test]
fn unreachable_server_reports_transport_failure() {
    let (mut cmd, _guard) = sadstate_cmd();
    cmd.args(["--host", DEAD_HOST, "--timeout", "2", "project", "get", "robotics"])
        .assert()
        .failure()
        .stdout(contains(r#""outcome": "transport_failure""#))
        .stdout(contains(r#""status": null"#))
        .stdout(contains("result").not());
}

#[test]
fn failed_password_login_stops_before_command() {
    let (mut cmd, _guard) = sadstate_cmd();
    cmd.args(["--host", DEAD_HOST, "--timeout", "2", "--password", "pw"])
        .args(["profile", "read", "club", "alice"])
        .assert()
        .failure()
        .stdout(contains("transport_failure"));
}

#[test]
fn project_config_supplies_host() {
    let (mut cmd, guard) = sadstate_cmd();
    let dir = guard.path().join(".sadstate");
    std::fs::create_dir_all(&dir).expect("create config dir");
    std::fs::write(
        dir.join("config.toml"),
        format!("host = \"{DEAD_HOST}\"\ntimeout_secs = 2\n"),
    )
    .expect("write config");

    cmd.args(["-d", "project", "get", "robotics"])
        .assert()
        .failure()
        .stdout(contains("transport_failure"))
        .stderr(contains("127.0.0.1:1"));
}

#[test]
fn environment_overrides_project_config() {
    let (mut cmd, guard) = sadstate_cmd();
    let dir = guard.path().join(".sadstate");
    std::fs::create_dir_all(&dir).expect("create config dir");
    std::fs::write(dir.join("config.toml"), "host = \"http://ignored.invalid\"\n")
        .expect("write config");

    cmd.env("SADSTATE_HOST", DEAD_HOST)
        .env("SADSTATE_TIMEOUT_SECS", "2")
        .args(["-d", "project", "get", "robotics"])
        .assert()
        .failure()
        .stderr(contains("127.0.0.1:1"))
        .stderr(contains("ignored.invalid").not());
}

#[test]
fn bad_config_file_is_reported() {
    let (mut cmd, guard) = sadstate_cmd();
    let dir = guard.path().join(".sadstate");
    std::fs::create_dir_all(&dir).expect("create config dir");
    std::fs::write(dir.join("config.toml"), "timeout_secs = \"soon\"\n").expect("write config");

    cmd.args(["project", "get", "robotics"])
        .assert()
        .failure()
        .stderr(contains("Config error"));
}
