//! Shared E2E test helpers for `sadstate` binary tests.

use assert_cmd::cargo::cargo_bin_cmd;
use std::time::Duration;

pub const TIMEOUT_BASIC: Duration = Duration::from_secs(10);

/// An address nothing listens on.
pub const DEAD_HOST: &str = "http://127.0.0.1:1";

const CONFIG_VARS: &[&str] = &[
    "SADSTATE_HOST",
    "SADSTATE_TIMEOUT_SECS",
    "SADSTATE_USER_AGENT",
    "SADSTATE_LOG",
];

/// Build a Command for the `sadstate` binary isolated from the user's
/// config files and environment.
///
/// Returns (command, _guard); keep the guard alive for the test's duration.
pub fn sadstate_cmd() -> (assert_cmd::Command, tempfile::TempDir) {
    let tmp = tempfile::tempdir().expect("create temp dir for config");
    let mut cmd: assert_cmd::Command = cargo_bin_cmd!("sadstate");
    cmd.timeout(TIMEOUT_BASIC);
    for var in CONFIG_VARS {
        cmd.env_remove(var);
    }
    cmd.env("HOME", tmp.path());
    cmd.args(["-C", tmp.path().to_str().expect("valid utf8")]);
    (cmd, tmp)
}
