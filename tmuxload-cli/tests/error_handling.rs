//! Integration tests for error handling and exit codes.
//!
//! These tests verify that tmuxload returns the documented exit codes:
//! - Exit code 0: Success
//! - Exit code 1: Semantic failure (validation failed)
//! - Exit code 4: Invalid arguments (workspace not found)
//! - Exit code 6: Other library errors
//! - Exit code 7: Configuration error

mod common;

use common::{TestEnv, DEMO_WORKSPACE};
use predicates::prelude::*;

#[test]
fn test_success_exit_code() {
    let env = TestEnv::new();
    let path = env.write_file("demo.yaml", DEMO_WORKSPACE);

    env.command().arg("validate").arg(&path).assert().code(0);
    env.command().arg("ls").assert().code(0);
}

#[test]
fn test_unknown_workspace_name() {
    let env = TestEnv::new();

    env.command()
        .args(["load", "--dry-run", "nosuch"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("No workspace named 'nosuch'"));
}

#[test]
fn test_missing_workspace_file() {
    let env = TestEnv::new();

    env.command()
        .args(["validate", "./missing.yaml"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_invalid_workspace_is_config_error_for_load() {
    let env = TestEnv::new();
    let path = env.write_file("bad.yaml", "session_name: s\nwindows: []\n");

    env.command()
        .args(["load", "--dry-run"])
        .arg(&path)
        .assert()
        .code(7)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("windows"));
}

#[test]
fn test_empty_workspace_file() {
    let env = TestEnv::new();
    let path = env.write_file("blank.yaml", "# nothing here\n");

    env.command()
        .args(["load", "--dry-run"])
        .arg(&path)
        .assert()
        .code(7)
        .stderr(predicate::str::contains("workspace is empty"));
}

#[test]
fn test_unknown_plugin() {
    let env = TestEnv::new();
    let path = env.write_file(
        "plugged.yaml",
        "session_name: p\nplugins: [tmux-sensible]\nwindows:\n  - w: ls\n",
    );

    env.command()
        .args(["load", "--dry-run"])
        .arg(&path)
        .assert()
        .code(6)
        .stderr(predicate::str::contains("plugin not found: tmux-sensible"));
}

#[test]
fn test_convert_missing_file() {
    let env = TestEnv::new();

    env.command()
        .args(["convert", "absent.yaml"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("File not found"));
}
