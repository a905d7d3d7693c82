//! Common test utilities for CLI integration tests.
//!
//! This module provides shared helpers for CLI testing, including:
//! - Test environment setup with temporary directories
//! - Command builder helpers for common patterns
//! - Workspace fixtures

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A small canonical workspace with two windows.
#[allow(dead_code)]
pub const DEMO_WORKSPACE: &str = "session_name: demo
start_directory: /srv/demo
windows:
  - window_name: editor
    panes: [vim]
  - window_name: logs
    layout: even-vertical
    panes:
      - tail -f app.log
      - blank
";

/// A tmuxinator project.
#[allow(dead_code)]
pub const TMUXINATOR_PROJECT: &str = "name: blog
root: ~/blog
windows:
  - editor:
      layout: main-vertical
      panes:
        - vim
        - guard
  - server: hugo server
";

/// Test environment with an isolated workspace directory.
///
/// This struct provides an isolated test environment with:
/// - A temporary directory for test files
/// - A separate workspace directory for named workspaces
/// - Helper methods for common CLI operations
pub struct TestEnv {
    /// Temporary directory (kept alive for the duration of the test)
    #[allow(dead_code)]
    temp_dir: TempDir,
    /// Path to the temporary directory
    pub temp_path: PathBuf,
    /// Path to the workspace directory
    pub config_dir: PathBuf,
}

#[allow(dead_code)]
impl TestEnv {
    /// Create a new test environment.
    ///
    /// This creates:
    /// - A temporary directory for test files
    /// - A workspace directory inside it
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let temp_path = temp_dir.path().to_path_buf();
        let config_dir = temp_path.join("workspaces");
        std::fs::create_dir_all(&config_dir).expect("Failed to create workspace dir");

        Self {
            temp_dir,
            temp_path,
            config_dir,
        }
    }

    /// Get a bare command builder without pre-configured flags.
    ///
    /// The command runs inside the temporary directory, outside of tmux.
    pub fn command_bare(&self) -> Command {
        let mut cmd = Command::cargo_bin("tmuxload").expect("Failed to find tmuxload binary");
        cmd.current_dir(&self.temp_path)
            .env_remove("TMUX")
            .env_remove("TMUXLOAD_LOG_MODE");
        cmd
    }

    /// Get a command builder with the workspace directory pre-configured.
    pub fn command(&self) -> Command {
        let mut cmd = self.command_bare();
        cmd.arg("--config-dir").arg(&self.config_dir);
        cmd
    }

    /// Get the temp path.
    pub fn path(&self) -> &Path {
        &self.temp_path
    }

    /// Write a file under the temporary directory and return its path.
    pub fn write_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_path.join(name);
        std::fs::write(&path, contents).expect("Failed to write test file");
        path
    }

    /// Save a named workspace in the workspace directory.
    pub fn save_workspace(&self, file_name: &str, contents: &str) -> PathBuf {
        let path = self.config_dir.join(file_name);
        std::fs::write(&path, contents).expect("Failed to write workspace");
        path
    }

    /// Run a command that must succeed and return its stdout.
    pub fn stdout_of(&self, args: &[&str]) -> String {
        let output = self
            .command()
            .args(args)
            .output()
            .expect("Failed to run tmuxload");

        assert!(
            output.status.success(),
            "tmuxload {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );

        String::from_utf8(output.stdout).expect("Invalid UTF-8 in output")
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
