//! Running a session's `before_script`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{Error, Result};

/// Runs a `before_script` to completion.
pub trait ScriptRunner {
    /// Run `script` in `cwd` and wait for it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BeforeLoadScriptNotExists`] when the program cannot
    /// be found and [`Error::BeforeLoadScript`] when it exits unsuccessfully.
    fn run(&mut self, script: &str, cwd: Option<&Path>) -> Result<()>;
}

impl<F> ScriptRunner for F
where
    F: FnMut(&str, Option<&Path>) -> Result<()>,
{
    fn run(&mut self, script: &str, cwd: Option<&Path>) -> Result<()> {
        self(script, cwd)
    }
}

/// Runs the script as a program, without a shell.
///
/// The script is split into words with shell quoting rules, so a quoted
/// path may contain spaces. The first word is the program, the rest are its
/// arguments.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessScriptRunner;

impl ScriptRunner for ProcessScriptRunner {
    fn run(&mut self, script: &str, cwd: Option<&Path>) -> Result<()> {
        let mut words = shell_words::split(script)
            .map_err(|e| Error::config("before_script", format!("cannot parse: {e}")))?
            .into_iter();
        let program = words
            .next()
            .ok_or_else(|| Error::config("before_script", "must not be empty"))?;

        let mut command = Command::new(&program);
        command.args(words).stdin(Stdio::null());
        if let Some(dir) = cwd {
            if !dir.is_dir() {
                return Err(Error::InvalidPath {
                    path: dir.to_path_buf(),
                    reason: "start_directory does not exist".to_string(),
                });
            }
            command.current_dir(dir);
        }

        log::info!("running before_script: {script}");
        let output = command.output().map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                Error::BeforeLoadScriptNotExists {
                    path: PathBuf::from(&program),
                }
            } else {
                Error::Io(e)
            }
        })?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        if output.status.success() {
            for line in text.lines() {
                log::debug!("before_script: {line}");
            }
            Ok(())
        } else {
            Err(Error::BeforeLoadScript {
                script: script.to_string(),
                code: output.status.code(),
                output: text,
            })
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    // Invoked through `sh` so the freshly written file is never exec'd.
    fn script(dir: &TempDir, body: &str) -> String {
        let path = dir.path().join("bootstrap.sh");
        fs::write(&path, format!("{body}\n")).unwrap();
        format!("sh {}", path.display())
    }

    #[test]
    fn test_successful_script() {
        let dir = TempDir::new().unwrap();
        let script = script(&dir, "echo ready");
        ProcessScriptRunner.run(&script, Some(dir.path())).unwrap();
    }

    #[test]
    fn test_failing_script_reports_code_and_output() {
        let dir = TempDir::new().unwrap();
        let script = script(&dir, "echo 'no database' >&2\nexit 3");
        let err = ProcessScriptRunner.run(&script, None).unwrap_err();
        match err {
            Error::BeforeLoadScript { code, output, .. } => {
                assert_eq!(code, Some(3));
                assert!(output.contains("no database"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_arguments_are_passed() {
        let dir = TempDir::new().unwrap();
        let script = script(&dir, "test \"$1\" = ok");
        ProcessScriptRunner.run(&format!("{script} ok"), None).unwrap();
        assert!(ProcessScriptRunner.run(&format!("{script} nope"), None).is_err());
    }

    #[test]
    fn test_missing_script() {
        let err = ProcessScriptRunner
            .run("/nonexistent/bootstrap.sh", None)
            .unwrap_err();
        assert!(matches!(err, Error::BeforeLoadScriptNotExists { .. }));
        assert!(err.is_before_script());
    }

    #[test]
    fn test_script_runs_in_cwd() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("marker"), "").unwrap();
        let script = script(&dir, "test -f marker");
        ProcessScriptRunner.run(&script, Some(dir.path())).unwrap();
    }

    #[test]
    fn test_missing_cwd() {
        let err = ProcessScriptRunner
            .run("true", Some(Path::new("/nonexistent/dir")))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPath { .. }));
    }

    #[test]
    fn test_quoted_path_with_spaces() {
        let dir = TempDir::new().unwrap();
        let project = dir.path().join("My Projects");
        fs::create_dir(&project).unwrap();
        let path = project.join("boot.sh");
        fs::write(&path, "test \"$1\" = 'two words'\n").unwrap();

        let script = format!("sh '{}' \"two words\"", path.display());
        ProcessScriptRunner.run(&script, None).unwrap();
    }

    #[test]
    fn test_unbalanced_quote_rejected() {
        let err = ProcessScriptRunner.run("sh 'boot.sh", None).unwrap_err();
        assert_eq!(err.config_path(), Some("before_script"));
    }

    #[test]
    fn test_empty_script_rejected() {
        let err = ProcessScriptRunner.run("   ", None).unwrap_err();
        assert_eq!(err.config_path(), Some("before_script"));
    }
}
