//! Workspace validation.
//!
//! Validation runs in two passes. [`SchemaValidator::check_raw`] walks the
//! expanded raw tree and reports type and shape problems with a dotted path
//! (`windows[1].panes[0].sleep_before`) before the tree is typed.
//! [`SchemaValidator::validate`] then checks the typed tree for the rules
//! serde cannot express and collects non-fatal findings in a
//! [`ValidationReport`].

use crate::config::schema::{
    CommandSpec, WindowConfig, WorkspaceConfig, COMMAND_KEYS, PANE_KEYS, WINDOW_KEYS,
};
use crate::error::{Error, Result};
use serde_yaml::{Mapping, Value};
use std::collections::HashSet;
use std::fmt;

/// Characters the multiplexer rewrites in session names.
const FORBIDDEN_SESSION_CHARS: [char; 2] = [':', '.'];

/// A non-fatal finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// Dotted path of the field concerned.
    pub path: String,
    /// Description of the finding.
    pub message: String,
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Findings from a successful validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    /// All warnings, in tree order.
    #[must_use]
    pub fn warnings(&self) -> &[ValidationWarning] {
        &self.warnings
    }

    /// True when nothing was flagged.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationWarning {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validates workspace trees.
///
/// Unknown top-level keys are always ignored. In strict mode unknown keys
/// inside window, pane and command blocks are errors.
///
/// # Examples
///
/// ```
/// use tmuxload::config::SchemaValidator;
///
/// let raw: serde_yaml::Value = serde_yaml::from_str("session_name: dev\nwindows: []\n").unwrap();
/// let err = SchemaValidator::new().check_raw(&raw).unwrap_err();
/// assert_eq!(err.config_path(), Some("windows"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaValidator {
    strict: bool,
}

impl SchemaValidator {
    /// A lenient validator.
    #[must_use]
    pub const fn new() -> Self {
        Self { strict: false }
    }

    /// Enable or disable unknown-key errors in window and pane blocks.
    #[must_use]
    pub const fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Check the shape of an expanded raw tree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] with the path of the first offending field.
    pub fn check_raw(&self, raw: &Value) -> Result<()> {
        let Value::Mapping(session) = raw else {
            return Err(Error::config("", "workspace must be a mapping"));
        };

        match session.get("session_name") {
            None | Some(Value::Null) => return Err(Error::config("session_name", "is required")),
            Some(Value::String(name)) if name.trim().is_empty() => {
                return Err(Error::config("session_name", "must not be empty"))
            }
            Some(Value::String(_)) => {}
            Some(_) => return Err(Error::config("session_name", "must be a string")),
        }

        for key in ["start_directory", "before_script", "socket_name"] {
            check_string(session, "", key)?;
        }
        if let Some(Value::String(script)) = session.get("before_script") {
            if script.trim().is_empty() {
                return Err(Error::config("before_script", "must not be empty"));
            }
        }
        check_environment(session, "")?;
        check_options(session, "", "global_options")?;
        check_options(session, "", "options")?;
        self.check_commands(session, "", "shell_command_before")?;
        check_bool(session, "", "suppress_history", true)?;

        if let Some(plugins) = session.get("plugins") {
            let Value::Sequence(items) = plugins else {
                return Err(Error::config("plugins", "must be a list of plugin names"));
            };
            for (i, item) in items.iter().enumerate() {
                if !item.is_string() {
                    return Err(Error::config(format!("plugins[{i}]"), "must be a string"));
                }
            }
        }

        let windows = match session.get("windows") {
            None => return Err(Error::config("windows", "is required")),
            Some(Value::Sequence(windows)) if windows.is_empty() => {
                return Err(Error::config(
                    "windows",
                    "must contain at least one window",
                ))
            }
            Some(Value::Sequence(windows)) => windows,
            Some(_) => return Err(Error::config("windows", "must be a list of windows")),
        };

        let mut indexes = HashSet::new();
        for (i, window) in windows.iter().enumerate() {
            let path = format!("windows[{i}]");
            let Value::Mapping(window) = window else {
                return Err(Error::config(path, "window must be a mapping"));
            };
            self.check_window(window, &path, &mut indexes)?;
        }

        Ok(())
    }

    /// Check a typed workspace.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the workspace cannot be built.
    pub fn validate(&self, config: &WorkspaceConfig) -> Result<ValidationReport> {
        let mut report = ValidationReport::default();

        let name = config.session_name.trim();
        if name.is_empty() {
            return Err(Error::config("session_name", "must not be empty"));
        }
        if name.contains(FORBIDDEN_SESSION_CHARS) {
            return Err(Error::config(
                "session_name",
                format!("'{name}' must not contain ':' or '.'"),
            ));
        }

        if config
            .before_script
            .as_deref()
            .is_some_and(|script| script.trim().is_empty())
        {
            return Err(Error::config("before_script", "must not be empty"));
        }

        if config.windows.is_empty() {
            return Err(Error::config(
                "windows",
                "must contain at least one window",
            ));
        }

        let mut indexes = HashSet::new();
        let mut focused_windows = 0;
        for (i, window) in config.windows.iter().enumerate() {
            let path = format!("windows[{i}]");
            if let Some(index) = window.window_index {
                if !indexes.insert(index) {
                    return Err(Error::config(
                        format!("{path}.window_index"),
                        format!("duplicate window_index {index}"),
                    ));
                }
            }
            if window.focus {
                focused_windows += 1;
            }
            if window
                .shell_command_after
                .as_ref()
                .is_some_and(|c| !c.is_empty())
            {
                report.warn(
                    format!("{path}.shell_command_after"),
                    "is kept but not run by the builder",
                );
            }
            Self::validate_window(window, &path, &mut report)?;
        }

        if focused_windows > 1 {
            report.warn(
                "windows",
                format!("{focused_windows} windows are marked focus; the last one wins"),
            );
        }

        Ok(report)
    }

    fn validate_window(
        window: &WindowConfig,
        path: &str,
        report: &mut ValidationReport,
    ) -> Result<()> {
        if window.panes.is_empty() {
            return Err(Error::config(
                format!("{path}.panes"),
                "must contain at least one pane",
            ));
        }

        let mut focused = 0;
        for (j, pane) in window.panes.iter().enumerate() {
            let pane_path = format!("{path}.panes[{j}]");
            if pane.focus {
                focused += 1;
            }
            check_sleep(pane.sleep_before, &pane_path, "sleep_before")?;
            check_sleep(pane.sleep_after, &pane_path, "sleep_after")?;
            check_command_sleeps(&pane.shell_command, &format!("{pane_path}.shell_command"))?;
            if let Some(before) = &pane.shell_command_before {
                check_command_sleeps(before, &format!("{pane_path}.shell_command_before"))?;
            }
        }

        if focused > 1 {
            report.warn(
                format!("{path}.panes"),
                format!("{focused} panes are marked focus; the last one wins"),
            );
        }
        Ok(())
    }

    fn check_window(
        &self,
        window: &Mapping,
        path: &str,
        indexes: &mut HashSet<u64>,
    ) -> Result<()> {
        self.check_unknown_keys(window, path, &WINDOW_KEYS)?;

        for key in ["window_name", "start_directory", "layout", "window_shell"] {
            check_string(window, path, key)?;
        }
        check_options(window, path, "options")?;
        check_options(window, path, "options_after")?;
        self.check_commands(window, path, "shell_command_before")?;
        self.check_commands(window, path, "shell_command_after")?;
        check_environment(window, path)?;
        check_bool(window, path, "suppress_history", true)?;
        check_bool(window, path, "focus", false)?;

        match window.get("window_index") {
            None | Some(Value::Null) => {}
            Some(value) => {
                let index_path = join(path, "window_index");
                let Some(index) = value.as_u64().filter(|i| u32::try_from(*i).is_ok()) else {
                    return Err(Error::config(index_path, "must be a non-negative integer"));
                };
                if !indexes.insert(index) {
                    return Err(Error::config(
                        index_path,
                        format!("duplicate window_index {index}"),
                    ));
                }
            }
        }

        let panes_path = join(path, "panes");
        let panes = match window.get("panes") {
            None => return Err(Error::config(panes_path, "is required")),
            Some(Value::Sequence(panes)) if panes.is_empty() => {
                return Err(Error::config(panes_path, "must contain at least one pane"))
            }
            Some(Value::Sequence(panes)) => panes,
            Some(_) => return Err(Error::config(panes_path, "must be a list of panes")),
        };

        for (j, pane) in panes.iter().enumerate() {
            let pane_path = format!("{panes_path}[{j}]");
            let Value::Mapping(pane) = pane else {
                return Err(Error::config(
                    pane_path,
                    "pane must be a command, a list of commands or a mapping",
                ));
            };
            self.check_pane(pane, &pane_path)?;
        }

        Ok(())
    }

    fn check_pane(&self, pane: &Mapping, path: &str) -> Result<()> {
        self.check_unknown_keys(pane, path, &PANE_KEYS)?;

        if pane.get("shell_command").is_some_and(Value::is_null) {
            return Err(Error::config(
                join(path, "shell_command"),
                "must be a list of commands",
            ));
        }
        self.check_commands(pane, path, "shell_command")?;
        self.check_commands(pane, path, "shell_command_before")?;
        check_string(pane, path, "start_directory")?;
        check_string(pane, path, "shell")?;
        check_environment(pane, path)?;
        check_bool(pane, path, "suppress_history", true)?;
        check_bool(pane, path, "enter", true)?;
        check_bool(pane, path, "focus", false)?;
        check_raw_sleep(pane, path, "sleep_before")?;
        check_raw_sleep(pane, path, "sleep_after")?;
        Ok(())
    }

    fn check_commands(&self, block: &Mapping, path: &str, key: &str) -> Result<()> {
        let list_path = join(path, key);
        let commands = match block.get(key) {
            None | Some(Value::Null) => return Ok(()),
            Some(Value::Sequence(commands)) => commands,
            Some(_) => return Err(Error::config(list_path, "must be a list of commands")),
        };

        for (k, command) in commands.iter().enumerate() {
            let command_path = format!("{list_path}[{k}]");
            match command {
                Value::String(_) => {}
                Value::Mapping(spec) => {
                    self.check_unknown_keys(spec, &command_path, &COMMAND_KEYS)?;
                    if !spec.get("cmd").is_some_and(Value::is_string) {
                        return Err(Error::config(
                            join(&command_path, "cmd"),
                            "is required and must be a string",
                        ));
                    }
                    check_bool(spec, &command_path, "enter", true)?;
                    check_raw_sleep(spec, &command_path, "sleep_before")?;
                    check_raw_sleep(spec, &command_path, "sleep_after")?;
                }
                _ => {
                    return Err(Error::config(
                        command_path,
                        "must be a string or a mapping with 'cmd'",
                    ))
                }
            }
        }
        Ok(())
    }

    fn check_unknown_keys(&self, block: &Mapping, path: &str, known: &[&str]) -> Result<()> {
        if !self.strict {
            return Ok(());
        }
        for key in block.keys() {
            let name = key.as_str().unwrap_or_default();
            if !known.contains(&name) {
                return Err(Error::config(
                    join(path, &key_label(key)),
                    "unknown key",
                ));
            }
        }
        Ok(())
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn key_label(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

fn check_string(block: &Mapping, path: &str, key: &str) -> Result<()> {
    match block.get(key) {
        None | Some(Value::Null | Value::String(_)) => Ok(()),
        Some(_) => Err(Error::config(join(path, key), "must be a string")),
    }
}

fn check_bool(block: &Mapping, path: &str, key: &str, nullable: bool) -> Result<()> {
    match block.get(key) {
        None | Some(Value::Bool(_)) => Ok(()),
        Some(Value::Null) if nullable => Ok(()),
        Some(_) => Err(Error::config(join(path, key), "must be true or false")),
    }
}

fn check_raw_sleep(block: &Mapping, path: &str, key: &str) -> Result<()> {
    match block.get(key) {
        None | Some(Value::Null) => Ok(()),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(secs) if secs < 0.0 => Err(Error::config(join(path, key), "must not be negative")),
            _ => Ok(()),
        },
        Some(_) => Err(Error::config(join(path, key), "must be a number of seconds")),
    }
}

fn check_environment(block: &Mapping, path: &str) -> Result<()> {
    let env_path = join(path, "environment");
    let env = match block.get("environment") {
        None | Some(Value::Null) => return Ok(()),
        Some(Value::Mapping(env)) => env,
        Some(_) => return Err(Error::config(env_path, "must be a mapping")),
    };
    for (key, value) in env {
        let Value::String(name) = key else {
            return Err(Error::config(env_path, "variable names must be strings"));
        };
        if !value.is_string() {
            return Err(Error::config(join(&env_path, name), "must be a string"));
        }
    }
    Ok(())
}

fn check_options(block: &Mapping, path: &str, key: &str) -> Result<()> {
    let options_path = join(path, key);
    let options = match block.get(key) {
        None => return Ok(()),
        Some(Value::Mapping(options)) => options,
        Some(_) => return Err(Error::config(options_path, "must be a mapping")),
    };
    for (name, value) in options {
        let Value::String(name) = name else {
            return Err(Error::config(options_path, "option names must be strings"));
        };
        if !matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_)) {
            return Err(Error::config(
                join(&options_path, name),
                "must be a string, number or boolean",
            ));
        }
    }
    Ok(())
}

fn check_sleep(value: Option<f64>, path: &str, key: &str) -> Result<()> {
    match value {
        Some(secs) if !secs.is_finite() => Err(Error::config(join(path, key), "must be finite")),
        Some(secs) if secs < 0.0 => Err(Error::config(join(path, key), "must not be negative")),
        _ => Ok(()),
    }
}

fn check_command_sleeps(commands: &[CommandSpec], path: &str) -> Result<()> {
    for (k, command) in commands.iter().enumerate() {
        let command_path = format!("{path}[{k}]");
        check_sleep(command.sleep_before, &command_path, "sleep_before")?;
        check_sleep(command.sleep_after, &command_path, "sleep_after")?;
    }
    Ok(())
}
