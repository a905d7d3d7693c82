//! Error types for the tmuxload library.
//!
//! Every stage of the load pipeline and the builder reports failures through
//! the single [`Error`] enum, built with `thiserror`.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for operations that may fail with a tmuxload error.
///
/// # Examples
///
/// ```
/// use tmuxload::{Error, Result};
///
/// fn session_name() -> Result<String> {
///     Ok("dev".to_string())
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the tmuxload library.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or structurally invalid workspace input.
    ///
    /// `path` is a dotted path to the offending field (for example
    /// `windows[1].panes`), or empty when the whole document is at fault.
    #[error("{}", config_message(path, message))]
    Config {
        /// Dotted path to the offending field.
        path: String,
        /// What is wrong with it.
        message: String,
    },

    /// The workspace document contained nothing.
    #[error("workspace is empty: {source_name}")]
    EmptyConfig {
        /// Where the document came from (file path or `<memory>`).
        source_name: String,
    },

    /// A file could not be read.
    #[error("invalid path {}: {reason}", path.display())]
    InvalidPath {
        /// The unreadable path.
        path: PathBuf,
        /// The reason it could not be read.
        reason: String,
    },

    /// The session's `before_script` exited unsuccessfully.
    #[error("before_script '{script}' failed{}{}", exit_suffix(*code), output_suffix(output))]
    BeforeLoadScript {
        /// The script as configured.
        script: String,
        /// The exit code, when the process exited normally.
        code: Option<i32>,
        /// Captured stdout and stderr.
        output: String,
    },

    /// The session's `before_script` does not exist or is not executable.
    #[error("before_script not found: {}", path.display())]
    BeforeLoadScriptNotExists {
        /// The script path that could not be started.
        path: PathBuf,
    },

    /// No importer signature matched, or more than one did.
    #[error("cannot import workspace: {reason}")]
    ImportFormat {
        /// Why the dialect could not be determined.
        reason: String,
    },

    /// The session already exists and the caller disallowed reuse.
    #[error("session '{name}' already exists")]
    SessionExists {
        /// Name of the existing session.
        name: String,
    },

    /// The multiplexer rejected an operation.
    #[error("multiplexer command '{command}' failed: {message}")]
    Multiplexer {
        /// The command that failed (for example `split-window`).
        command: String,
        /// The multiplexer's explanation.
        message: String,
    },

    /// A workspace referenced a plugin that is not registered.
    #[error("plugin not found: {name}")]
    PluginNotFound {
        /// The unresolved plugin reference.
        name: String,
    },

    /// A plugin hook returned an error.
    #[error("plugin '{plugin}' failed in {hook}: {message}")]
    Plugin {
        /// Plugin name.
        plugin: String,
        /// Hook that failed.
        hook: String,
        /// Failure description.
        message: String,
    },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML (de)serialization failed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn config_message(path: &str, message: &str) -> String {
    if path.is_empty() {
        format!("config error: {message}")
    } else {
        format!("config error at '{path}': {message}")
    }
}

fn exit_suffix(code: Option<i32>) -> String {
    code.map_or_else(
        || " (terminated by signal)".to_string(),
        |c| format!(" with exit code {c}"),
    )
}

fn output_suffix(output: &str) -> String {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {trimmed}")
    }
}

impl Error {
    /// Shorthand for a [`Error::Config`] at `path`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tmuxload::Error;
    ///
    /// let err = Error::config("windows", "must not be empty");
    /// assert_eq!(err.config_path(), Some("windows"));
    /// ```
    pub fn config(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a [`Error::Multiplexer`] failure.
    pub fn multiplexer(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Multiplexer {
            command: command.into(),
            message: message.into(),
        }
    }

    /// The dotted field path of a configuration error, if this is one.
    #[must_use]
    pub fn config_path(&self) -> Option<&str> {
        match self {
            Self::Config { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Check if the error was raised before any multiplexer mutation.
    ///
    /// # Examples
    ///
    /// ```
    /// use tmuxload::Error;
    ///
    /// let err = Error::EmptyConfig { source_name: "dev.yaml".into() };
    /// assert!(err.is_validation());
    /// ```
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Config { .. }
                | Self::EmptyConfig { .. }
                | Self::ImportFormat { .. }
                | Self::Yaml(_)
                | Self::Json(_)
        )
    }

    /// Check if the error comes from the session's `before_script`.
    #[must_use]
    pub fn is_before_script(&self) -> bool {
        matches!(
            self,
            Self::BeforeLoadScript { .. } | Self::BeforeLoadScriptNotExists { .. }
        )
    }
}
