//! Utility functions for CLI operations.
//!
//! This module provides common utility functions used across CLI commands,
//! including workspace lookup, loading and output handling.

use crate::error::CliError;
use clap::ValueEnum;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tmuxload::import::Dialect;
use tmuxload::{ConfigFormat, LoadedWorkspace, WorkspaceFinder, WorkspaceLoader};

/// Global CLI options shared across all commands.
#[derive(Debug, Clone)]
#[allow(dead_code)] // Fields used via pattern matching in main.rs
pub struct GlobalOptions {
    /// Enable verbose output.
    pub verbose: bool,

    /// Suppress non-essential output.
    pub quiet: bool,

    /// Override the workspace directory.
    pub config_dir: Option<PathBuf>,
}

/// Workspace dialect accepted by `--dialect`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum DialectArg {
    /// Native tmuxload workspace
    Canonical,
    /// teamocil before 1.0
    TeamocilLegacy,
    /// teamocil 1.x
    TeamocilModern,
    /// tmuxinator project
    Tmuxinator,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Canonical => Dialect::Canonical,
            DialectArg::TeamocilLegacy => Dialect::TeamocilLegacy,
            DialectArg::TeamocilModern => Dialect::TeamocilModern,
            DialectArg::Tmuxinator => Dialect::Tmuxinator,
        }
    }
}

/// Build the workspace finder from global options.
pub fn finder(global: &GlobalOptions) -> Result<WorkspaceFinder, CliError> {
    match &global.config_dir {
        Some(dir) => Ok(WorkspaceFinder::with_config_dir(dir)),
        None => Ok(WorkspaceFinder::new()?),
    }
}

/// Resolve a workspace argument (file, directory or name) to a file.
pub fn resolve_workspace(global: &GlobalOptions, workspace: &str) -> Result<PathBuf, CliError> {
    let path = finder(global)?.find(workspace)?;
    log::debug!("workspace '{workspace}' resolved to {}", path.display());
    Ok(path)
}

/// Run the full load pipeline on a workspace file.
pub fn load_workspace(
    path: &Path,
    dialect: Option<DialectArg>,
    strict: bool,
) -> Result<LoadedWorkspace, CliError> {
    let loaded = WorkspaceLoader::new()
        .with_dialect_opt(dialect.map(Dialect::from))
        .strict(strict)
        .load_path(path)?;
    Ok(loaded)
}

/// Pick the output format: JSON when asked for, or when the output file
/// ends in `.json`.
pub fn output_format(json: bool, output: Option<&Path>) -> ConfigFormat {
    if json {
        return ConfigFormat::Json;
    }
    output.map_or(ConfigFormat::Yaml, ConfigFormat::from_path)
}

/// Write `text` to `output`, or to stdout when no file is given.
pub fn write_output(text: &str, output: Option<&Path>) -> Result<(), CliError> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, text)?;
            log::info!("wrote {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(text.as_bytes())?;
            handle.flush()?;
        }
    }
    Ok(())
}

/// Shorten a path for display.
///
/// If the path is within the home directory, show it as ~/...
/// Otherwise, show the full path.
pub fn shorten_path(path: &Path) -> String {
    if let Some(home) = home::home_dir() {
        if let Ok(relative) = path.strip_prefix(&home) {
            return format!("~/{}", relative.display());
        }
    }
    path.display().to_string()
}
