//! Import command implementation.
//!
//! This module implements the `import` command, which converts a teamocil
//! or tmuxinator file into a tmuxload workspace. Only the dialect is
//! translated: variables and `~` stay as written so the result can be
//! saved and loaded later.

use crate::error::CliError;
use crate::utils::{output_format, write_output, GlobalOptions};
use clap::{Args, ValueEnum};
use std::path::PathBuf;
use tmuxload::config::{SchemaValidator, ShorthandExpander};
use tmuxload::import::{self, teamocil, Dialect};
use tmuxload::ConfigReader;

/// Convert a teamocil or tmuxinator file to a tmuxload workspace.
#[derive(Args)]
pub struct ImportCommand {
    /// Format of the input file
    #[arg(value_enum, value_name = "FORMAT")]
    pub format: ImportFormat,

    /// File to import
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Write the workspace here instead of stdout
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Emit JSON instead of YAML
    #[arg(long)]
    pub json: bool,
}

/// Input format for `import`.
#[derive(Clone, Copy, Debug, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum ImportFormat {
    /// teamocil, either shape
    Teamocil,
    /// tmuxinator
    Tmuxinator,
    /// Detect the format
    Auto,
}

impl ImportCommand {
    /// Execute the import command.
    pub fn execute(self, _global: &GlobalOptions) -> Result<(), CliError> {
        // 1. Read the file
        let raw = ConfigReader::read_file(&self.file)?;

        // 2. Translate it
        let imported = match self.format {
            ImportFormat::Teamocil => teamocil::import(&raw)?,
            ImportFormat::Tmuxinator => import::import(&raw, Some(Dialect::Tmuxinator))?,
            ImportFormat::Auto => {
                let dialect = import::detect(&raw).verdict()?;
                if dialect == Dialect::Canonical {
                    log::warn!("{} is already a tmuxload workspace", self.file.display());
                }
                import::import(&raw, Some(dialect))?
            }
        };

        // 3. Make sure the result loads
        let expanded = ShorthandExpander::expand(&imported);
        SchemaValidator::new().check_raw(&expanded)?;

        // 4. Write it out
        let format = output_format(self.json, self.output.as_deref());
        let text = ConfigReader::dump(&expanded, format)?;
        write_output(&text, self.output.as_deref())
    }
}
