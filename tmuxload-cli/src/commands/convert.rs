//! Command to convert a workspace file between YAML and JSON.

use crate::error::CliError;
use crate::utils::{write_output, GlobalOptions};
use clap::Args;
use std::path::PathBuf;
use tmuxload::{ConfigFormat, ConfigReader};

/// Convert a workspace file between YAML and JSON.
#[derive(Args)]
pub struct ConvertCommand {
    /// Workspace file to convert
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Write the result here instead of stdout
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

impl ConvertCommand {
    /// Execute the convert command.
    pub fn execute(self, _global: &GlobalOptions) -> Result<(), CliError> {
        if !self.file.is_file() {
            return Err(CliError::InvalidArguments(format!(
                "File not found: {}",
                self.file.display()
            )));
        }

        let source = ConfigFormat::from_path(&self.file);
        let target = match source {
            ConfigFormat::Yaml => ConfigFormat::Json,
            ConfigFormat::Json => ConfigFormat::Yaml,
        };

        if let Some(output) = &self.output {
            if ConfigFormat::from_path(output) != target {
                return Err(CliError::InvalidArguments(format!(
                    "{} must have a .{} extension",
                    output.display(),
                    target.extension()
                )));
            }
        }

        // Includes are kept as written; only the encoding changes.
        let contents = std::fs::read_to_string(&self.file)?;
        let source_name = self.file.display().to_string();
        let raw = ConfigReader::parse_str(&contents, source, &source_name)?;

        let text = ConfigReader::dump(&raw, target)?;
        write_output(&text, self.output.as_deref())
    }
}
