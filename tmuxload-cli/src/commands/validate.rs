//! Command to validate a workspace file.

use crate::error::CliError;
use crate::utils::{load_workspace, resolve_workspace, DialectArg, GlobalOptions};
use clap::Args;

/// Check a workspace file without touching tmux.
#[derive(Args)]
pub struct ValidateCommand {
    /// Workspace file, directory, or name in the workspace directory
    #[arg(value_name = "WORKSPACE")]
    pub workspace: String,

    /// Reject unknown keys in window and pane blocks
    #[arg(long)]
    pub strict: bool,

    /// Read the workspace as this dialect instead of detecting it
    #[arg(long, value_enum)]
    pub dialect: Option<DialectArg>,
}

impl ValidateCommand {
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        // 1. Find the file
        let path = resolve_workspace(global, &self.workspace)?;

        // 2. Run the whole load pipeline
        match load_workspace(&path, self.dialect, self.strict) {
            Ok(loaded) => {
                for warning in loaded.report.warnings() {
                    println!("warning: {warning}");
                }
                let config = &loaded.config;
                println!(
                    "Workspace is valid: session '{}', {} windows, {} panes ({})",
                    config.session_name,
                    config.windows.len(),
                    config.pane_count(),
                    loaded.dialect
                );
                Ok(())
            }
            Err(e) => {
                eprintln!("Validation error: {e}");
                Err(CliError::SemanticFailure(
                    "Workspace validation failed".to_string(),
                ))
            }
        }
    }
}
