//! Command to list saved workspaces.

use crate::error::CliError;
use crate::utils::{finder, shorten_path, GlobalOptions};
use clap::Args;
use std::io::Write;

/// List saved workspaces.
#[derive(Args)]
pub struct LsCommand {
    /// Show each workspace's file next to its name
    #[arg(short, long)]
    pub long: bool,
}

impl LsCommand {
    /// Execute the ls command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let finder = finder(global)?;
        let names = finder.list()?;
        if names.is_empty() {
            log::info!(
                "no workspaces in {}",
                shorten_path(finder.config_dir())
            );
        }

        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        for name in names {
            if self.long {
                let path = finder.find(&name)?;
                writeln!(handle, "{name}\t{}", shorten_path(&path))?;
            } else {
                writeln!(handle, "{name}")?;
            }
        }

        Ok(())
    }
}
