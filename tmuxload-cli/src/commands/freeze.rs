//! Freeze command implementation.
//!
//! This module implements the `freeze` command, which reads a running
//! session back from tmux and writes it out as a workspace.

use crate::error::CliError;
use crate::utils::{output_format, write_output, GlobalOptions};
use clap::Args;
use std::path::PathBuf;
use tmuxload::multiplexer::Multiplexer;
use tmuxload::{freeze, ConfigReader, TmuxClient};

/// Export a running session as a workspace.
#[derive(Args)]
pub struct FreezeCommand {
    /// Session to export
    #[arg(value_name = "SESSION")]
    pub session: String,

    /// Write the workspace here instead of stdout
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Emit JSON instead of YAML
    #[arg(long)]
    pub json: bool,

    /// tmux socket name (-L)
    #[arg(short = 'L', long, value_name = "NAME")]
    pub socket_name: Option<String>,

    /// tmux socket path (-S)
    #[arg(short = 'S', long, value_name = "PATH")]
    pub socket_path: Option<PathBuf>,
}

impl FreezeCommand {
    /// Execute the freeze command.
    pub fn execute(self, _global: &GlobalOptions) -> Result<(), CliError> {
        let mut client = TmuxClient::new()
            .with_socket_name(self.socket_name.clone())
            .with_socket_path(self.socket_path.clone());

        let session = client.find_session(&self.session)?.ok_or_else(|| {
            CliError::SemanticFailure(format!("No tmux session named '{}'", self.session))
        })?;
        let config = freeze::freeze(&mut client, &session)?;

        let format = output_format(self.json, self.output.as_deref());
        let text = ConfigReader::dump(&config, format)?;
        write_output(&text, self.output.as_deref())
    }
}
