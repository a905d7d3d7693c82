//! Main entry point for the tmuxload CLI.
//!
//! This is the command-line interface for loading tmux workspaces.
//! It provides commands for working with workspace files:
//! - `load`: Build a workspace and attach to it
//! - `import`: Convert a teamocil or tmuxinator file
//! - `convert`: Switch a workspace file between YAML and JSON
//! - `validate`: Check a workspace without touching tmux
//! - `freeze`: Export a running session as a workspace
//! - `ls`: List saved workspaces

mod cli;
mod commands;
mod error;
mod utils;

use clap::Parser;
use cli::Cli;
use utils::GlobalOptions;

fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    if let Err(e) = tmuxload::init_logger(cli.verbose, cli.quiet).install() {
        eprintln!("Error: {e}");
    }

    let global = GlobalOptions {
        verbose: cli.verbose,
        quiet: cli.quiet,
        config_dir: cli.config_dir,
    };

    // Execute the command
    let result = match cli.command {
        cli::Command::Load(cmd) => cmd.execute(&global),
        cli::Command::Import(cmd) => cmd.execute(&global),
        cli::Command::Convert(cmd) => cmd.execute(&global),
        cli::Command::Validate(cmd) => cmd.execute(&global),
        cli::Command::Freeze(cmd) => cmd.execute(&global),
        cli::Command::Ls(cmd) => cmd.execute(&global),
    };

    // Handle errors and set exit code
    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
