//! CLI structure and command definitions.
//!
//! This module defines the main CLI structure using clap's derive macros,
//! including global options and subcommands.

use crate::commands::{
    ConvertCommand, FreezeCommand, ImportCommand, LoadCommand, LsCommand, ValidateCommand,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line tool for loading declarative tmux workspaces.
#[derive(Parser)]
#[command(name = "tmuxload")]
#[command(version, about = "Load declarative tmux workspaces", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Directory holding named workspaces
    #[arg(long, value_name = "PATH", global = true, env = "TMUXLOAD_CONFIGDIR")]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand)]
pub enum Command {
    /// Build a workspace and attach to it
    Load(LoadCommand),

    /// Convert a teamocil or tmuxinator file to a tmuxload workspace
    Import(ImportCommand),

    /// Convert a workspace file between YAML and JSON
    Convert(ConvertCommand),

    /// Check a workspace file without touching tmux
    Validate(ValidateCommand),

    /// Export a running session as a workspace
    Freeze(FreezeCommand),

    /// List saved workspaces
    Ls(LsCommand),
}
