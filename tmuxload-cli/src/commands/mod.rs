//! CLI command implementations.
//!
//! This module contains the implementations of all CLI commands:
//! - `load`: Build a workspace and attach to it
//! - `import`: Convert a teamocil or tmuxinator file
//! - `convert`: Switch a workspace file between YAML and JSON
//! - `validate`: Check a workspace file without touching tmux
//! - `freeze`: Export a running session as a workspace
//! - `ls`: List saved workspaces

pub mod convert;
pub mod freeze;
pub mod import;
pub mod load;
pub mod ls;
pub mod validate;

pub use convert::ConvertCommand;
pub use freeze::FreezeCommand;
pub use import::ImportCommand;
pub use load::LoadCommand;
pub use ls::LsCommand;
pub use validate::ValidateCommand;
