#![deny(missing_docs, unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! # tmuxload
//!
//! A library for loading declarative tmux workspaces.
//!
//! A workspace file describes one session: its windows, their panes and
//! the commands to run in each. This library reads such files (including
//! teamocil and tmuxinator ones), normalizes them into one canonical tree
//! and builds that tree against a tmux server.
//!
//! ## Core Types
//!
//! - [`WorkspaceLoader`]: the load pipeline, from file to [`WorkspaceConfig`]
//! - [`WorkspaceBuilder`]: builds a workspace through a [`Multiplexer`]
//! - [`TmuxClient`] and [`MemoryMultiplexer`]: real and in-memory multiplexers
//! - [`PluginRegistry`] and [`PluginHookRunner`]: build hooks
//! - [`Error`] and [`Result`]: Error handling types
//! - [`Logger`] and [`LogLevel`]: Logging infrastructure
//!
//! ## Examples
//!
//! ```
//! use tmuxload::{ConfigFormat, MemoryMultiplexer, WorkspaceBuilder, WorkspaceLoader};
//!
//! let yaml = "
//! session_name: blog
//! start_directory: /srv/blog
//! windows:
//!   - editor: vim
//!   - window_name: server
//!     layout: even-horizontal
//!     panes: [hugo server, blank]
//! ";
//!
//! let loaded = WorkspaceLoader::new().load_str(yaml, ConfigFormat::Yaml).unwrap();
//! let mut mux = MemoryMultiplexer::new();
//! WorkspaceBuilder::new(&loaded.config).build(&mut mux).unwrap();
//!
//! let session = mux.session("blog").unwrap();
//! assert_eq!(session.window_names(), ["editor", "server"]);
//! assert_eq!(session.windows[1].panes.len(), 2);
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod freeze;
pub mod import;
pub mod logging;
pub mod multiplexer;
pub mod plugin;
pub mod version;

// Re-export key types at crate root for convenience
pub use builder::{
    BuildOutcome, BuildReport, BuildState, ExistingSessionPolicy, FocusPolicy, FocusTarget,
    WorkspaceBuilder,
};
pub use config::{
    ConfigFormat, ConfigReader, LoadedWorkspace, WorkspaceConfig, WorkspaceFinder,
    WorkspaceLoader,
};
pub use error::{Error, Result};
pub use import::Dialect;
pub use logging::{init_logger, LogLevel, Logger};
pub use multiplexer::{MemoryMultiplexer, Multiplexer, TmuxClient};
pub use plugin::{Plugin, PluginHookRunner, PluginRegistry};
pub use version::Version;
