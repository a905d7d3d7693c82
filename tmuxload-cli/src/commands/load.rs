//! Load command implementation.
//!
//! This module implements the `load` command, which builds a workspace in
//! tmux and attaches the terminal to it. With `--dry-run` the build runs
//! against an in-memory multiplexer and the tmux commands it would have
//! issued are printed instead.

use crate::error::CliError;
use crate::utils::{load_workspace, resolve_workspace, DialectArg, GlobalOptions};
use clap::{Args, ValueEnum};
use std::path::{Path, PathBuf};
use tmuxload::multiplexer::Multiplexer;
use tmuxload::plugin::RuntimeVersions;
use tmuxload::{
    BuildOutcome, ExistingSessionPolicy, FocusPolicy, MemoryMultiplexer, PluginRegistry,
    TmuxClient, WorkspaceBuilder, WorkspaceConfig,
};

/// Build a workspace and attach to it.
#[derive(Args)]
pub struct LoadCommand {
    /// Workspace file, directory, or name in the workspace directory
    #[arg(value_name = "WORKSPACE")]
    pub workspace: String,

    /// Build the session without attaching to it
    #[arg(short = 'd', long)]
    pub detached: bool,

    /// Print the tmux commands instead of running them
    #[arg(long)]
    pub dry_run: bool,

    /// Add the windows to the session if it already exists
    #[arg(long, conflicts_with = "existing")]
    pub append: bool,

    /// What to do when the session already exists
    #[arg(long, value_enum, default_value = "reattach")]
    pub existing: ExistingArg,

    /// Which of several focus marks wins
    #[arg(long, value_enum, default_value = "last")]
    pub focus: FocusArg,

    /// tmux socket name (-L)
    #[arg(short = 'L', long, value_name = "NAME")]
    pub socket_name: Option<String>,

    /// tmux socket path (-S)
    #[arg(short = 'S', long, value_name = "PATH")]
    pub socket_path: Option<PathBuf>,

    /// Read the workspace as this dialect instead of detecting it
    #[arg(long, value_enum)]
    pub dialect: Option<DialectArg>,

    /// Reject unknown keys in window and pane blocks
    #[arg(long)]
    pub strict: bool,
}

/// Existing-session policy for `--existing`.
#[derive(Clone, Copy, Debug, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum ExistingArg {
    /// Attach to the session as it is
    Reattach,
    /// Build the windows into it
    Append,
    /// Fail with an error
    Fail,
}

/// Focus policy for `--focus`.
#[derive(Clone, Copy, Debug, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum FocusArg {
    /// The last mark wins
    Last,
    /// The first mark wins
    First,
}

impl LoadCommand {
    /// Execute the load command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        // 1. Load and validate before touching tmux
        let path = resolve_workspace(global, &self.workspace)?;
        let loaded = load_workspace(&path, self.dialect, self.strict)?;
        let config = loaded.config;

        // 2. Build, for real or in memory
        if self.dry_run {
            return self.print_dry_run(&config);
        }

        let mut client = TmuxClient::new()
            .with_socket_name(self.socket_name.clone().or_else(|| config.socket_name.clone()))
            .with_socket_path(self.socket_path.clone());
        let outcome = self.build(&config, &mut client)?;

        // 3. Attach unless detached
        let session = outcome.session();
        match &outcome {
            BuildOutcome::Created(_) => log::info!("created session '{}'", session.name),
            BuildOutcome::Appended(_) => log::info!("appended to session '{}'", session.name),
            BuildOutcome::Reattached(_) => log::info!("session '{}' already exists", session.name),
        }
        if !self.detached {
            client.attach(session).map_err(CliError::Build)?;
        }

        Ok(())
    }

    fn print_dry_run(&self, config: &WorkspaceConfig) -> Result<(), CliError> {
        let mut mux = MemoryMultiplexer::new();
        let script = config.before_script.clone();
        let result = self.build_with(config, &mut mux, |builder| {
            builder
                .with_script_runner(|script: &str, _: Option<&Path>| -> tmuxload::Result<()> {
                    log::info!("dry run: not running before_script '{script}'");
                    Ok(())
                })
                .with_sleeper(|_| {})
        });

        if let Some(script) = script {
            println!("# before_script: {script}");
        }
        for call in mux.mutations() {
            println!("{call}");
        }
        result.map(|_| ())
    }

    fn build(
        &self,
        config: &WorkspaceConfig,
        mux: &mut dyn Multiplexer,
    ) -> Result<BuildOutcome, CliError> {
        self.build_with(config, mux, |builder| builder)
    }

    fn build_with<'a>(
        &self,
        config: &WorkspaceConfig,
        mux: &mut dyn Multiplexer,
        configure: impl FnOnce(WorkspaceBuilder<'a>) -> WorkspaceBuilder<'a>,
    ) -> Result<BuildOutcome, CliError> {
        let versions = RuntimeVersions::current(mux.version().ok());
        let plugins = PluginRegistry::new().resolve(&config.plugins, &versions)?;

        let mut builder = configure(
            WorkspaceBuilder::new(config)
                .with_plugins(plugins)
                .with_existing_session(self.existing_policy())
                .with_focus_policy(match self.focus {
                    FocusArg::Last => FocusPolicy::LastWins,
                    FocusArg::First => FocusPolicy::FirstWins,
                }),
        );
        builder.build(mux).map_err(CliError::from_build)
    }

    fn existing_policy(&self) -> ExistingSessionPolicy {
        if self.append {
            return ExistingSessionPolicy::Append;
        }
        match self.existing {
            ExistingArg::Reattach => ExistingSessionPolicy::Reattach,
            ExistingArg::Append => ExistingSessionPolicy::Append,
            ExistingArg::Fail => ExistingSessionPolicy::Fail,
        }
    }
}
