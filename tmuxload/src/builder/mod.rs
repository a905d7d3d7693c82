//! Building a workspace against a multiplexer.
//!
//! [`WorkspaceBuilder`] walks a [`WorkspaceConfig`] through a fixed
//! sequence of [`BuildState`]s:
//!
//! ```text
//! Idle -> SessionResolution -> ( WindowConstruction
//!                                -> ( PaneConstruction -> CommandExecution )+
//!                                -> OptionsApplication )+
//!      -> FocusResolution -> Done
//! ```
//!
//! Any state can fall into `Aborted`. The configuration is validated before
//! the first multiplexer call, so a bad workspace never leaves anything
//! behind. Once mutation has started, the first failure stops the build and
//! whatever was created stays, except when the `before_script` fails: the
//! builder then kills the session it just created.

pub mod focus;
pub mod script;

pub use focus::{FocusPlan, FocusPolicy, FocusTarget};
pub use script::{ProcessScriptRunner, ScriptRunner};

use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::config::{DefaultsTrickler, PaneConfig, SchemaValidator, WindowConfig, WorkspaceConfig};
use crate::error::{Error, Result};
use crate::multiplexer::{
    CreatedWindow, Multiplexer, OptionScope, PaneRef, PaneSpec, SessionRef, SessionSpec,
    WindowRef, WindowSpec,
};
use crate::plugin::PluginHookRunner;

/// Where a build is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    /// Nothing has happened yet.
    Idle,
    /// Looking for an existing session, or creating one.
    SessionResolution,
    /// Creating a window.
    WindowConstruction {
        /// Window position in the workspace.
        window: usize,
    },
    /// Creating a pane.
    PaneConstruction {
        /// Window position in the workspace.
        window: usize,
        /// Pane position in the window.
        pane: usize,
    },
    /// Sending a pane's commands.
    CommandExecution {
        /// Window position in the workspace.
        window: usize,
        /// Pane position in the window.
        pane: usize,
    },
    /// Applying `options_after` to a finished window.
    OptionsApplication {
        /// Window position in the workspace.
        window: usize,
    },
    /// Selecting the focused panes and window.
    FocusResolution,
    /// The build finished.
    Done,
    /// The build failed.
    Aborted,
}

impl BuildState {
    /// True for `Done` and `Aborted`.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }

    /// Check if `next` may follow this state.
    ///
    /// # Examples
    ///
    /// ```
    /// use tmuxload::builder::BuildState;
    ///
    /// assert!(BuildState::Idle.can_advance_to(BuildState::SessionResolution));
    /// assert!(BuildState::Idle.can_advance_to(BuildState::Aborted));
    /// assert!(!BuildState::Idle.can_advance_to(BuildState::Done));
    /// assert!(!BuildState::Done.can_advance_to(BuildState::Aborted));
    /// ```
    #[must_use]
    pub fn can_advance_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::Done | Self::Aborted, _) => false,
            (_, Self::Aborted)
            | (Self::Idle, Self::SessionResolution)
            | (Self::SessionResolution, Self::WindowConstruction { window: 0 } | Self::Done)
            | (Self::OptionsApplication { .. }, Self::FocusResolution)
            | (Self::FocusResolution, Self::Done) => true,
            (Self::WindowConstruction { window: w }, Self::PaneConstruction { window, pane }) => {
                w == window && pane == 0
            }
            (
                Self::PaneConstruction { window: w, pane: p },
                Self::CommandExecution { window, pane },
            ) => w == window && p == pane,
            (
                Self::CommandExecution { window: w, pane: p },
                Self::PaneConstruction { window, pane },
            ) => w == window && pane == p + 1,
            (Self::CommandExecution { window: w, .. }, Self::OptionsApplication { window }) => {
                w == window
            }
            (Self::OptionsApplication { window: w }, Self::WindowConstruction { window }) => {
                window == w + 1
            }
            _ => false,
        }
    }
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::SessionResolution => write!(f, "session resolution"),
            Self::WindowConstruction { window } => write!(f, "window {window}"),
            Self::PaneConstruction { window, pane } => write!(f, "pane {window}.{pane}"),
            Self::CommandExecution { window, pane } => write!(f, "commands {window}.{pane}"),
            Self::OptionsApplication { window } => write!(f, "options {window}"),
            Self::FocusResolution => write!(f, "focus resolution"),
            Self::Done => write!(f, "done"),
            Self::Aborted => write!(f, "aborted"),
        }
    }
}

/// What to do when the session already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExistingSessionPolicy {
    /// Leave it as it is and run the `reattach` hooks.
    #[default]
    Reattach,
    /// Build the workspace's windows into it.
    Append,
    /// Fail with [`Error::SessionExists`].
    Fail,
}

/// What a finished build produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    /// The session built into.
    pub session: SessionRef,
    /// Windows built, in workspace order.
    pub windows: Vec<WindowRef>,
    /// Where focus was put, if anything was marked.
    pub focus: Option<FocusTarget>,
}

/// The result of a successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// A new session was created.
    Created(BuildReport),
    /// Windows were added to an existing session.
    Appended(BuildReport),
    /// The session already existed and was left alone.
    Reattached(SessionRef),
}

impl BuildOutcome {
    /// The session the build ended up with.
    #[must_use]
    pub fn session(&self) -> &SessionRef {
        match self {
            Self::Created(report) | Self::Appended(report) => &report.session,
            Self::Reattached(session) => session,
        }
    }

    /// The build report, unless the session was only reattached.
    #[must_use]
    pub fn report(&self) -> Option<&BuildReport> {
        match self {
            Self::Created(report) | Self::Appended(report) => Some(report),
            Self::Reattached(_) => None,
        }
    }
}

/// Builds one workspace.
///
/// # Examples
///
/// ```
/// use tmuxload::builder::{BuildOutcome, WorkspaceBuilder};
/// use tmuxload::config::{ConfigFormat, WorkspaceLoader};
/// use tmuxload::multiplexer::MemoryMultiplexer;
///
/// let loaded = WorkspaceLoader::new()
///     .load_str("session_name: dev\nwindows:\n  - editor: vim\n  - shell\n", ConfigFormat::Yaml)
///     .unwrap();
///
/// let mut mux = MemoryMultiplexer::new();
/// let outcome = WorkspaceBuilder::new(&loaded.config).build(&mut mux).unwrap();
///
/// assert!(matches!(outcome, BuildOutcome::Created(_)));
/// assert_eq!(mux.session("dev").unwrap().window_names(), ["editor", "shell"]);
/// ```
pub struct WorkspaceBuilder<'a> {
    config: WorkspaceConfig,
    plugins: PluginHookRunner,
    existing: ExistingSessionPolicy,
    focus_policy: FocusPolicy,
    scripts: Box<dyn ScriptRunner + 'a>,
    sleep: Box<dyn FnMut(Duration) + 'a>,
    state: BuildState,
    session: Option<SessionRef>,
    created: bool,
}

impl<'a> WorkspaceBuilder<'a> {
    /// A builder for `config`, trickled if it was not already.
    #[must_use]
    pub fn new(config: &WorkspaceConfig) -> Self {
        Self {
            config: DefaultsTrickler::trickle(config),
            plugins: PluginHookRunner::empty(),
            existing: ExistingSessionPolicy::default(),
            focus_policy: FocusPolicy::default(),
            scripts: Box::new(ProcessScriptRunner),
            sleep: Box::new(std::thread::sleep),
            state: BuildState::Idle,
            session: None,
            created: false,
        }
    }

    /// Run `plugins` at the build's hook points.
    #[must_use]
    pub fn with_plugins(mut self, plugins: PluginHookRunner) -> Self {
        self.plugins = plugins;
        self
    }

    /// Decide what happens when the session already exists.
    #[must_use]
    pub fn with_existing_session(mut self, policy: ExistingSessionPolicy) -> Self {
        self.existing = policy;
        self
    }

    /// Decide which of several focus marks wins.
    #[must_use]
    pub fn with_focus_policy(mut self, policy: FocusPolicy) -> Self {
        self.focus_policy = policy;
        self
    }

    /// Run `before_script` with `runner`.
    #[must_use]
    pub fn with_script_runner(mut self, runner: impl ScriptRunner + 'a) -> Self {
        self.scripts = Box::new(runner);
        self
    }

    /// Block with `sleep` for `sleep_before` and `sleep_after`.
    #[must_use]
    pub fn with_sleeper(mut self, sleep: impl FnMut(Duration) + 'a) -> Self {
        self.sleep = Box::new(sleep);
        self
    }

    /// The current state.
    #[must_use]
    pub fn state(&self) -> BuildState {
        self.state
    }

    /// The session being built into, once resolved.
    #[must_use]
    pub fn session(&self) -> Option<&SessionRef> {
        self.session.as_ref()
    }

    /// The trickled workspace being built.
    #[must_use]
    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    /// Build the workspace.
    ///
    /// # Errors
    ///
    /// Validation errors are returned before the multiplexer is touched.
    /// After that the first multiplexer, plugin or script error stops the
    /// build and is returned; the state is then [`BuildState::Aborted`].
    /// A failing `before_script`, or a failing `before_script` plugin hook,
    /// also kills the session the build just created.
    pub fn build(&mut self, mux: &mut dyn Multiplexer) -> Result<BuildOutcome> {
        self.state = BuildState::Idle;
        self.session = None;
        self.created = false;

        let report = SchemaValidator::new().validate(&self.config)?;
        for warning in report.warnings() {
            log::debug!("{warning}");
        }

        match self.run(mux) {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                if !self.state.is_terminal() {
                    self.transition(BuildState::Aborted);
                }
                Err(e)
            }
        }
    }

    /// Kill the session this builder created, if any, and stop.
    ///
    /// Sessions that existed before the build are never killed.
    ///
    /// # Errors
    ///
    /// Fails when the multiplexer cannot kill the session.
    pub fn abort(&mut self, mux: &mut dyn Multiplexer) -> Result<()> {
        if !self.state.is_terminal() {
            self.transition(BuildState::Aborted);
        }
        match self.session.take() {
            Some(session) if self.created => {
                log::info!("killing session '{}'", session.name);
                self.created = false;
                mux.kill_session(&session)
            }
            _ => Ok(()),
        }
    }

    fn run(&mut self, mux: &mut dyn Multiplexer) -> Result<BuildOutcome> {
        self.transition(BuildState::SessionResolution);
        let name = self.config.session_name.clone();

        if let Some(existing) = mux.find_session(&name)? {
            self.session = Some(existing.clone());
            return match self.existing {
                ExistingSessionPolicy::Reattach => {
                    log::info!("session '{name}' exists, reattaching");
                    self.plugins.reattach(mux, &existing)?;
                    self.transition(BuildState::Done);
                    Ok(BuildOutcome::Reattached(existing))
                }
                ExistingSessionPolicy::Fail => Err(Error::SessionExists { name }),
                ExistingSessionPolicy::Append => {
                    log::info!("session '{name}' exists, appending windows");
                    self.plugins.before_workspace_builder(mux, &existing)?;
                    let report = self.construct(mux, &existing, None)?;
                    Ok(BuildOutcome::Appended(report))
                }
            };
        }

        let spec = SessionSpec {
            name,
            window: self.config.windows.first().map(window_spec).unwrap_or_default(),
        };
        let created = mux.create_session(&spec)?;
        self.session = Some(created.session.clone());
        self.created = true;
        let session = created.session;

        let prepared = self
            .plugins
            .before_script(mux, &session)
            .and_then(|()| self.run_before_script());
        if let Err(e) = prepared {
            if let Err(kill) = self.abort(mux) {
                log::warn!("could not kill session '{}': {kill}", session.name);
            }
            return Err(e);
        }

        if let Some(environment) = &self.config.environment {
            for (key, value) in environment {
                mux.set_environment(&session, key, value)?;
            }
        }
        self.plugins.before_workspace_builder(mux, &session)?;
        for (key, value) in &self.config.global_options {
            mux.set_option(OptionScope::Global, key, &value.to_string())?;
        }
        for (key, value) in &self.config.options {
            mux.set_option(OptionScope::Session(&session), key, &value.to_string())?;
        }

        let initial = CreatedWindow {
            window: created.window,
            pane: created.pane,
        };
        let report = self.construct(mux, &session, Some(initial))?;
        Ok(BuildOutcome::Created(report))
    }

    fn run_before_script(&mut self) -> Result<()> {
        let Some(script) = &self.config.before_script else {
            return Ok(());
        };
        let cwd = self.config.start_directory.as_deref().map(Path::new);
        self.scripts.run(script, cwd)
    }

    /// Build every window into `session`. `initial` is the window the
    /// session was created with, adopted as the first one.
    fn construct(
        &mut self,
        mux: &mut dyn Multiplexer,
        session: &SessionRef,
        mut initial: Option<CreatedWindow>,
    ) -> Result<BuildReport> {
        let plan = FocusPlan::resolve(&self.config, self.focus_policy);
        let mut windows = Vec::with_capacity(self.config.windows.len());
        let mut panes: Vec<Vec<PaneRef>> = Vec::with_capacity(self.config.windows.len());

        for (w, window) in self.config.windows.iter().enumerate() {
            advance(&mut self.state, BuildState::WindowConstruction { window: w });
            let created = match initial.take() {
                Some(first) => adopt(mux, first, window)?,
                None => mux.create_window(session, &window_spec(window))?,
            };
            for (key, value) in &window.options {
                mux.set_option(OptionScope::Window(&created.window), key, &value.to_string())?;
            }
            self.plugins.on_window_create(mux, &created.window)?;

            let mut pane_refs: Vec<PaneRef> = Vec::with_capacity(window.panes.len());
            for (p, pane) in window.panes.iter().enumerate() {
                advance(&mut self.state, BuildState::PaneConstruction { window: w, pane: p });
                let pane_ref = match pane_refs.last() {
                    None => created.pane.clone(),
                    Some(previous) => {
                        let pane_ref =
                            mux.split_window(&created.window, previous, &pane_spec(pane, None))?;
                        if let Some(layout) = &window.layout {
                            mux.select_layout(&created.window, layout)?;
                        }
                        pane_ref
                    }
                };

                advance(&mut self.state, BuildState::CommandExecution { window: w, pane: p });
                send_commands(mux, &mut *self.sleep, &pane_ref, pane)?;
                pane_refs.push(pane_ref);
            }
            if let Some(layout) = &window.layout {
                mux.select_layout(&created.window, layout)?;
            }

            advance(&mut self.state, BuildState::OptionsApplication { window: w });
            for (key, value) in &window.options_after {
                mux.set_option(OptionScope::Window(&created.window), key, &value.to_string())?;
            }
            self.plugins.after_window_finished(mux, &created.window)?;

            windows.push(created.window);
            panes.push(pane_refs);
        }

        advance(&mut self.state, BuildState::FocusResolution);
        for (w, pane) in plan.panes.iter().enumerate() {
            if let Some(pane) = pane.and_then(|p| panes.get(w).and_then(|refs| refs.get(p))) {
                mux.select_pane(pane)?;
            }
        }
        let focus = match plan.target() {
            Some((w, p)) => match windows.get(w) {
                Some(window) => {
                    mux.select_window(window)?;
                    Some(FocusTarget {
                        window: window.clone(),
                        pane: p.and_then(|p| panes.get(w).and_then(|refs| refs.get(p)).cloned()),
                    })
                }
                None => None,
            },
            None => None,
        };
        advance(&mut self.state, BuildState::Done);

        Ok(BuildReport {
            session: session.clone(),
            windows,
            focus,
        })
    }

    fn transition(&mut self, next: BuildState) {
        advance(&mut self.state, next);
    }
}

impl fmt::Debug for WorkspaceBuilder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkspaceBuilder")
            .field("session_name", &self.config.session_name)
            .field("state", &self.state)
            .field("existing", &self.existing)
            .field("focus_policy", &self.focus_policy)
            .field("plugins", &self.plugins)
            .finish_non_exhaustive()
    }
}

fn advance(state: &mut BuildState, next: BuildState) {
    debug_assert!(
        state.can_advance_to(next),
        "invalid build transition {state} -> {next}"
    );
    log::debug!("build: {state} -> {next}");
    *state = next;
}

/// Take over the session's initial window, moving it when the workspace
/// asks for another index.
fn adopt(
    mux: &mut dyn Multiplexer,
    first: CreatedWindow,
    window: &WindowConfig,
) -> Result<CreatedWindow> {
    match window.window_index {
        Some(index) if index != first.window.index => Ok(CreatedWindow {
            window: mux.move_window(&first.window, index)?,
            pane: first.pane,
        }),
        _ => Ok(first),
    }
}

fn window_spec(window: &WindowConfig) -> WindowSpec {
    let pane = window
        .panes
        .first()
        .map(|pane| pane_spec(pane, window.window_shell.as_deref()))
        .unwrap_or_default();
    WindowSpec {
        name: window.window_name.clone(),
        index: window.window_index,
        pane,
    }
}

fn pane_spec(pane: &PaneConfig, window_shell: Option<&str>) -> PaneSpec {
    PaneSpec {
        start_directory: pane.start_directory.clone(),
        environment: pane.environment.clone().unwrap_or_default(),
        shell: pane.shell.clone().or_else(|| window_shell.map(str::to_string)),
    }
}

fn send_commands(
    mux: &mut dyn Multiplexer,
    sleep: &mut dyn FnMut(Duration),
    target: &PaneRef,
    pane: &PaneConfig,
) -> Result<()> {
    let mut commands = pane.commands().peekable();
    if commands.peek().is_none() {
        if pane.enter_default() {
            mux.send_keys(target, "", true)?;
        }
        return Ok(());
    }

    let suppress = pane.suppress_history.unwrap_or(false);
    for command in commands {
        pause(sleep, command.sleep_before.or(pane.sleep_before));
        let text = if suppress {
            format!(" {}", command.cmd)
        } else {
            command.cmd.clone()
        };
        let enter = command.enter.unwrap_or_else(|| pane.enter_default());
        mux.send_keys(target, &text, enter)?;
        pause(sleep, command.sleep_after.or(pane.sleep_after));
    }
    Ok(())
}

fn pause(sleep: &mut dyn FnMut(Duration), seconds: Option<f64>) {
    if let Some(seconds) = seconds.filter(|s| s.is_finite() && *s > 0.0) {
        sleep(Duration::from_secs_f64(seconds));
    }
}
