//! In-memory [`Multiplexer`] that records every call.
//!
//! Used by `tmuxload load --dry-run` and by the builder tests. It keeps
//! enough state to answer queries (sessions, windows, panes, the commands
//! typed into each pane) and can be told to fail on a given command.

use std::collections::BTreeMap;
use std::fmt;

use super::{
    CreatedSession, CreatedWindow, Multiplexer, OptionScope, PaneInfo, PaneRef, PaneSpec,
    SessionRef, SessionSpec, WindowInfo, WindowRef, WindowSpec,
};
use crate::config::Environment;
use crate::error::{Error, Result};
use crate::version::Version;

/// Commands that only read state.
const QUERY_COMMANDS: [&str; 4] = ["-V", "list-sessions", "list-windows", "list-panes"];

/// Name given to windows created without one.
const DEFAULT_WINDOW_NAME: &str = "shell";

/// One recorded multiplexer call.
///
/// Displays as the equivalent tmux command line, with targets written as
/// `session:window.pane`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    /// tmux subcommand name.
    pub command: String,
    /// Its arguments.
    pub args: Vec<String>,
}

impl Call {
    fn new(command: &str, args: Vec<String>) -> Self {
        Self {
            command: command.to_string(),
            args,
        }
    }

    /// True for calls that change multiplexer state.
    #[must_use]
    pub fn is_mutation(&self) -> bool {
        !QUERY_COMMANDS.contains(&self.command.as_str())
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tmux {}", self.command)?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

fn quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@%$,+~".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// A pane held by [`MemoryMultiplexer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaneState {
    /// Pane id.
    pub id: String,
    /// Position in the window.
    pub index: u32,
    /// Directory the pane was spawned in.
    pub start_directory: Option<String>,
    /// Environment the pane was spawned with.
    pub environment: Environment,
    /// Program the pane was spawned with.
    pub shell: Option<String>,
    /// Lines submitted with Enter, as typed.
    pub commands: Vec<String>,
    /// Text typed but not yet submitted.
    pub pending: String,
}

/// A window held by [`MemoryMultiplexer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowState {
    /// Window id.
    pub id: String,
    /// Position in the session.
    pub index: u32,
    /// Window name.
    pub name: String,
    /// Last layout selected.
    pub layout: Option<String>,
    /// Window options.
    pub options: BTreeMap<String, String>,
    /// Panes in creation order.
    pub panes: Vec<PaneState>,
    /// Id of the active pane.
    pub active_pane: Option<String>,
}

/// A session held by [`MemoryMultiplexer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    /// Session id.
    pub id: String,
    /// Session name.
    pub name: String,
    /// Windows ordered by index.
    pub windows: Vec<WindowState>,
    /// Session environment.
    pub environment: Environment,
    /// Session options.
    pub options: BTreeMap<String, String>,
    /// Id of the current window.
    pub active_window: Option<String>,
}

impl SessionState {
    /// The window at `index`.
    #[must_use]
    pub fn window(&self, index: u32) -> Option<&WindowState> {
        self.windows.iter().find(|w| w.index == index)
    }

    /// Names of the windows, by index.
    #[must_use]
    pub fn window_names(&self) -> Vec<&str> {
        self.windows.iter().map(|w| w.name.as_str()).collect()
    }
}

#[derive(Debug, Clone)]
struct Failure {
    command: String,
    nth: usize,
}

/// A multiplexer that lives in memory.
///
/// # Examples
///
/// ```
/// use tmuxload::multiplexer::{MemoryMultiplexer, Multiplexer, SessionSpec};
///
/// let mut mux = MemoryMultiplexer::new();
/// let created = mux
///     .create_session(&SessionSpec { name: "dev".into(), ..Default::default() })
///     .unwrap();
/// mux.send_keys(&created.pane, "make", true).unwrap();
///
/// assert_eq!(mux.session("dev").unwrap().windows[0].panes[0].commands, ["make"]);
/// assert_eq!(mux.calls().last().unwrap().to_string(), "tmux send-keys -t dev:0.0 make Enter");
/// ```
#[derive(Debug, Clone)]
pub struct MemoryMultiplexer {
    sessions: Vec<SessionState>,
    global_options: BTreeMap<String, String>,
    calls: Vec<Call>,
    failure: Option<Failure>,
    version: Version,
    next_session: u32,
    next_window: u32,
    next_pane: u32,
}

impl Default for MemoryMultiplexer {
    fn default() -> Self {
        Self {
            sessions: Vec::new(),
            global_options: BTreeMap::new(),
            calls: Vec::new(),
            failure: None,
            version: Version::new(3, 4, 0),
            next_session: 0,
            next_window: 0,
            next_pane: 0,
        }
    }
}

impl MemoryMultiplexer {
    /// An empty server.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `version` as the server version.
    #[must_use]
    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Start with a session called `name` holding one window, without
    /// recording any call.
    #[must_use]
    pub fn with_session(mut self, name: &str) -> Self {
        let spec = SessionSpec {
            name: name.to_string(),
            ..Default::default()
        };
        self.insert_session(&spec);
        self
    }

    /// Fail the first call of `command`.
    #[must_use]
    pub fn fail_on(self, command: &str) -> Self {
        self.fail_on_nth(command, 1)
    }

    /// Fail the `nth` call of `command`, counting from 1.
    #[must_use]
    pub fn fail_on_nth(mut self, command: &str, nth: usize) -> Self {
        self.failure = Some(Failure {
            command: command.to_string(),
            nth,
        });
        self
    }

    /// Every call made so far, including failed ones.
    #[must_use]
    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    /// Calls that change state.
    pub fn mutations(&self) -> impl Iterator<Item = &Call> {
        self.calls.iter().filter(|c| c.is_mutation())
    }

    /// All live sessions.
    #[must_use]
    pub fn sessions(&self) -> &[SessionState] {
        &self.sessions
    }

    /// The live session called `name`.
    #[must_use]
    pub fn session(&self, name: &str) -> Option<&SessionState> {
        self.sessions.iter().find(|s| s.name == name)
    }

    /// Server-wide options.
    #[must_use]
    pub fn global_options(&self) -> &BTreeMap<String, String> {
        &self.global_options
    }

    fn record(&mut self, command: &str, args: Vec<String>) -> Result<()> {
        self.calls.push(Call::new(command, args));
        if let Some(failure) = &self.failure {
            if failure.command == command {
                let seen = self.calls.iter().filter(|c| c.command == command).count();
                if seen == failure.nth {
                    return Err(Error::multiplexer(command, "injected failure"));
                }
            }
        }
        Ok(())
    }

    fn insert_session(&mut self, spec: &SessionSpec) -> CreatedSession {
        let id = format!("${}", self.next_session);
        self.next_session += 1;
        let mut state = SessionState {
            id: id.clone(),
            name: spec.name.clone(),
            windows: Vec::new(),
            environment: Environment::new(),
            options: BTreeMap::new(),
            active_window: None,
        };
        let (window, pane) = self.new_window(&mut state, &spec.window, 0);
        state.active_window = Some(window.id.clone());
        self.sessions.push(state);

        CreatedSession {
            session: SessionRef {
                id,
                name: spec.name.clone(),
            },
            window,
            pane,
        }
    }

    fn new_window(
        &mut self,
        session: &mut SessionState,
        spec: &WindowSpec,
        index: u32,
    ) -> (WindowRef, PaneRef) {
        let window_id = format!("@{}", self.next_window);
        self.next_window += 1;
        let pane = self.new_pane(&spec.pane, 0);
        let name = spec
            .name
            .clone()
            .unwrap_or_else(|| DEFAULT_WINDOW_NAME.to_string());

        let pane_ref = PaneRef {
            id: pane.id.clone(),
            window_id: window_id.clone(),
            index: 0,
        };
        session.windows.push(WindowState {
            id: window_id.clone(),
            index,
            name: name.clone(),
            layout: None,
            options: BTreeMap::new(),
            active_pane: Some(pane.id.clone()),
            panes: vec![pane],
        });
        session.windows.sort_by_key(|w| w.index);

        let window_ref = WindowRef {
            id: window_id,
            session_id: session.id.clone(),
            index,
            name,
        };
        (window_ref, pane_ref)
    }

    fn new_pane(&mut self, spec: &PaneSpec, index: u32) -> PaneState {
        let id = format!("%{}", self.next_pane);
        self.next_pane += 1;
        PaneState {
            id,
            index,
            start_directory: spec.start_directory.clone(),
            environment: spec.environment.clone(),
            shell: spec.shell.clone(),
            commands: Vec::new(),
            pending: String::new(),
        }
    }

    fn session_mut(&mut self, command: &str, id: &str) -> Result<&mut SessionState> {
        self.sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| Error::multiplexer(command, format!("can't find session: {id}")))
    }

    fn window_mut(&mut self, command: &str, id: &str) -> Result<&mut WindowState> {
        self.sessions
            .iter_mut()
            .flat_map(|s| s.windows.iter_mut())
            .find(|w| w.id == id)
            .ok_or_else(|| Error::multiplexer(command, format!("can't find window: {id}")))
    }

    fn pane_mut(&mut self, command: &str, id: &str) -> Result<&mut PaneState> {
        self.sessions
            .iter_mut()
            .flat_map(|s| s.windows.iter_mut())
            .flat_map(|w| w.panes.iter_mut())
            .find(|p| p.id == id)
            .ok_or_else(|| Error::multiplexer(command, format!("can't find pane: {id}")))
    }

    fn session_name(&self, id: &str) -> String {
        self.sessions
            .iter()
            .find(|s| s.id == id)
            .map_or_else(|| id.to_string(), |s| s.name.clone())
    }

    fn window_target(&self, window: &WindowRef) -> String {
        let index = self
            .sessions
            .iter()
            .flat_map(|s| s.windows.iter())
            .find(|w| w.id == window.id)
            .map_or(window.index, |w| w.index);
        format!("{}:{index}", self.session_name(&window.session_id))
    }

    fn pane_target(&self, pane: &PaneRef) -> String {
        for session in &self.sessions {
            for window in &session.windows {
                if window.id == pane.window_id {
                    return format!("{}:{}.{}", session.name, window.index, pane.index);
                }
            }
        }
        pane.id.clone()
    }
}

fn spawn_args(spec: &PaneSpec) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(dir) = &spec.start_directory {
        args.push("-c".to_string());
        args.push(dir.clone());
    }
    for (key, value) in &spec.environment {
        args.push("-e".to_string());
        args.push(format!("{key}={value}"));
    }
    if let Some(shell) = &spec.shell {
        args.push(shell.clone());
    }
    args
}

fn lowest_free_index(session: &SessionState) -> u32 {
    (0..)
        .find(|i| !session.windows.iter().any(|w| w.index == *i))
        .unwrap_or_default()
}

impl Multiplexer for MemoryMultiplexer {
    fn version(&mut self) -> Result<Version> {
        self.record("-V", Vec::new())?;
        Ok(self.version)
    }

    fn find_session(&mut self, name: &str) -> Result<Option<SessionRef>> {
        self.record("list-sessions", Vec::new())?;
        Ok(self.session(name).map(|s| SessionRef {
            id: s.id.clone(),
            name: s.name.clone(),
        }))
    }

    fn create_session(&mut self, spec: &SessionSpec) -> Result<CreatedSession> {
        let mut args = vec!["-d".to_string(), "-s".to_string(), spec.name.clone()];
        if let Some(name) = &spec.window.name {
            args.push("-n".to_string());
            args.push(name.clone());
        }
        args.extend(spawn_args(&spec.window.pane));
        self.record("new-session", args)?;

        if self.session(&spec.name).is_some() {
            return Err(Error::multiplexer(
                "new-session",
                format!("duplicate session: {}", spec.name),
            ));
        }
        Ok(self.insert_session(spec))
    }

    fn kill_session(&mut self, session: &SessionRef) -> Result<()> {
        self.record("kill-session", vec!["-t".to_string(), session.name.clone()])?;
        self.session_mut("kill-session", &session.id)?;
        self.sessions.retain(|s| s.id != session.id);
        Ok(())
    }

    fn rename_session(&mut self, session: &SessionRef, name: &str) -> Result<()> {
        self.record(
            "rename-session",
            vec!["-t".to_string(), session.name.clone(), name.to_string()],
        )?;
        self.session_mut("rename-session", &session.id)?.name = name.to_string();
        Ok(())
    }

    fn create_window(&mut self, session: &SessionRef, spec: &WindowSpec) -> Result<CreatedWindow> {
        let target = match spec.index {
            Some(index) => format!("{}:{index}", self.session_name(&session.id)),
            None => format!("{}:", self.session_name(&session.id)),
        };
        let mut args = vec!["-d".to_string(), "-t".to_string(), target];
        if let Some(name) = &spec.name {
            args.push("-n".to_string());
            args.push(name.clone());
        }
        args.extend(spawn_args(&spec.pane));
        self.record("new-window", args)?;

        let position = self
            .sessions
            .iter()
            .position(|s| s.id == session.id)
            .ok_or_else(|| {
                Error::multiplexer("new-window", format!("can't find session: {}", session.id))
            })?;
        let mut state = self.sessions.remove(position);
        let index = match spec.index {
            Some(index) if state.window(index).is_some() => {
                self.sessions.insert(position, state);
                return Err(Error::multiplexer(
                    "new-window",
                    format!("index {index} in use"),
                ));
            }
            Some(index) => index,
            None => lowest_free_index(&state),
        };
        let (window, pane) = self.new_window(&mut state, spec, index);
        self.sessions.insert(position, state);
        Ok(CreatedWindow { window, pane })
    }

    fn kill_window(&mut self, window: &WindowRef) -> Result<()> {
        let target = self.window_target(window);
        self.record("kill-window", vec!["-t".to_string(), target])?;
        self.window_mut("kill-window", &window.id)?;
        for session in &mut self.sessions {
            session.windows.retain(|w| w.id != window.id);
        }
        self.sessions.retain(|s| !s.windows.is_empty());
        Ok(())
    }

    fn move_window(&mut self, window: &WindowRef, index: u32) -> Result<WindowRef> {
        let source = self.window_target(window);
        let target = format!("{}:{index}", self.session_name(&window.session_id));
        self.record(
            "move-window",
            vec!["-s".to_string(), source, "-t".to_string(), target],
        )?;

        let session = self.session_mut("move-window", &window.session_id)?;
        if session.windows.iter().any(|w| w.index == index && w.id != window.id) {
            return Err(Error::multiplexer(
                "move-window",
                format!("index {index} in use"),
            ));
        }
        let state = session
            .windows
            .iter_mut()
            .find(|w| w.id == window.id)
            .ok_or_else(|| {
                Error::multiplexer("move-window", format!("can't find window: {}", window.id))
            })?;
        state.index = index;
        session.windows.sort_by_key(|w| w.index);

        Ok(WindowRef {
            index,
            ..window.clone()
        })
    }

    fn rename_window(&mut self, window: &WindowRef, name: &str) -> Result<()> {
        let target = self.window_target(window);
        self.record(
            "rename-window",
            vec!["-t".to_string(), target, name.to_string()],
        )?;
        self.window_mut("rename-window", &window.id)?.name = name.to_string();
        Ok(())
    }

    fn split_window(
        &mut self,
        window: &WindowRef,
        target: &PaneRef,
        spec: &PaneSpec,
    ) -> Result<PaneRef> {
        let mut args = vec!["-t".to_string(), self.pane_target(target)];
        args.extend(spawn_args(spec));
        self.record("split-window", args)?;

        let index = u32::try_from(self.window_mut("split-window", &window.id)?.panes.len())
            .map_err(|_| Error::multiplexer("split-window", "no space for new pane"))?;
        let pane = self.new_pane(spec, index);
        let pane_ref = PaneRef {
            id: pane.id.clone(),
            window_id: window.id.clone(),
            index,
        };
        let state = self.window_mut("split-window", &window.id)?;
        state.active_pane = Some(pane.id.clone());
        state.panes.push(pane);
        Ok(pane_ref)
    }

    fn select_layout(&mut self, window: &WindowRef, layout: &str) -> Result<()> {
        let target = self.window_target(window);
        self.record(
            "select-layout",
            vec!["-t".to_string(), target, layout.to_string()],
        )?;
        self.window_mut("select-layout", &window.id)?.layout = Some(layout.to_string());
        Ok(())
    }

    fn set_option(&mut self, scope: OptionScope<'_>, key: &str, value: &str) -> Result<()> {
        match scope {
            OptionScope::Global => {
                self.record(
                    "set-option",
                    vec!["-g".to_string(), key.to_string(), value.to_string()],
                )?;
                self.global_options.insert(key.to_string(), value.to_string());
            }
            OptionScope::Session(session) => {
                self.record(
                    "set-option",
                    vec![
                        "-t".to_string(),
                        session.name.clone(),
                        key.to_string(),
                        value.to_string(),
                    ],
                )?;
                self.session_mut("set-option", &session.id)?
                    .options
                    .insert(key.to_string(), value.to_string());
            }
            OptionScope::Window(window) => {
                let target = self.window_target(window);
                self.record(
                    "set-window-option",
                    vec!["-t".to_string(), target, key.to_string(), value.to_string()],
                )?;
                self.window_mut("set-window-option", &window.id)?
                    .options
                    .insert(key.to_string(), value.to_string());
            }
        }
        Ok(())
    }

    fn set_environment(&mut self, session: &SessionRef, key: &str, value: &str) -> Result<()> {
        self.record(
            "set-environment",
            vec![
                "-t".to_string(),
                session.name.clone(),
                key.to_string(),
                value.to_string(),
            ],
        )?;
        self.session_mut("set-environment", &session.id)?
            .environment
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn send_keys(&mut self, pane: &PaneRef, text: &str, enter: bool) -> Result<()> {
        let mut args = vec!["-t".to_string(), self.pane_target(pane)];
        if !text.is_empty() {
            args.push(text.to_string());
        }
        if enter {
            args.push("Enter".to_string());
        }
        self.record("send-keys", args)?;

        let state = self.pane_mut("send-keys", &pane.id)?;
        state.pending.push_str(text);
        if enter {
            let line = std::mem::take(&mut state.pending);
            if !line.trim().is_empty() {
                state.commands.push(line);
            }
        }
        Ok(())
    }

    fn select_window(&mut self, window: &WindowRef) -> Result<()> {
        let target = self.window_target(window);
        self.record("select-window", vec!["-t".to_string(), target])?;
        self.window_mut("select-window", &window.id)?;
        self.session_mut("select-window", &window.session_id)?.active_window =
            Some(window.id.clone());
        Ok(())
    }

    fn select_pane(&mut self, pane: &PaneRef) -> Result<()> {
        let target = self.pane_target(pane);
        self.record("select-pane", vec!["-t".to_string(), target])?;
        self.pane_mut("select-pane", &pane.id)?;
        self.window_mut("select-pane", &pane.window_id)?.active_pane = Some(pane.id.clone());
        Ok(())
    }

    fn list_windows(&mut self, session: &SessionRef) -> Result<Vec<WindowInfo>> {
        self.record("list-windows", vec!["-t".to_string(), session.name.clone()])?;
        let state = self.session_mut("list-windows", &session.id)?;
        Ok(state
            .windows
            .iter()
            .map(|w| WindowInfo {
                window: WindowRef {
                    id: w.id.clone(),
                    session_id: session.id.clone(),
                    index: w.index,
                    name: w.name.clone(),
                },
                layout: w.layout.clone(),
            })
            .collect())
    }

    fn list_panes(&mut self, window: &WindowRef) -> Result<Vec<PaneInfo>> {
        let target = self.window_target(window);
        self.record("list-panes", vec!["-t".to_string(), target])?;
        let state = self.window_mut("list-panes", &window.id)?;
        Ok(state
            .panes
            .iter()
            .map(|p| PaneInfo {
                pane: PaneRef {
                    id: p.id.clone(),
                    window_id: window.id.clone(),
                    index: p.index,
                },
                current_path: p.start_directory.clone(),
                commands: p.commands.iter().map(|c| c.trim_start().to_string()).collect(),
            })
            .collect())
    }
}
