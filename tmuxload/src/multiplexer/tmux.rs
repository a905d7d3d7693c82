//! [`Multiplexer`] backed by the `tmux` binary.

use std::path::PathBuf;
use std::process::{Command, Stdio};

use super::{
    CreatedSession, CreatedWindow, Multiplexer, OptionScope, PaneInfo, PaneRef, PaneSpec,
    SessionRef, SessionSpec, WindowInfo, WindowRef, WindowSpec,
};
use crate::error::{Error, Result};
use crate::version::Version;

const SESSION_FORMAT: &str = "#{session_id}\t#{session_name}";
const WINDOW_FORMAT: &str = "#{window_id}\t#{window_index}\t#{window_name}";
const PANE_FORMAT: &str = "#{pane_id}\t#{pane_index}";
const LIST_WINDOWS_FORMAT: &str = "#{window_id}\t#{window_index}\t#{window_name}\t#{window_layout}";
const LIST_PANES_FORMAT: &str =
    "#{pane_id}\t#{pane_index}\t#{pane_current_path}\t#{pane_current_command}";

/// Messages tmux prints when no server is listening on the socket.
const NO_SERVER_MARKERS: [&str; 2] = ["no server running", "error connecting to"];

/// Talks to a tmux server by running `tmux` subcommands.
///
/// # Examples
///
/// ```no_run
/// use tmuxload::multiplexer::{Multiplexer, TmuxClient};
///
/// let mut tmux = TmuxClient::new().with_socket_name(Some("work".into()));
/// let version = tmux.version().unwrap();
/// println!("tmux {version}");
/// ```
#[derive(Debug, Clone)]
pub struct TmuxClient {
    binary: PathBuf,
    socket_name: Option<String>,
    socket_path: Option<PathBuf>,
}

impl Default for TmuxClient {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("tmux"),
            socket_name: None,
            socket_path: None,
        }
    }
}

impl TmuxClient {
    /// A client for the default server, using `tmux` from `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use another tmux binary.
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Talk to the server on socket name `name` (`tmux -L`).
    #[must_use]
    pub fn with_socket_name(mut self, name: Option<String>) -> Self {
        self.socket_name = name;
        self
    }

    /// Talk to the server on socket file `path` (`tmux -S`).
    #[must_use]
    pub fn with_socket_path(mut self, path: Option<PathBuf>) -> Self {
        self.socket_path = path;
        self
    }

    /// A `tmux` command with the socket arguments already applied.
    #[must_use]
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        if let Some(name) = &self.socket_name {
            cmd.arg("-L").arg(name);
        }
        if let Some(path) = &self.socket_path {
            cmd.arg("-S").arg(path);
        }
        cmd
    }

    /// Attach the current terminal to `session`, or switch the current
    /// client to it when already running inside tmux.
    ///
    /// # Errors
    ///
    /// Fails when tmux cannot be started or exits unsuccessfully.
    pub fn attach(&self, session: &SessionRef) -> Result<()> {
        let subcommand = if std::env::var_os("TMUX").is_some() {
            "switch-client"
        } else {
            "attach-session"
        };
        log::debug!("tmux {subcommand} -t {}", session.name);

        let status = self
            .command()
            .args([subcommand, "-t", &session.id])
            .status()
            .map_err(|e| Error::multiplexer(subcommand, e.to_string()))?;
        if status.success() {
            Ok(())
        } else {
            Err(Error::multiplexer(
                subcommand,
                format!("exited with {status}"),
            ))
        }
    }

    /// Run a subcommand and return its trimmed stdout.
    fn run(&self, args: &[&str]) -> Result<String> {
        let name = args.first().copied().unwrap_or("tmux");
        log::debug!("tmux {}", args.join(" "));

        let output = self
            .command()
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Error::multiplexer(name, e.to_string()))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            Err(Error::multiplexer(name, stderr))
        }
    }
}

/// `-c`, `-e` and the trailing shell argument shared by window and pane
/// creation.
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

fn fields<'a>(line: &'a str, command: &str, count: usize) -> Result<Vec<&'a str>> {
    let parts: Vec<&str> = line.split('\t').collect();
    if parts.len() < count {
        return Err(Error::multiplexer(
            command,
            format!("unexpected output: '{line}'"),
        ));
    }
    Ok(parts)
}

fn parse_index(text: &str, command: &str) -> Result<u32> {
    text.parse()
        .map_err(|_| Error::multiplexer(command, format!("invalid index '{text}'")))
}

fn non_empty(text: &str) -> Option<String> {
    (!text.is_empty()).then(|| text.to_string())
}

impl Multiplexer for TmuxClient {
    fn version(&mut self) -> Result<Version> {
        let out = self.run(&["-V"])?;
        out.parse::<Version>()
            .map_err(|e| Error::multiplexer("-V", e.to_string()))
    }

    fn find_session(&mut self, name: &str) -> Result<Option<SessionRef>> {
        let out = match self.run(&["list-sessions", "-F", SESSION_FORMAT]) {
            Ok(out) => out,
            Err(Error::Multiplexer { message, .. })
                if NO_SERVER_MARKERS.iter().any(|m| message.contains(m)) =>
            {
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        for line in out.lines() {
            let parts = fields(line, "list-sessions", 2)?;
            if parts[1] == name {
                return Ok(Some(SessionRef {
                    id: parts[0].to_string(),
                    name: parts[1].to_string(),
                }));
            }
        }
        Ok(None)
    }

    fn create_session(&mut self, spec: &SessionSpec) -> Result<CreatedSession> {
        let format = format!("{SESSION_FORMAT}\t{WINDOW_FORMAT}\t{PANE_FORMAT}");
        let mut args = vec![
            "new-session".to_string(),
            "-d".to_string(),
            "-P".to_string(),
            "-F".to_string(),
            format,
            "-s".to_string(),
            spec.name.clone(),
        ];
        if let Some(name) = &spec.window.name {
            args.push("-n".to_string());
            args.push(name.clone());
        }
        args.extend(spawn_args(&spec.window.pane));

        let argv: Vec<&str> = args.iter().map(String::as_str).collect();
        let out = self.run(&argv)?;
        let parts = fields(&out, "new-session", 7)?;

        let session = SessionRef {
            id: parts[0].to_string(),
            name: parts[1].to_string(),
        };
        let window = WindowRef {
            id: parts[2].to_string(),
            session_id: session.id.clone(),
            index: parse_index(parts[3], "new-session")?,
            name: parts[4].to_string(),
        };
        let pane = PaneRef {
            id: parts[5].to_string(),
            window_id: window.id.clone(),
            index: parse_index(parts[6], "new-session")?,
        };
        Ok(CreatedSession {
            session,
            window,
            pane,
        })
    }

    fn kill_session(&mut self, session: &SessionRef) -> Result<()> {
        self.run(&["kill-session", "-t", &session.id]).map(drop)
    }

    fn rename_session(&mut self, session: &SessionRef, name: &str) -> Result<()> {
        self.run(&["rename-session", "-t", &session.id, name]).map(drop)
    }

    fn create_window(&mut self, session: &SessionRef, spec: &WindowSpec) -> Result<CreatedWindow> {
        let target = match spec.index {
            Some(index) => format!("{}:{index}", session.id),
            None => format!("{}:", session.id),
        };
        let format = format!("{WINDOW_FORMAT}\t{PANE_FORMAT}");
        let mut args = vec![
            "new-window".to_string(),
            "-d".to_string(),
            "-P".to_string(),
            "-F".to_string(),
            format,
            "-t".to_string(),
            target,
        ];
        if let Some(name) = &spec.name {
            args.push("-n".to_string());
            args.push(name.clone());
        }
        args.extend(spawn_args(&spec.pane));

        let argv: Vec<&str> = args.iter().map(String::as_str).collect();
        let out = self.run(&argv)?;
        let parts = fields(&out, "new-window", 5)?;

        let window = WindowRef {
            id: parts[0].to_string(),
            session_id: session.id.clone(),
            index: parse_index(parts[1], "new-window")?,
            name: parts[2].to_string(),
        };
        let pane = PaneRef {
            id: parts[3].to_string(),
            window_id: window.id.clone(),
            index: parse_index(parts[4], "new-window")?,
        };
        Ok(CreatedWindow { window, pane })
    }

    fn kill_window(&mut self, window: &WindowRef) -> Result<()> {
        self.run(&["kill-window", "-t", &window.id]).map(drop)
    }

    fn move_window(&mut self, window: &WindowRef, index: u32) -> Result<WindowRef> {
        let target = format!("{}:{index}", window.session_id);
        self.run(&["move-window", "-s", &window.id, "-t", &target])?;
        Ok(WindowRef {
            index,
            ..window.clone()
        })
    }

    fn rename_window(&mut self, window: &WindowRef, name: &str) -> Result<()> {
        self.run(&["rename-window", "-t", &window.id, name]).map(drop)
    }

    fn split_window(
        &mut self,
        window: &WindowRef,
        target: &PaneRef,
        spec: &PaneSpec,
    ) -> Result<PaneRef> {
        let mut args = vec![
            "split-window".to_string(),
            "-P".to_string(),
            "-F".to_string(),
            PANE_FORMAT.to_string(),
            "-t".to_string(),
            target.id.clone(),
        ];
        args.extend(spawn_args(spec));

        let argv: Vec<&str> = args.iter().map(String::as_str).collect();
        let out = self.run(&argv)?;
        let parts = fields(&out, "split-window", 2)?;
        Ok(PaneRef {
            id: parts[0].to_string(),
            window_id: window.id.clone(),
            index: parse_index(parts[1], "split-window")?,
        })
    }

    fn select_layout(&mut self, window: &WindowRef, layout: &str) -> Result<()> {
        self.run(&["select-layout", "-t", &window.id, layout]).map(drop)
    }

    fn set_option(&mut self, scope: OptionScope<'_>, key: &str, value: &str) -> Result<()> {
        match scope {
            OptionScope::Global => self.run(&["set-option", "-g", key, value]),
            OptionScope::Session(session) => {
                self.run(&["set-option", "-t", &session.id, key, value])
            }
            OptionScope::Window(window) => {
                self.run(&["set-window-option", "-t", &window.id, key, value])
            }
        }
        .map(drop)
    }

    fn set_environment(&mut self, session: &SessionRef, key: &str, value: &str) -> Result<()> {
        self.run(&["set-environment", "-t", &session.id, key, value])
            .map(drop)
    }

    fn send_keys(&mut self, pane: &PaneRef, text: &str, enter: bool) -> Result<()> {
        if !text.is_empty() {
            self.run(&["send-keys", "-t", &pane.id, "-l", "--", text])?;
        }
        if enter {
            self.run(&["send-keys", "-t", &pane.id, "Enter"])?;
        }
        Ok(())
    }

    fn select_window(&mut self, window: &WindowRef) -> Result<()> {
        self.run(&["select-window", "-t", &window.id]).map(drop)
    }

    fn select_pane(&mut self, pane: &PaneRef) -> Result<()> {
        self.run(&["select-pane", "-t", &pane.id]).map(drop)
    }

    fn list_windows(&mut self, session: &SessionRef) -> Result<Vec<WindowInfo>> {
        let out = self.run(&["list-windows", "-t", &session.id, "-F", LIST_WINDOWS_FORMAT])?;
        out.lines()
            .map(|line| {
                let parts = fields(line, "list-windows", 4)?;
                Ok(WindowInfo {
                    window: WindowRef {
                        id: parts[0].to_string(),
                        session_id: session.id.clone(),
                        index: parse_index(parts[1], "list-windows")?,
                        name: parts[2].to_string(),
                    },
                    layout: non_empty(parts[3]),
                })
            })
            .collect()
    }

    fn list_panes(&mut self, window: &WindowRef) -> Result<Vec<PaneInfo>> {
        let out = self.run(&["list-panes", "-t", &window.id, "-F", LIST_PANES_FORMAT])?;
        out.lines()
            .map(|line| {
                let parts = fields(line, "list-panes", 4)?;
                Ok(PaneInfo {
                    pane: PaneRef {
                        id: parts[0].to_string(),
                        window_id: window.id.clone(),
                        index: parse_index(parts[1], "list-panes")?,
                    },
                    current_path: non_empty(parts[2]),
                    commands: non_empty(parts[3]).into_iter().collect(),
                })
            })
            .collect()
    }
}
