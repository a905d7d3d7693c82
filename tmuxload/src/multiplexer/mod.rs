//! The terminal multiplexer seam.
//!
//! The builder drives sessions, windows and panes through the
//! [`Multiplexer`] trait. [`TmuxClient`] talks to a real tmux server;
//! [`MemoryMultiplexer`] keeps everything in memory and records each call,
//! which is what dry runs and tests use.

pub mod memory;
pub mod tmux;

pub use memory::{Call, MemoryMultiplexer};
pub use tmux::TmuxClient;

use crate::config::Environment;
use crate::error::Result;
use crate::version::Version;

/// A live session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionRef {
    /// Server-assigned id (`$1`).
    pub id: String,
    /// Session name.
    pub name: String,
}

/// A live window.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WindowRef {
    /// Server-assigned id (`@3`).
    pub id: String,
    /// Id of the owning session.
    pub session_id: String,
    /// Position in the session.
    pub index: u32,
    /// Window name.
    pub name: String,
}

/// A live pane.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PaneRef {
    /// Server-assigned id (`%7`).
    pub id: String,
    /// Id of the owning window.
    pub window_id: String,
    /// Position in the window.
    pub index: u32,
}

/// What a new pane is spawned with. None of it can change afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaneSpec {
    /// Working directory.
    pub start_directory: Option<String>,
    /// Extra environment variables.
    pub environment: Environment,
    /// Program to run instead of the default shell.
    pub shell: Option<String>,
}

/// What a new window is created with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowSpec {
    /// Window name; the multiplexer picks one when absent.
    pub name: Option<String>,
    /// Explicit index; the lowest free index when absent.
    pub index: Option<u32>,
    /// How the window's first pane is spawned.
    pub pane: PaneSpec,
}

/// What a new session is created with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSpec {
    /// Session name.
    pub name: String,
    /// The session's initial window.
    pub window: WindowSpec,
}

/// A newly created session with its initial window and pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedSession {
    /// The session.
    pub session: SessionRef,
    /// Its first window.
    pub window: WindowRef,
    /// That window's first pane.
    pub pane: PaneRef,
}

/// A newly created window with its first pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedWindow {
    /// The window.
    pub window: WindowRef,
    /// Its first pane.
    pub pane: PaneRef,
}

/// Where an option is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionScope<'a> {
    /// Server-wide (`set-option -g`).
    Global,
    /// One session.
    Session(&'a SessionRef),
    /// One window.
    Window(&'a WindowRef),
}

/// A window as reported by the multiplexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    /// The window.
    pub window: WindowRef,
    /// Current layout, in whatever form the multiplexer reports it.
    pub layout: Option<String>,
}

/// A pane as reported by the multiplexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaneInfo {
    /// The pane.
    pub pane: PaneRef,
    /// Current working directory.
    pub current_path: Option<String>,
    /// Commands known to run in the pane, oldest first.
    pub commands: Vec<String>,
}

/// Operations the builder needs from a terminal multiplexer.
///
/// Every call blocks until the multiplexer has applied it.
pub trait Multiplexer {
    /// Version of the multiplexer server or binary.
    ///
    /// # Errors
    ///
    /// Fails when the multiplexer cannot be queried.
    fn version(&mut self) -> Result<Version>;

    /// Find a session by exact name.
    ///
    /// # Errors
    ///
    /// Fails when the multiplexer cannot be queried.
    fn find_session(&mut self, name: &str) -> Result<Option<SessionRef>>;

    /// Create a detached session.
    ///
    /// # Errors
    ///
    /// Fails when the multiplexer rejects the session.
    fn create_session(&mut self, spec: &SessionSpec) -> Result<CreatedSession>;

    /// Destroy a session and everything in it.
    ///
    /// # Errors
    ///
    /// Fails when the multiplexer rejects the call.
    fn kill_session(&mut self, session: &SessionRef) -> Result<()>;

    /// Rename a session.
    ///
    /// # Errors
    ///
    /// Fails when the multiplexer rejects the call.
    fn rename_session(&mut self, session: &SessionRef, name: &str) -> Result<()>;

    /// Add a window to a session.
    ///
    /// # Errors
    ///
    /// Fails when the multiplexer rejects the window.
    fn create_window(&mut self, session: &SessionRef, spec: &WindowSpec) -> Result<CreatedWindow>;

    /// Destroy a window.
    ///
    /// # Errors
    ///
    /// Fails when the multiplexer rejects the call.
    fn kill_window(&mut self, window: &WindowRef) -> Result<()>;

    /// Move a window to another index of its session.
    ///
    /// # Errors
    ///
    /// Fails when the index is taken or the call is rejected.
    fn move_window(&mut self, window: &WindowRef, index: u32) -> Result<WindowRef>;

    /// Rename a window.
    ///
    /// # Errors
    ///
    /// Fails when the multiplexer rejects the call.
    fn rename_window(&mut self, window: &WindowRef, name: &str) -> Result<()>;

    /// Split `target` to create a new pane in `window`.
    ///
    /// # Errors
    ///
    /// Fails when the multiplexer rejects the split, for example when
    /// there is no room left.
    fn split_window(
        &mut self,
        window: &WindowRef,
        target: &PaneRef,
        spec: &PaneSpec,
    ) -> Result<PaneRef>;

    /// Arrange a window's panes with a named layout.
    ///
    /// # Errors
    ///
    /// Fails when the layout is unknown.
    fn select_layout(&mut self, window: &WindowRef, layout: &str) -> Result<()>;

    /// Set an option.
    ///
    /// # Errors
    ///
    /// Fails when the option or value is rejected.
    fn set_option(&mut self, scope: OptionScope<'_>, key: &str, value: &str) -> Result<()>;

    /// Set a session environment variable.
    ///
    /// # Errors
    ///
    /// Fails when the multiplexer rejects the call.
    fn set_environment(&mut self, session: &SessionRef, key: &str, value: &str) -> Result<()>;

    /// Type `text` into a pane, followed by Enter when `enter` is set.
    ///
    /// # Errors
    ///
    /// Fails when the multiplexer rejects the call.
    fn send_keys(&mut self, pane: &PaneRef, text: &str, enter: bool) -> Result<()>;

    /// Make a window the current one of its session.
    ///
    /// # Errors
    ///
    /// Fails when the multiplexer rejects the call.
    fn select_window(&mut self, window: &WindowRef) -> Result<()>;

    /// Make a pane the active one of its window.
    ///
    /// # Errors
    ///
    /// Fails when the multiplexer rejects the call.
    fn select_pane(&mut self, pane: &PaneRef) -> Result<()>;

    /// Windows of a session, by index.
    ///
    /// # Errors
    ///
    /// Fails when the multiplexer cannot be queried.
    fn list_windows(&mut self, session: &SessionRef) -> Result<Vec<WindowInfo>>;

    /// Panes of a window, by index.
    ///
    /// # Errors
    ///
    /// Fails when the multiplexer cannot be queried.
    fn list_panes(&mut self, window: &WindowRef) -> Result<Vec<PaneInfo>>;
}
