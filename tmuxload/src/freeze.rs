//! Export a live session as a workspace.
//!
//! The result is a canonical [`WorkspaceConfig`] that loads back into an
//! equivalent session. Only what the multiplexer reports can be recovered:
//! window names and layouts, pane directories and the commands running in
//! them. Interactive shells are not commands and are left out.

use std::path::Path;

use crate::config::{CommandSpec, PaneConfig, WindowConfig, WorkspaceConfig};
use crate::error::Result;
use crate::multiplexer::{Multiplexer, PaneInfo, SessionRef};

/// Programs treated as a pane's idle shell.
pub const SHELLS: [&str; 10] = [
    "bash", "zsh", "fish", "sh", "dash", "ksh", "tcsh", "csh", "nu", "pwsh",
];

/// Check if `command` is an interactive shell rather than something worth
/// restarting.
///
/// # Examples
///
/// ```
/// use tmuxload::freeze::is_shell;
///
/// assert!(is_shell("zsh"));
/// assert!(is_shell("-bash"));
/// assert!(is_shell("/usr/bin/fish"));
/// assert!(!is_shell("vim"));
/// ```
#[must_use]
pub fn is_shell(command: &str) -> bool {
    let program = command.split_whitespace().next().unwrap_or_default();
    let name = Path::new(program)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(program)
        .trim_start_matches('-');
    SHELLS.contains(&name)
}

/// Read `session` back as a workspace.
///
/// # Errors
///
/// Fails when the multiplexer cannot list the session's windows or panes.
///
/// # Examples
///
/// ```
/// use tmuxload::builder::WorkspaceBuilder;
/// use tmuxload::config::{PaneConfig, WindowConfig, WorkspaceConfig};
/// use tmuxload::freeze;
/// use tmuxload::multiplexer::{MemoryMultiplexer, Multiplexer};
///
/// let config = WorkspaceConfig {
///     session_name: "dev".into(),
///     windows: vec![WindowConfig {
///         window_name: Some("editor".into()),
///         panes: vec![PaneConfig::with_command("vim")],
///         ..Default::default()
///     }],
///     ..Default::default()
/// };
/// let mut mux = MemoryMultiplexer::new();
/// let outcome = WorkspaceBuilder::new(&config).build(&mut mux).unwrap();
///
/// let frozen = freeze::freeze(&mut mux, outcome.session()).unwrap();
/// assert_eq!(frozen.windows[0].window_name.as_deref(), Some("editor"));
/// assert_eq!(frozen.windows[0].panes[0].shell_command[0].cmd, "vim");
/// ```
pub fn freeze(mux: &mut dyn Multiplexer, session: &SessionRef) -> Result<WorkspaceConfig> {
    let mut windows = Vec::new();
    for info in mux.list_windows(session)? {
        let panes = mux.list_panes(&info.window)?;
        let start_directory = panes.first().and_then(|p| p.current_path.clone());
        let panes = panes
            .iter()
            .map(|pane| freeze_pane(pane, start_directory.as_deref()))
            .collect();

        windows.push(WindowConfig {
            window_name: Some(info.window.name),
            layout: info.layout,
            start_directory,
            panes,
            ..Default::default()
        });
    }
    log::debug!("froze session '{}' with {} windows", session.name, windows.len());

    Ok(WorkspaceConfig {
        session_name: session.name.clone(),
        windows,
        ..Default::default()
    })
}

fn freeze_pane(pane: &PaneInfo, window_directory: Option<&str>) -> PaneConfig {
    let start_directory = pane
        .current_path
        .clone()
        .filter(|path| Some(path.as_str()) != window_directory);
    let shell_command = pane
        .commands
        .iter()
        .filter(|command| !is_shell(command))
        .map(CommandSpec::new)
        .collect();
    PaneConfig {
        shell_command,
        start_directory,
        ..Default::default()
    }
}
