//! Default inheritance from session to window to pane.
//!
//! Four keys flow downward: `start_directory`, `shell_command_before`,
//! `environment` and `suppress_history`. A child only takes a parent's
//! value when it has none of its own. `environment` is the exception: the
//! parent's variables are unioned in, child keys winning on collision.

use crate::config::schema::{CommandSpec, Environment, PaneConfig, WindowConfig, WorkspaceConfig};

/// Propagates inheritable defaults through a workspace tree.
///
/// # Examples
///
/// ```
/// use tmuxload::config::{DefaultsTrickler, PaneConfig, WindowConfig, WorkspaceConfig};
///
/// let workspace = WorkspaceConfig {
///     session_name: "s".to_string(),
///     start_directory: Some("/a".to_string()),
///     windows: vec![WindowConfig {
///         panes: vec![PaneConfig::default()],
///         ..Default::default()
///     }],
///     ..Default::default()
/// };
///
/// let trickled = DefaultsTrickler::trickle(&workspace);
/// assert_eq!(trickled.windows[0].panes[0].start_directory.as_deref(), Some("/a"));
/// // the input is not modified
/// assert_eq!(workspace.windows[0].panes[0].start_directory, None);
/// ```
pub struct DefaultsTrickler;

impl DefaultsTrickler {
    /// Return a trickled copy of `workspace`.
    #[must_use]
    pub fn trickle(workspace: &WorkspaceConfig) -> WorkspaceConfig {
        let mut result = workspace.clone();
        Self::trickle_in_place(&mut result);
        result
    }

    /// Trickle defaults through `workspace` in place.
    ///
    /// Applying this twice gives the same tree as applying it once.
    pub fn trickle_in_place(workspace: &mut WorkspaceConfig) {
        let session = Inherited::from_workspace(workspace);
        for window in &mut workspace.windows {
            Self::inherit_window(window, &session);
            let defaults = Inherited::from_window(window);
            for pane in &mut window.panes {
                Self::inherit_pane(pane, &defaults);
            }
        }
    }

    fn inherit_window(window: &mut WindowConfig, parent: &Inherited) {
        inherit(&mut window.start_directory, &parent.start_directory);
        inherit(&mut window.shell_command_before, &parent.shell_command_before);
        inherit(&mut window.suppress_history, &parent.suppress_history);
        merge_environment(&mut window.environment, parent.environment.as_ref());
    }

    fn inherit_pane(pane: &mut PaneConfig, parent: &Inherited) {
        inherit(&mut pane.start_directory, &parent.start_directory);
        inherit(&mut pane.shell_command_before, &parent.shell_command_before);
        inherit(&mut pane.suppress_history, &parent.suppress_history);
        merge_environment(&mut pane.environment, parent.environment.as_ref());
    }
}

/// The values a level hands down to its children.
struct Inherited {
    start_directory: Option<String>,
    shell_command_before: Option<Vec<CommandSpec>>,
    suppress_history: Option<bool>,
    environment: Option<Environment>,
}

impl Inherited {
    fn from_workspace(workspace: &WorkspaceConfig) -> Self {
        Self {
            start_directory: workspace.start_directory.clone(),
            shell_command_before: workspace.shell_command_before.clone(),
            suppress_history: workspace.suppress_history,
            environment: workspace.environment.clone(),
        }
    }

    fn from_window(window: &WindowConfig) -> Self {
        Self {
            start_directory: window.start_directory.clone(),
            shell_command_before: window.shell_command_before.clone(),
            suppress_history: window.suppress_history,
            environment: window.environment.clone(),
        }
    }
}

fn inherit<T: Clone>(child: &mut Option<T>, parent: &Option<T>) {
    if child.is_none() {
        child.clone_from(parent);
    }
}

fn merge_environment(child: &mut Option<Environment>, parent: Option<&Environment>) {
    let Some(parent) = parent else {
        return;
    };
    let merged = child.get_or_insert_with(Environment::new);
    for (key, value) in parent {
        merged.entry(key.clone()).or_insert_with(|| value.clone());
    }
}
