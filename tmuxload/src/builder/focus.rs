//! Which window and pane end up selected.

use crate::config::WorkspaceConfig;
use crate::multiplexer::{PaneRef, WindowRef};

/// How to pick among several `focus: true` marks at the same level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FocusPolicy {
    /// The last mark in document order wins.
    #[default]
    LastWins,
    /// The first mark in document order wins.
    FirstWins,
}

impl FocusPolicy {
    fn pick(self, marked: &[usize]) -> Option<usize> {
        match self {
            Self::LastWins => marked.last().copied(),
            Self::FirstWins => marked.first().copied(),
        }
    }
}

/// Resolved focus, as positions in the workspace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FocusPlan {
    /// The window to select last, if any was marked.
    pub window: Option<usize>,
    /// Per window, the pane to make active in it.
    pub panes: Vec<Option<usize>>,
}

impl FocusPlan {
    /// Resolve the marks of `config` under `policy`.
    ///
    /// A focused pane in an unfocused workspace also makes its window the
    /// one selected. Conflicting marks are logged.
    ///
    /// # Examples
    ///
    /// ```
    /// use tmuxload::builder::{FocusPlan, FocusPolicy};
    /// use tmuxload::config::{PaneConfig, WindowConfig, WorkspaceConfig};
    ///
    /// let focused = PaneConfig { focus: true, ..Default::default() };
    /// let config = WorkspaceConfig {
    ///     session_name: "s".into(),
    ///     windows: vec![
    ///         WindowConfig { panes: vec![PaneConfig::default()], ..Default::default() },
    ///         WindowConfig { panes: vec![PaneConfig::default(), focused], ..Default::default() },
    ///     ],
    ///     ..Default::default()
    /// };
    ///
    /// let plan = FocusPlan::resolve(&config, FocusPolicy::LastWins);
    /// assert_eq!(plan.target(), Some((1, Some(1))));
    /// ```
    #[must_use]
    pub fn resolve(config: &WorkspaceConfig, policy: FocusPolicy) -> Self {
        let panes: Vec<Option<usize>> = config
            .windows
            .iter()
            .enumerate()
            .map(|(w, window)| {
                let marked: Vec<usize> = window
                    .panes
                    .iter()
                    .enumerate()
                    .filter_map(|(p, pane)| pane.focus.then_some(p))
                    .collect();
                if marked.len() > 1 {
                    log::warn!(
                        "window {w} marks {} panes with focus; using {policy:?}",
                        marked.len()
                    );
                }
                policy.pick(&marked)
            })
            .collect();

        let marked_windows: Vec<usize> = config
            .windows
            .iter()
            .enumerate()
            .filter_map(|(w, window)| window.focus.then_some(w))
            .collect();
        if marked_windows.len() > 1 {
            log::warn!(
                "{} windows marked with focus; using {policy:?}",
                marked_windows.len()
            );
        }

        let window = policy.pick(&marked_windows).or_else(|| {
            let with_pane: Vec<usize> = panes
                .iter()
                .enumerate()
                .filter_map(|(w, pane)| pane.map(|_| w))
                .collect();
            if with_pane.len() > 1 {
                log::warn!(
                    "panes focused in {} windows; using {policy:?}",
                    with_pane.len()
                );
            }
            policy.pick(&with_pane)
        });

        Self { window, panes }
    }

    /// The single resolved focus: a window position and, when one of its
    /// panes is marked, that pane's position.
    #[must_use]
    pub fn target(&self) -> Option<(usize, Option<usize>)> {
        self.window
            .map(|w| (w, self.panes.get(w).copied().flatten()))
    }
}

/// Where focus landed after a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusTarget {
    /// The selected window.
    pub window: WindowRef,
    /// Its active pane, when one was marked.
    pub pane: Option<PaneRef>,
}
