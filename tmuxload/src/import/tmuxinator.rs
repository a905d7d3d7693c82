//! tmuxinator importer.
//!
//! ```yaml
//! name: blog
//! root: ~/code/blog
//! pre: docker compose up -d
//! pre_window: rbenv shell 2.0.0
//! startup_window: editor
//! windows:
//!   - editor: vim
//!   - server:
//!       layout: main-vertical
//!       panes:
//!         - rails s
//!         - logs: tail -f log/development.log
//! ```

use super::{command_values, rename, root_mapping, windows_of};
use crate::error::{Error, Result};
use serde_yaml::{Mapping, Value};

/// Root keys that only tmuxinator uses.
const SIGNATURE_KEYS: [&str; 14] = [
    "project_name",
    "project_root",
    "tabs",
    "pre",
    "pre_window",
    "pre_tab",
    "rbenv",
    "rvm",
    "tmux_options",
    "tmux_command",
    "cli_args",
    "startup_window",
    "startup_pane",
    "on_project_start",
];

/// Window keys of the other formats; a single-key window using one of them
/// is not a tmuxinator hash-keyed window.
const FOREIGN_WINDOW_KEYS: [&str; 10] = [
    "name",
    "window_name",
    "panes",
    "splits",
    "layout",
    "root",
    "focus",
    "options",
    "commands",
    "filters",
];

/// True when `root` uses tmuxinator-only keys or hash-keyed windows.
pub fn matches(root: &Mapping) -> bool {
    if root.contains_key("session_name") {
        return false;
    }
    if SIGNATURE_KEYS.iter().any(|key| root.contains_key(*key)) {
        return true;
    }
    windows(root).iter().any(|window| {
        window.as_mapping().is_some_and(|w| {
            w.len() == 1
                && w.keys().next().is_some_and(|key| {
                    key.as_str()
                        .map_or(key.is_number(), |k| !FOREIGN_WINDOW_KEYS.contains(&k))
                })
        })
    })
}

/// Import a tmuxinator project.
///
/// Session-level `pre` and `pre_window` (or its old name `pre_tab`) are
/// both kept, in that order, in the session's `shell_command_before`,
/// followed by the `rbenv`/`rvm` switch when one is given.
///
/// # Errors
///
/// Returns [`Error::Config`] when a window is not a single-key mapping.
///
/// # Examples
///
/// ```
/// use tmuxload::import::tmuxinator;
///
/// let raw: serde_yaml::Value = serde_yaml::from_str(
///     "name: y\nwindows:\n  - editor: [vim, git status]\n",
/// ).unwrap();
/// let expected: serde_yaml::Value = serde_yaml::from_str(
///     "session_name: y\nwindows:\n  - window_name: editor\n    panes:\n      - shell_command: [vim, git status]\n",
/// ).unwrap();
/// assert_eq!(tmuxinator::import(&raw).unwrap(), expected);
/// ```
pub fn import(raw: &Value) -> Result<Value> {
    let root = root_mapping(raw)?;
    let mut out = Mapping::new();

    rename(root, "name", &mut out, "session_name");
    rename(root, "project_name", &mut out, "session_name");
    rename(root, "root", &mut out, "start_directory");
    rename(root, "project_root", &mut out, "start_directory");

    if let Some(socket) = socket_name(root) {
        out.insert("socket_name".into(), Value::String(socket));
    }

    let before = shell_command_before(root);
    if !before.is_empty() {
        out.insert("shell_command_before".into(), Value::Sequence(before));
    }

    let mut windows = windows(root)
        .iter()
        .enumerate()
        .map(|(i, window)| import_window(window, i))
        .collect::<Result<Vec<_>>>()?;
    apply_startup_focus(root, &mut windows);
    out.insert("windows".into(), Value::Sequence(windows));

    Ok(Value::Mapping(out))
}

/// `tabs` is the pre-1.0 spelling of `windows`.
fn windows(root: &Mapping) -> &[Value] {
    match root.get("tabs").and_then(Value::as_sequence) {
        Some(tabs) => tabs,
        None => windows_of(root),
    }
}

fn socket_name(root: &Mapping) -> Option<String> {
    if let Some(name) = root.get("socket_name").and_then(Value::as_str) {
        return Some(name.to_string());
    }
    ["tmux_options", "cli_args"]
        .iter()
        .filter_map(|key| root.get(*key).and_then(Value::as_str))
        .find_map(socket_from_args)
}

/// The argument of `-L` in a tmux command line.
fn socket_from_args(args: &str) -> Option<String> {
    let mut tokens = args.split_whitespace();
    while let Some(token) = tokens.next() {
        if token == "-L" {
            return tokens.next().map(str::to_string);
        }
        if let Some(name) = token.strip_prefix("-L") {
            return Some(name.to_string());
        }
    }
    None
}

fn shell_command_before(root: &Mapping) -> Vec<Value> {
    let mut before = Vec::new();
    if let Some(pre) = root.get("pre") {
        before.extend(command_values(pre));
    }
    if let Some(pre_window) = root.get("pre_window").or_else(|| root.get("pre_tab")) {
        before.extend(command_values(pre_window));
    }
    if let Some(version) = root.get("rbenv").and_then(scalar_text) {
        before.push(Value::String(format!("rbenv shell {version}")));
    }
    if let Some(version) = root.get("rvm").and_then(scalar_text) {
        before.push(Value::String(format!("rvm use {version}")));
    }
    before
}

fn import_window(window: &Value, index: usize) -> Result<Value> {
    let (name, body) = window
        .as_mapping()
        .filter(|w| w.len() == 1)
        .and_then(|w| w.iter().next())
        .ok_or_else(|| {
            Error::config(
                format!("windows[{index}]"),
                "tmuxinator window must be a single-key mapping",
            )
        })?;

    let mut out = Mapping::new();
    out.insert(
        "window_name".into(),
        scalar_text(name).map_or(Value::Null, Value::String),
    );

    let panes = match body {
        Value::Mapping(block) => {
            rename(block, "root", &mut out, "start_directory");
            rename(block, "layout", &mut out, "layout");
            if let Some(pre) = block.get("pre") {
                out.insert(
                    "shell_command_before".into(),
                    Value::Sequence(command_values(pre)),
                );
            }
            synchronize(block, &mut out);
            block
                .get("panes")
                .and_then(Value::as_sequence)
                .map_or_else(|| vec![blank_pane()], |panes| panes.iter().map(import_pane).collect())
        }
        Value::Sequence(commands) => vec![pane_with(commands.clone())],
        Value::Null => vec![blank_pane()],
        other => vec![other.clone()],
    };
    out.insert("panes".into(), Value::Sequence(panes));
    Ok(Value::Mapping(out))
}

/// `synchronize: true | after` turns pane synchronization on once panes
/// exist, `before` turns it on before they are created.
fn synchronize(block: &Mapping, out: &mut Mapping) {
    let key = match block.get("synchronize") {
        Some(Value::Bool(true)) => "options_after",
        Some(Value::String(s)) if s == "after" => "options_after",
        Some(Value::String(s)) if s == "before" => "options",
        _ => return,
    };
    let mut options = Mapping::new();
    options.insert("synchronize-panes".into(), Value::Bool(true));
    out.insert(key.into(), Value::Mapping(options));
}

fn import_pane(pane: &Value) -> Value {
    match pane {
        Value::Sequence(commands) => pane_with(commands.clone()),
        Value::Mapping(named) if named.len() == 1 => match named.values().next() {
            Some(Value::Sequence(commands)) => pane_with(commands.clone()),
            Some(value) => value.clone(),
            None => blank_pane(),
        },
        other => other.clone(),
    }
}

fn apply_startup_focus(root: &Mapping, windows: &mut [Value]) {
    let target = match root.get("startup_window") {
        Some(Value::Number(n)) => n.as_u64().and_then(|i| usize::try_from(i).ok()),
        Some(Value::String(name)) => windows
            .iter()
            .position(|w| w.get("window_name").and_then(Value::as_str) == Some(name.as_str())),
        _ => None,
    };
    let Some(window) = target.and_then(|i| windows.get_mut(i)) else {
        return;
    };
    let Value::Mapping(window) = window else {
        return;
    };
    window.insert("focus".into(), Value::Bool(true));

    let pane_index = root
        .get("startup_pane")
        .and_then(Value::as_u64)
        .and_then(|i| usize::try_from(i).ok());
    if let (Some(i), Some(Value::Sequence(panes))) = (pane_index, window.get_mut("panes")) {
        if let Some(pane) = panes.get_mut(i) {
            let mut focused = match std::mem::replace(pane, Value::Null) {
                Value::Mapping(m) => m,
                Value::Null => Mapping::new(),
                other => {
                    let mut m = Mapping::new();
                    m.insert("shell_command".into(), Value::Sequence(vec![other]));
                    m
                }
            };
            focused.insert("focus".into(), Value::Bool(true));
            *pane = Value::Mapping(focused);
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn blank_pane() -> Value {
    pane_with(Vec::new())
}

fn pane_with(commands: Vec<Value>) -> Value {
    let mut pane = Mapping::new();
    pane.insert("shell_command".into(), Value::Sequence(commands));
    Value::Mapping(pane)
}
