//! teamocil importer.
//!
//! teamocil files come in two incompatible shapes. Before 1.0 a session was
//! wrapped in a `session` key and panes were `splits` running `cmd`:
//!
//! ```yaml
//! session:
//!   name: x
//!   windows:
//!     - name: w
//!       filters: { before: [source .env] }
//!       splits:
//!         - cmd: [a, b]
//! ```
//!
//! From 1.0 on, windows are a flat list and panes are strings or
//! `{commands, focus}` mappings.

use super::{command_values, rename, root_mapping, windows_of};
use crate::error::{Error, Result};
use serde_yaml::{Mapping, Value};

/// Split keys with no canonical counterpart.
const DROPPED_SPLIT_KEYS: [&str; 3] = ["width", "height", "target"];

/// True for the pre-1.0 shape: windows carrying `splits`.
pub fn is_legacy(root: &Mapping) -> bool {
    session_block(root).is_some_and(|session| {
        windows_of(session)
            .iter()
            .any(|w| w.as_mapping().is_some_and(|w| w.contains_key("splits")))
    })
}

/// True for the 1.x shape: windows carrying `name` (alone or with other
/// keys) or `commands` panes, no `splits` and no canonical `session_name`.
pub fn is_modern(root: &Mapping) -> bool {
    if root.contains_key("session_name") || root.contains_key("session") {
        return false;
    }
    let windows: Vec<&Mapping> = windows_of(root).iter().filter_map(Value::as_mapping).collect();
    if windows.is_empty()
        || windows
            .iter()
            .any(|w| w.contains_key("splits") || w.contains_key("window_name"))
    {
        return false;
    }

    windows.iter().any(|w| {
        w.contains_key("name")
            || w.get("panes")
                .and_then(Value::as_sequence)
                .is_some_and(|panes| {
                    panes
                        .iter()
                        .filter_map(Value::as_mapping)
                        .any(|p| p.contains_key("commands"))
                })
    })
}

/// Import either teamocil shape, picking the one that matches.
///
/// # Errors
///
/// Fails like [`import_legacy`] or [`import_modern`].
pub fn import(raw: &Value) -> Result<Value> {
    let root = root_mapping(raw)?;
    if is_legacy(root) {
        import_legacy(raw)
    } else {
        import_modern(raw)
    }
}

/// Import the pre-1.0 shape.
///
/// # Errors
///
/// Returns [`Error::Config`] when the document or a window is not a mapping.
///
/// # Examples
///
/// ```
/// use tmuxload::import::teamocil;
///
/// let raw: serde_yaml::Value = serde_yaml::from_str(
///     "session:\n  name: x\n  windows:\n    - name: w\n      splits:\n        - cmd: [a, b]\n",
/// ).unwrap();
/// let expected: serde_yaml::Value = serde_yaml::from_str(
///     "session_name: x\nwindows:\n  - window_name: w\n    panes:\n      - shell_command: [a, b]\n",
/// ).unwrap();
/// assert_eq!(teamocil::import_legacy(&raw).unwrap(), expected);
/// ```
pub fn import_legacy(raw: &Value) -> Result<Value> {
    let root = root_mapping(raw)?;
    let session = session_block(root).ok_or_else(|| Error::config("session", "must be a mapping"))?;

    let mut out = Mapping::new();
    rename(session, "name", &mut out, "session_name");
    rename(session, "root", &mut out, "start_directory");

    let windows = windows_of(session)
        .iter()
        .enumerate()
        .map(|(i, window)| legacy_window(window, i))
        .collect::<Result<Vec<_>>>()?;
    out.insert("windows".into(), Value::Sequence(windows));
    Ok(Value::Mapping(out))
}

/// Import the 1.x shape.
///
/// # Errors
///
/// Returns [`Error::Config`] when the document or a window is not a mapping.
pub fn import_modern(raw: &Value) -> Result<Value> {
    let root = root_mapping(raw)?;

    let mut out = Mapping::new();
    rename(root, "name", &mut out, "session_name");
    rename(root, "root", &mut out, "start_directory");

    let windows = windows_of(root)
        .iter()
        .enumerate()
        .map(|(i, window)| modern_window(window, i))
        .collect::<Result<Vec<_>>>()?;
    out.insert("windows".into(), Value::Sequence(windows));
    Ok(Value::Mapping(out))
}

/// The `session` wrapper when present, the root otherwise.
fn session_block(root: &Mapping) -> Option<&Mapping> {
    match root.get("session") {
        Some(session) => session.as_mapping(),
        None => Some(root),
    }
}

fn legacy_window(window: &Value, index: usize) -> Result<Value> {
    let window = window
        .as_mapping()
        .ok_or_else(|| Error::config(format!("windows[{index}]"), "window must be a mapping"))?;

    let mut out = Mapping::new();
    rename(window, "name", &mut out, "window_name");
    rename(window, "root", &mut out, "start_directory");
    rename(window, "layout", &mut out, "layout");

    if let Some(filters) = window.get("filters").and_then(Value::as_mapping) {
        if let Some(before) = filters.get("before") {
            out.insert(
                "shell_command_before".into(),
                Value::Sequence(command_values(before)),
            );
        }
        if let Some(after) = filters.get("after") {
            out.insert(
                "shell_command_after".into(),
                Value::Sequence(command_values(after)),
            );
        }
    }

    if window.contains_key("clear") {
        log::debug!("windows[{index}]: dropping teamocil 'clear'");
    }

    let panes: Vec<Value> = window
        .get("splits")
        .and_then(Value::as_sequence)
        .map(|splits| splits.iter().map(|split| legacy_split(split, index)).collect())
        .unwrap_or_default();
    out.insert("panes".into(), Value::Sequence(panes));
    Ok(Value::Mapping(out))
}

fn legacy_split(split: &Value, window: usize) -> Value {
    let Value::Mapping(split) = split else {
        return split.clone();
    };

    let mut out = Mapping::new();
    if let Some(cmd) = split.get("cmd") {
        out.insert("shell_command".into(), Value::Sequence(command_values(cmd)));
    }
    rename(split, "focus", &mut out, "focus");
    for key in DROPPED_SPLIT_KEYS {
        if split.contains_key(key) {
            log::debug!("windows[{window}]: dropping split '{key}'");
        }
    }
    Value::Mapping(out)
}

fn modern_window(window: &Value, index: usize) -> Result<Value> {
    let window = window
        .as_mapping()
        .ok_or_else(|| Error::config(format!("windows[{index}]"), "window must be a mapping"))?;

    let mut out = Mapping::new();
    rename(window, "name", &mut out, "window_name");
    rename(window, "root", &mut out, "start_directory");
    rename(window, "layout", &mut out, "layout");
    rename(window, "focus", &mut out, "focus");
    rename(window, "options", &mut out, "options");

    let panes: Vec<Value> = window
        .get("panes")
        .and_then(Value::as_sequence)
        .map(|panes| panes.iter().map(modern_pane).collect())
        .unwrap_or_else(|| vec![Value::Null]);
    out.insert("panes".into(), Value::Sequence(panes));
    Ok(Value::Mapping(out))
}

fn modern_pane(pane: &Value) -> Value {
    let Value::Mapping(pane) = pane else {
        return pane.clone();
    };

    let mut out = Mapping::new();
    if let Some(commands) = pane.get("commands") {
        out.insert(
            "shell_command".into(),
            Value::Sequence(command_values(commands)),
        );
    }
    rename(pane, "focus", &mut out, "focus");
    Value::Mapping(out)
}
