//! Shorthand expansion.
//!
//! Workspace files may use compact forms that the typed schema does not
//! accept directly. Expansion rewrites them into the canonical nested shape:
//!
//! ```yaml
//! windows:
//!   - editor                 # named window, one blank pane
//!   - logs: tail -f app.log  # named window, one pane, one command
//!   - build: [make, make test]
//!   - window_name: shell
//!     panes:
//!       - git status         # one command
//!       - [cd src, ls]       # one pane, two commands
//!       - blank              # empty pane
//! ```
//!
//! Shapes the expander does not recognize are passed through untouched so
//! that the validator can report them with a path.

use crate::config::schema::WINDOW_KEYS;
use serde_yaml::{Mapping, Value};

/// Pane entries that mean "an empty pane".
pub const BLANK_MARKERS: [&str; 3] = ["", "blank", "pane"];

/// Expands shorthand syntax into the canonical tree.
///
/// # Examples
///
/// ```
/// use tmuxload::config::ShorthandExpander;
///
/// let raw: serde_yaml::Value = serde_yaml::from_str(
///     "session_name: s\nwindows:\n  - editor: [vim, git status]\n",
/// ).unwrap();
/// let expanded = ShorthandExpander::expand(&raw);
///
/// let window = &expanded["windows"][0];
/// assert_eq!(window["window_name"].as_str(), Some("editor"));
/// assert_eq!(window["panes"].as_sequence().unwrap().len(), 1);
/// assert_eq!(window["panes"][0]["shell_command"][1].as_str(), Some("git status"));
/// ```
pub struct ShorthandExpander;

impl ShorthandExpander {
    /// Return an expanded copy of `raw`. The input is left untouched.
    #[must_use]
    pub fn expand(raw: &Value) -> Value {
        let Value::Mapping(session) = raw else {
            return raw.clone();
        };

        let mut out = Mapping::new();
        for (key, value) in session {
            let expanded = match key.as_str() {
                Some("session_name") => stringify_name(value),
                Some("shell_command_before") => command_list(value),
                Some("environment") => stringify_environment(value),
                Some("windows") => match value {
                    Value::Sequence(windows) => {
                        Value::Sequence(windows.iter().map(expand_window).collect())
                    }
                    other => other.clone(),
                },
                _ => value.clone(),
            };
            out.insert(key.clone(), expanded);
        }
        Value::Mapping(out)
    }

    /// Expand a single pane entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use tmuxload::config::ShorthandExpander;
    /// use serde_yaml::Value;
    ///
    /// let pane = ShorthandExpander::expand_pane(&Value::from("blank"));
    /// assert_eq!(pane["shell_command"].as_sequence().unwrap().len(), 0);
    /// ```
    #[must_use]
    pub fn expand_pane(pane: &Value) -> Value {
        match pane {
            Value::Null => blank_pane(),
            Value::String(s) if BLANK_MARKERS.contains(&s.trim()) => blank_pane(),
            Value::String(_) | Value::Number(_) => {
                pane_with(Value::Sequence(vec![stringify_name(pane)]))
            }
            Value::Sequence(commands) => pane_with(Value::Sequence(commands.clone())),
            Value::Mapping(block) => {
                let mut out = Mapping::new();
                for (key, value) in block {
                    let expanded = match key.as_str() {
                        Some("shell_command" | "shell_command_before") => command_list(value),
                        Some("environment") => stringify_environment(value),
                        _ => value.clone(),
                    };
                    out.insert(key.clone(), expanded);
                }
                Value::Mapping(out)
            }
            other => other.clone(),
        }
    }
}

fn expand_window(window: &Value) -> Value {
    match window {
        Value::String(_) | Value::Number(_) => {
            let mut out = Mapping::new();
            out.insert("window_name".into(), stringify_name(window));
            out.insert("panes".into(), Value::Sequence(vec![blank_pane()]));
            Value::Mapping(out)
        }
        Value::Mapping(block) if is_named_window(block) => {
            let Some((name, body)) = block.iter().next() else {
                return window.clone();
            };
            let mut out = Mapping::new();
            out.insert("window_name".into(), stringify_name(name));
            match body {
                Value::Mapping(inner) => {
                    for (key, value) in inner {
                        out.insert(key.clone(), value.clone());
                    }
                    return expand_window_block(&out);
                }
                Value::Sequence(commands) => {
                    let pane = pane_with(Value::Sequence(commands.clone()));
                    out.insert("panes".into(), Value::Sequence(vec![pane]));
                }
                other => {
                    let pane = ShorthandExpander::expand_pane(other);
                    out.insert("panes".into(), Value::Sequence(vec![pane]));
                }
            }
            Value::Mapping(out)
        }
        Value::Mapping(block) => expand_window_block(block),
        other => other.clone(),
    }
}

fn expand_window_block(block: &Mapping) -> Value {
    let mut out = Mapping::new();
    for (key, value) in block {
        let expanded = match key.as_str() {
            Some("window_name") => stringify_name(value),
            Some("shell_command_before" | "shell_command_after") => command_list(value),
            Some("environment") => stringify_environment(value),
            Some("panes") => match value {
                Value::Sequence(panes) => {
                    Value::Sequence(panes.iter().map(ShorthandExpander::expand_pane).collect())
                }
                other => other.clone(),
            },
            _ => value.clone(),
        };
        out.insert(key.clone(), expanded);
    }
    Value::Mapping(out)
}

/// A single-key mapping whose key is not a window field: `{name: body}`.
fn is_named_window(block: &Mapping) -> bool {
    if block.len() != 1 {
        return false;
    }
    block.keys().next().is_some_and(|key| match key {
        Value::String(s) => !WINDOW_KEYS.contains(&s.as_str()),
        Value::Number(_) => true,
        _ => false,
    })
}

fn blank_pane() -> Value {
    pane_with(Value::Sequence(Vec::new()))
}

fn pane_with(commands: Value) -> Value {
    let mut pane = Mapping::new();
    pane.insert("shell_command".into(), commands);
    Value::Mapping(pane)
}

/// `"cmd"` becomes `["cmd"]` and `null` becomes `[]`.
fn command_list(value: &Value) -> Value {
    match value {
        Value::Null => Value::Sequence(Vec::new()),
        Value::String(_) | Value::Number(_) => Value::Sequence(vec![stringify_name(value)]),
        Value::Mapping(_) => Value::Sequence(vec![value.clone()]),
        other => other.clone(),
    }
}

fn stringify_name(value: &Value) -> Value {
    match value {
        Value::Number(n) => Value::String(n.to_string()),
        other => other.clone(),
    }
}

fn stringify_environment(value: &Value) -> Value {
    let Value::Mapping(env) = value else {
        return value.clone();
    };
    let stringified = env
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::Number(n) => Value::String(n.to_string()),
                Value::Bool(b) => Value::String(b.to_string()),
                other => other.clone(),
            };
            (stringify_name(key), value)
        })
        .collect();
    Value::Mapping(stringified)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    fn expand(text: &str) -> Value {
        ShorthandExpander::expand(&yaml(text))
    }

    #[test]
    fn test_string_pane() {
        let out = expand("session_name: s\nwindows:\n  - panes: [htop]\n");
        assert_eq!(out["windows"][0]["panes"][0], yaml("shell_command: [htop]"));
    }

    #[test]
    fn test_blank_markers() {
        let out = expand("session_name: s\nwindows:\n  - panes: [~, '', blank, pane]\n");
        let panes = out["windows"][0]["panes"].as_sequence().unwrap();
        assert_eq!(panes.len(), 4);
        for pane in panes {
            assert_eq!(pane, &yaml("shell_command: []"));
        }
    }

    #[test]
    fn test_list_pane_is_one_pane() {
        let out = expand("session_name: s\nwindows:\n  - panes:\n      - [cd src, ls]\n");
        assert_eq!(
            out["windows"][0]["panes"][0],
            yaml("shell_command: [cd src, ls]")
        );
    }

    #[test]
    fn test_named_window_string() {
        let out = expand("session_name: s\nwindows:\n  - logs: tail -f app.log\n");
        assert_eq!(
            out["windows"][0],
            yaml("window_name: logs\npanes:\n  - shell_command: [tail -f app.log]\n")
        );
    }

    #[test]
    fn test_named_window_list_is_single_pane() {
        let out = expand("session_name: s\nwindows:\n  - editor: [vim, git status]\n");
        assert_eq!(
            out["windows"][0],
            yaml("window_name: editor\npanes:\n  - shell_command: [vim, git status]\n")
        );
    }

    #[test]
    fn test_named_window_with_body() {
        let out = expand(
            "session_name: s\nwindows:\n  - server:\n      layout: tiled\n      panes: [rails s, blank]\n",
        );
        let window = &out["windows"][0];
        assert_eq!(window["window_name"].as_str(), Some("server"));
        assert_eq!(window["layout"].as_str(), Some("tiled"));
        assert_eq!(window["panes"][1], yaml("shell_command: []"));
    }

    #[test]
    fn test_bare_string_window() {
        let out = expand("session_name: s\nwindows: [scratch]\n");
        assert_eq!(
            out["windows"][0],
            yaml("window_name: scratch\npanes:\n  - shell_command: []\n")
        );
    }

    #[test]
    fn test_single_known_key_is_not_a_name() {
        let out = expand("session_name: s\nwindows:\n  - panes: [ls]\n");
        assert!(out["windows"][0].get("window_name").is_none());
    }

    #[test]
    fn test_command_strings_become_lists() {
        let out = expand(
            "session_name: s\nshell_command_before: source .env\nwindows:\n  - shell_command_before: nvm use\n    panes:\n      - shell_command: make\n        shell_command_before: ~\n",
        );
        assert_eq!(out["shell_command_before"], yaml("[source .env]"));
        assert_eq!(out["windows"][0]["shell_command_before"], yaml("[nvm use]"));
        let pane = &out["windows"][0]["panes"][0];
        assert_eq!(pane["shell_command"], yaml("[make]"));
        assert_eq!(pane["shell_command_before"], yaml("[]"));
    }

    #[test]
    fn test_numbers_stringified() {
        let out = expand(
            "session_name: 2024\nenvironment:\n  PORT: 8080\n  DEBUG: true\nwindows:\n  - window_name: 1\n    panes: [ls]\n",
        );
        assert_eq!(out["session_name"].as_str(), Some("2024"));
        assert_eq!(out["environment"]["PORT"].as_str(), Some("8080"));
        assert_eq!(out["environment"]["DEBUG"].as_str(), Some("true"));
        assert_eq!(out["windows"][0]["window_name"].as_str(), Some("1"));
    }

    #[test]
    fn test_unknown_shapes_pass_through() {
        let out = expand("session_name: s\nwindows: 3\n");
        assert_eq!(out["windows"].as_u64(), Some(3));
    }

    #[test]
    fn test_expansion_is_stable() {
        let once = expand("session_name: s\nwindows:\n  - a: [x, y]\n  - b\n");
        assert_eq!(ShorthandExpander::expand(&once), once);
    }
}
