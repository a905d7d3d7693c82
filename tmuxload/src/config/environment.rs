//! Environment-variable and path substitution.
//!
//! `${VAR}` and `$VAR` references are expanded in a fixed set of fields,
//! from the invoking process's environment at read time. Unset variables
//! are left as written. Pane `shell_command` text is never touched so that
//! shell variables still reach the shell verbatim.
//!
//! Directory-like fields (`start_directory`, `before_script`) also get a
//! leading `~` expanded and a leading `.` resolved against the directory of
//! the workspace file.

use serde_yaml::{Mapping, Value};
use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};

/// Scalar fields substituted at session and window level.
const NAME_FIELDS: [&str; 2] = ["session_name", "window_name"];

/// Option blocks whose string values are substituted.
const OPTION_FIELDS: [&str; 3] = ["global_options", "options", "options_after"];

/// Performs substitution over a shorthand-expanded raw tree.
///
/// # Examples
///
/// ```
/// use tmuxload::config::EnvironmentExpander;
/// use std::path::Path;
///
/// let raw: serde_yaml::Value = serde_yaml::from_str(
///     "session_name: ${PROJECT}\nwindows:\n  - panes:\n      - shell_command: [echo $PROJECT]\n",
/// ).unwrap();
///
/// let expanded = EnvironmentExpander::new(Path::new("/work"))
///     .with_lookup(|name| (name == "PROJECT").then(|| "api".to_string()))
///     .expand(&raw);
///
/// assert_eq!(expanded["session_name"].as_str(), Some("api"));
/// // pane commands are left for the shell
/// assert_eq!(
///     expanded["windows"][0]["panes"][0]["shell_command"][0].as_str(),
///     Some("echo $PROJECT")
/// );
/// ```
pub struct EnvironmentExpander<'a> {
    base_dir: PathBuf,
    lookup: Box<dyn Fn(&str) -> Option<String> + 'a>,
    home: Option<String>,
}

impl<'a> EnvironmentExpander<'a> {
    /// Expander reading the process environment, resolving relative paths
    /// against `base_dir`.
    #[must_use]
    pub fn new(base_dir: &Path) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
            lookup: Box::new(|name| std::env::var(name).ok()),
            home: home::home_dir().map(|p| p.to_string_lossy().into_owned()),
        }
    }

    /// Replace the variable source.
    #[must_use]
    pub fn with_lookup(mut self, lookup: impl Fn(&str) -> Option<String> + 'a) -> Self {
        self.lookup = Box::new(lookup);
        self
    }

    /// Replace the home directory used for `~`.
    #[must_use]
    pub fn with_home(mut self, home: Option<&str>) -> Self {
        self.home = home.map(str::to_string);
        self
    }

    /// Return a substituted copy of `raw`.
    #[must_use]
    pub fn expand(&self, raw: &Value) -> Value {
        let mut value = raw.clone();
        if let Value::Mapping(session) = &mut value {
            self.expand_block(session);
            if let Some(path) = session.get_mut("before_script") {
                self.expand_path(path);
            }
            if let Some(Value::Sequence(windows)) = session.get_mut("windows") {
                for window in windows.iter_mut().filter_map(Value::as_mapping_mut) {
                    self.expand_block(window);
                    if let Some(Value::Sequence(panes)) = window.get_mut("panes") {
                        for pane in panes.iter_mut().filter_map(Value::as_mapping_mut) {
                            self.expand_block(pane);
                        }
                    }
                }
            }
        }
        value
    }

    /// Fields shared by every level of the tree.
    fn expand_block(&self, block: &mut Mapping) {
        for field in NAME_FIELDS {
            if let Some(value) = block.get_mut(field) {
                self.expand_scalar(value);
            }
        }

        if let Some(path) = block.get_mut("start_directory") {
            self.expand_path(path);
        }

        if let Some(Value::Sequence(commands)) = block.get_mut("shell_command_before") {
            for command in commands {
                match command {
                    Value::Mapping(m) => {
                        if let Some(cmd) = m.get_mut("cmd") {
                            self.expand_scalar(cmd);
                        }
                    }
                    other => self.expand_scalar(other),
                }
            }
        }

        for field in OPTION_FIELDS {
            if let Some(Value::Mapping(options)) = block.get_mut(field) {
                for (_, value) in options.iter_mut() {
                    self.expand_scalar(value);
                }
            }
        }
    }

    fn expand_scalar(&self, value: &mut Value) {
        if let Value::String(s) = value {
            if let Cow::Owned(expanded) = self.substitute(s) {
                *s = expanded;
            }
        }
    }

    fn expand_path(&self, value: &mut Value) {
        if let Value::String(s) = value {
            let substituted = self.substitute(s).into_owned();
            let home = self.home.clone();
            let tilded = shellexpand::tilde_with_context(&substituted, || home).into_owned();
            *s = if tilded.starts_with('.') {
                normalize(&self.base_dir.join(&tilded))
                    .to_string_lossy()
                    .into_owned()
            } else {
                tilded
            };
        }
    }

    fn substitute<'s>(&self, input: &'s str) -> Cow<'s, str> {
        shellexpand::env_with_context_no_errors(input, |name| (self.lookup)(name))
    }
}

/// Lexically resolve `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !result.pop() {
                    result.push(component);
                }
            }
            other => result.push(other),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expander(vars: &'static [(&'static str, &'static str)]) -> EnvironmentExpander<'static> {
        EnvironmentExpander::new(Path::new("/configs"))
            .with_home(Some("/home/dev"))
            .with_lookup(move |name| {
                vars.iter()
                    .find(|(k, _)| *k == name)
                    .map(|(_, v)| (*v).to_string())
            })
    }

    fn yaml(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn test_session_fields_substituted() {
        let raw = yaml(
            "session_name: ${NAME}-dev\nbefore_script: $ROOT/setup.sh\nglobal_options:\n  default-shell: $SHELL_BIN\n  mouse: true\nwindows: []\n",
        );
        let out = expander(&[("NAME", "api"), ("ROOT", "/srv"), ("SHELL_BIN", "/bin/zsh")])
            .expand(&raw);
        assert_eq!(out["session_name"].as_str(), Some("api-dev"));
        assert_eq!(out["before_script"].as_str(), Some("/srv/setup.sh"));
        assert_eq!(
            out["global_options"]["default-shell"].as_str(),
            Some("/bin/zsh")
        );
        assert_eq!(out["global_options"]["mouse"].as_bool(), Some(true));
    }

    #[test]
    fn test_unset_variables_left_verbatim() {
        let raw = yaml("session_name: ${MISSING}\nwindows: []\n");
        let out = expander(&[]).expand(&raw);
        assert_eq!(out["session_name"].as_str(), Some("${MISSING}"));
    }

    #[test]
    fn test_window_and_pane_fields() {
        let raw = yaml(
            "session_name: s\nwindows:\n  - window_name: $W\n    start_directory: ~/code\n    shell_command_before:\n      - source $ENVFILE\n      - cmd: cd $W\n    options_after:\n      synchronize-panes: $SYNC\n    panes:\n      - start_directory: ./sub\n        shell_command: [echo $W]\n",
        );
        let out = expander(&[("W", "logs"), ("ENVFILE", ".envrc"), ("SYNC", "on")]).expand(&raw);
        let window = &out["windows"][0];
        assert_eq!(window["window_name"].as_str(), Some("logs"));
        assert_eq!(window["start_directory"].as_str(), Some("/home/dev/code"));
        assert_eq!(
            window["shell_command_before"][0].as_str(),
            Some("source .envrc")
        );
        assert_eq!(
            window["shell_command_before"][1]["cmd"].as_str(),
            Some("cd logs")
        );
        assert_eq!(window["options_after"]["synchronize-panes"].as_str(), Some("on"));
        let pane = &window["panes"][0];
        assert_eq!(pane["start_directory"].as_str(), Some("/configs/sub"));
        assert_eq!(pane["shell_command"][0].as_str(), Some("echo $W"));
    }

    #[test]
    fn test_relative_paths_resolved_against_base() {
        let raw = yaml("session_name: s\nstart_directory: ../proj/./src\nbefore_script: ./boot.sh\n");
        let out = expander(&[]).expand(&raw);
        assert_eq!(out["start_directory"].as_str(), Some("/proj/src"));
        assert_eq!(out["before_script"].as_str(), Some("/configs/boot.sh"));
    }

    #[test]
    fn test_input_not_mutated() {
        let raw = yaml("session_name: $X\n");
        let _ = expander(&[("X", "y")]).expand(&raw);
        assert_eq!(raw["session_name"].as_str(), Some("$X"));
    }

    #[test]
    fn test_environment_values_untouched() {
        let raw = yaml("session_name: s\nenvironment:\n  PATH_EXTRA: $HOME/bin\n");
        let out = expander(&[("HOME", "/h")]).expand(&raw);
        assert_eq!(out["environment"]["PATH_EXTRA"].as_str(), Some("$HOME/bin"));
    }
}
