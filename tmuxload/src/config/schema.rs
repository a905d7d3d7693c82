//! Canonical workspace schema.
//!
//! These types are the typed form of a fully expanded workspace. All
//! shape-sniffing (shorthand, dialect detection) happens on the raw
//! `serde_yaml::Value` tree before it is converted into these structs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Key-sorted environment variables.
pub type Environment = BTreeMap<String, String>;

/// Key-sorted multiplexer options.
pub type Options = BTreeMap<String, OptionValue>;

/// Keys recognized in a window block.
pub const WINDOW_KEYS: [&str; 13] = [
    "window_name",
    "window_index",
    "start_directory",
    "layout",
    "options",
    "options_after",
    "shell_command_before",
    "shell_command_after",
    "environment",
    "suppress_history",
    "window_shell",
    "focus",
    "panes",
];

/// Keys recognized in a pane block.
pub const PANE_KEYS: [&str; 10] = [
    "shell_command",
    "shell_command_before",
    "start_directory",
    "environment",
    "suppress_history",
    "focus",
    "enter",
    "sleep_before",
    "sleep_after",
    "shell",
];

/// Keys recognized in a command mapping.
pub const COMMAND_KEYS: [&str; 4] = ["cmd", "enter", "sleep_before", "sleep_after"];

/// A complete workspace: one session and its windows.
///
/// # Examples
///
/// ```
/// use tmuxload::config::{PaneConfig, WindowConfig, WorkspaceConfig};
///
/// let workspace = WorkspaceConfig {
///     session_name: "dev".to_string(),
///     start_directory: Some("/srv/app".to_string()),
///     windows: vec![WindowConfig {
///         window_name: Some("editor".to_string()),
///         panes: vec![PaneConfig::with_command("vim")],
///         ..Default::default()
///     }],
///     ..Default::default()
/// };
/// assert_eq!(workspace.pane_count(), 1);
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct WorkspaceConfig {
    /// Session name; also used to find an existing session to reuse.
    pub session_name: String,

    /// Default working directory for every window and pane.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_directory: Option<String>,

    /// Command or script run once before any window is built.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_script: Option<String>,

    /// Session environment, inherited by windows and panes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,

    /// Server-wide options (`set-option -g`).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub global_options: Options,

    /// Session options.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: Options,

    /// Commands run in every pane before its own commands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell_command_before: Option<Vec<CommandSpec>>,

    /// Default for every pane's `suppress_history`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suppress_history: Option<bool>,

    /// Socket name (`tmux -L`) to build against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket_name: Option<String>,

    /// Names of registered plugins to run during the build.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plugins: Vec<String>,

    /// Windows, built in order.
    #[serde(default)]
    pub windows: Vec<WindowConfig>,
}

impl WorkspaceConfig {
    /// Total number of panes across all windows.
    #[must_use]
    pub fn pane_count(&self) -> usize {
        self.windows.iter().map(|w| w.panes.len()).sum()
    }
}

/// One window of a workspace.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct WindowConfig {
    /// Window name; the multiplexer names the window when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_name: Option<String>,

    /// Explicit window index; lowest unused index when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_index: Option<u32>,

    /// Default working directory for the window's panes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_directory: Option<String>,

    /// Named layout token (`main-vertical`, `tiled`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,

    /// Window options applied before panes are created.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: Options,

    /// Window options applied once all panes exist.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options_after: Options,

    /// Commands run in every pane of this window before its own commands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell_command_before: Option<Vec<CommandSpec>>,

    /// Carried over from imported workspaces. The builder does not run it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell_command_after: Option<Vec<CommandSpec>>,

    /// Window environment, inherited by panes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,

    /// Default for the window's panes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suppress_history: Option<bool>,

    /// Program started in the window's first pane instead of the default shell.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_shell: Option<String>,

    /// Select this window once the build is done.
    #[serde(default, skip_serializing_if = "is_false")]
    pub focus: bool,

    /// Panes, created in order.
    #[serde(default)]
    pub panes: Vec<PaneConfig>,
}

/// One pane of a window.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct PaneConfig {
    /// Commands sent to the pane. Empty means a single empty carriage return.
    #[serde(default)]
    pub shell_command: Vec<CommandSpec>,

    /// Commands sent before `shell_command`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell_command_before: Option<Vec<CommandSpec>>,

    /// Working directory, fixed when the pane is spawned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_directory: Option<String>,

    /// Environment, fixed when the pane is spawned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,

    /// Prefix commands with a space so the shell keeps them out of history.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suppress_history: Option<bool>,

    /// Select this pane once the build is done.
    #[serde(default, skip_serializing_if = "is_false")]
    pub focus: bool,

    /// Whether commands are terminated with Enter. Defaults to true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enter: Option<bool>,

    /// Default delay in seconds before each command.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep_before: Option<f64>,

    /// Default delay in seconds after each command.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep_after: Option<f64>,

    /// Program started in the pane instead of the default shell.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,
}

impl PaneConfig {
    /// A pane that runs a single command.
    ///
    /// # Examples
    ///
    /// ```
    /// use tmuxload::config::PaneConfig;
    ///
    /// let pane = PaneConfig::with_command("htop");
    /// assert_eq!(pane.shell_command[0].cmd, "htop");
    /// ```
    #[must_use]
    pub fn with_command(cmd: impl Into<String>) -> Self {
        Self {
            shell_command: vec![CommandSpec::new(cmd)],
            ..Default::default()
        }
    }

    /// Whether commands end with Enter unless a command overrides it.
    #[must_use]
    pub fn enter_default(&self) -> bool {
        self.enter.unwrap_or(true)
    }

    /// `shell_command_before` followed by `shell_command`.
    pub fn commands(&self) -> impl Iterator<Item = &CommandSpec> {
        self.shell_command_before
            .iter()
            .flatten()
            .chain(self.shell_command.iter())
    }
}

/// A single command sent to a pane.
///
/// Authored either as a plain string or as a mapping with overrides:
///
/// ```yaml
/// shell_command:
///   - git pull
///   - cmd: ./server
///     sleep_before: 2
///     enter: false
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(from = "CommandRepr", into = "CommandRepr")]
pub struct CommandSpec {
    /// Literal command text.
    pub cmd: String,
    /// Overrides the pane's `enter`.
    pub enter: Option<bool>,
    /// Seconds to block before sending.
    pub sleep_before: Option<f64>,
    /// Seconds to block after sending.
    pub sleep_after: Option<f64>,
}

impl CommandSpec {
    /// A command with no overrides.
    #[must_use]
    pub fn new(cmd: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            ..Default::default()
        }
    }

    fn is_plain(&self) -> bool {
        self.enter.is_none() && self.sleep_before.is_none() && self.sleep_after.is_none()
    }
}

impl From<&str> for CommandSpec {
    fn from(cmd: &str) -> Self {
        Self::new(cmd)
    }
}

#[derive(Deserialize, Serialize)]
#[serde(untagged)]
enum CommandRepr {
    Plain(String),
    Detailed {
        cmd: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        enter: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sleep_before: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sleep_after: Option<f64>,
    },
}

impl From<CommandRepr> for CommandSpec {
    fn from(repr: CommandRepr) -> Self {
        match repr {
            CommandRepr::Plain(cmd) => Self::new(cmd),
            CommandRepr::Detailed {
                cmd,
                enter,
                sleep_before,
                sleep_after,
            } => Self {
                cmd,
                enter,
                sleep_before,
                sleep_after,
            },
        }
    }
}

impl From<CommandSpec> for CommandRepr {
    fn from(spec: CommandSpec) -> Self {
        if spec.is_plain() {
            Self::Plain(spec.cmd)
        } else {
            Self::Detailed {
                cmd: spec.cmd,
                enter: spec.enter,
                sleep_before: spec.sleep_before,
                sleep_after: spec.sleep_after,
            }
        }
    }
}

/// A scalar option value.
///
/// Booleans are sent to the multiplexer as `on`/`off`.
///
/// # Examples
///
/// ```
/// use tmuxload::config::OptionValue;
///
/// assert_eq!(OptionValue::Bool(true).to_string(), "on");
/// assert_eq!(OptionValue::Integer(50000).to_string(), "50000");
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum OptionValue {
    /// `on` / `off`.
    Bool(bool),
    /// Integer value.
    Integer(i64),
    /// Floating point value.
    Float(f64),
    /// Any other string.
    String(String),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(true) => write!(f, "on"),
            Self::Bool(false) => write!(f, "off"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(value: &bool) -> bool {
    !*value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_workspace() {
        let yaml = "session_name: dev\nwindows:\n  - panes:\n      - shell_command: [vim]\n";
        let config: WorkspaceConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.session_name, "dev");
        assert_eq!(config.windows.len(), 1);
        assert_eq!(config.windows[0].panes[0].shell_command[0].cmd, "vim");
        assert!(!config.windows[0].focus);
    }

    #[test]
    fn test_unknown_top_level_keys_ignored() {
        let yaml = "session_name: dev\nfuture_key: 1\nwindows: []\n";
        let config: WorkspaceConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.session_name, "dev");
    }

    #[test]
    fn test_command_spec_forms() {
        let yaml = "- ls\n- cmd: ./server\n  sleep_before: 2\n  enter: false\n";
        let commands: Vec<CommandSpec> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(commands[0], CommandSpec::new("ls"));
        assert_eq!(commands[1].cmd, "./server");
        assert_eq!(commands[1].sleep_before, Some(2.0));
        assert_eq!(commands[1].enter, Some(false));
    }

    #[test]
    fn test_plain_command_serializes_as_string() {
        let yaml = serde_yaml::to_string(&vec![CommandSpec::new("ls")]).unwrap();
        assert_eq!(yaml.trim(), "- ls");
    }

    #[test]
    fn test_detailed_command_serializes_as_mapping() {
        let spec = CommandSpec {
            cmd: "make".to_string(),
            enter: Some(false),
            ..Default::default()
        };
        let value = serde_yaml::to_value(&spec).unwrap();
        assert_eq!(value["cmd"].as_str(), Some("make"));
        assert_eq!(value["enter"].as_bool(), Some(false));
        assert!(value.get("sleep_before").is_none());
    }

    #[test]
    fn test_option_values() {
        let yaml = "mouse: true\nhistory-limit: 5000\nstatus-left: '#S'\n";
        let options: Options = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(options["mouse"], OptionValue::Bool(true));
        assert_eq!(options["history-limit"], OptionValue::Integer(5000));
        assert_eq!(options["status-left"].to_string(), "#S");
        assert_eq!(OptionValue::Bool(false).to_string(), "off");
    }

    #[test]
    fn test_pane_commands_chain_before_first() {
        let pane = PaneConfig {
            shell_command: vec!["vim".into()],
            shell_command_before: Some(vec!["source .env".into()]),
            ..Default::default()
        };
        let cmds: Vec<&str> = pane.commands().map(|c| c.cmd.as_str()).collect();
        assert_eq!(cmds, ["source .env", "vim"]);
        assert!(pane.enter_default());
    }

    #[test]
    fn test_serialization_skips_defaults() {
        let config = WorkspaceConfig {
            session_name: "s".to_string(),
            windows: vec![WindowConfig {
                panes: vec![PaneConfig::default()],
                ..Default::default()
            }],
            ..Default::default()
        };
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(!yaml.contains("focus"));
        assert!(!yaml.contains("plugins"));
        assert!(!yaml.contains("start_directory"));
    }
}
