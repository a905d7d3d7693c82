//! Importers for foreign workspace dialects.
//!
//! Two other workspace launchers have their own file formats: teamocil
//! (in an older `splits`-based and a newer `commands`-based flavour) and
//! tmuxinator. Each importer is a pure function from the foreign raw tree to
//! a canonical, not yet shorthand-expanded tree.
//!
//! When the caller does not name a dialect, [`detect`] evaluates every
//! signature. Exactly one match selects that importer; more than one is an
//! [`Error::ImportFormat`] rather than a guess. With no match the document is
//! taken as canonical when it has a `session_name` or `window_name`-keyed
//! windows.
//!
//! # Examples
//!
//! ```
//! use tmuxload::import::{self, Dialect};
//!
//! let raw: serde_yaml::Value = serde_yaml::from_str(
//!     "name: y\nwindows:\n  - editor: [vim, git status]\n",
//! ).unwrap();
//! assert_eq!(import::detect(&raw).verdict().unwrap(), Dialect::Tmuxinator);
//!
//! let canonical = import::import(&raw, None).unwrap();
//! assert_eq!(canonical["session_name"].as_str(), Some("y"));
//! ```

pub mod teamocil;
pub mod tmuxinator;

use crate::error::{Error, Result};
use serde_yaml::{Mapping, Value};
use std::fmt;
use std::str::FromStr;

/// A workspace file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// This crate's own format.
    Canonical,
    /// teamocil before 1.0: `session` wrapper, `splits`, `cmd`, `filters`.
    TeamocilLegacy,
    /// teamocil 1.x: flat `windows` with `commands`, `focus`, `options`.
    TeamocilModern,
    /// tmuxinator: `project_name`, `tabs`, `pre`, hash-keyed windows.
    Tmuxinator,
}

impl Dialect {
    /// All dialects, canonical first.
    pub const ALL: [Self; 4] = [
        Self::Canonical,
        Self::TeamocilLegacy,
        Self::TeamocilModern,
        Self::Tmuxinator,
    ];

    /// Stable name, accepted back by [`FromStr`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Canonical => "canonical",
            Self::TeamocilLegacy => "teamocil-legacy",
            Self::TeamocilModern => "teamocil-modern",
            Self::Tmuxinator => "tmuxinator",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::ImportFormat {
                reason: format!("unknown dialect '{s}'"),
            })
    }
}

/// Result of evaluating every dialect signature against a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    matches: Vec<Dialect>,
    canonical_shape: bool,
}

impl Detection {
    /// Foreign dialects whose signature matched, in evaluation order.
    #[must_use]
    pub fn matches(&self) -> &[Dialect] {
        &self.matches
    }

    /// The single dialect to import with.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ImportFormat`] when more than one signature matched,
    /// or when none did and the document does not look canonical either.
    pub fn verdict(&self) -> Result<Dialect> {
        match self.matches.as_slice() {
            [one] => Ok(*one),
            [] if self.canonical_shape => Ok(Dialect::Canonical),
            [] => Err(Error::ImportFormat {
                reason: "document matches no known workspace format".to_string(),
            }),
            many => Err(Error::ImportFormat {
                reason: format!(
                    "document is ambiguous, it matches {}",
                    many.iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(" and ")
                ),
            }),
        }
    }
}

type Signature = fn(&Mapping) -> bool;

/// Signatures in evaluation order.
const SIGNATURES: [(Dialect, Signature); 3] = [
    (Dialect::TeamocilLegacy, teamocil::is_legacy),
    (Dialect::TeamocilModern, teamocil::is_modern),
    (Dialect::Tmuxinator, tmuxinator::matches),
];

/// Evaluate every dialect signature against `raw`.
#[must_use]
pub fn detect(raw: &Value) -> Detection {
    let Value::Mapping(root) = raw else {
        return Detection {
            matches: Vec::new(),
            canonical_shape: false,
        };
    };

    let matches = SIGNATURES
        .iter()
        .filter(|(_, signature)| signature(root))
        .map(|(dialect, _)| *dialect)
        .collect();

    Detection {
        matches,
        canonical_shape: looks_canonical(root),
    }
}

/// Translate `raw` into the canonical tree.
///
/// With `dialect` unset the dialect is detected first.
///
/// # Errors
///
/// Returns [`Error::ImportFormat`] when detection fails and
/// [`Error::Config`] when the document does not fit the dialect.
pub fn import(raw: &Value, dialect: Option<Dialect>) -> Result<Value> {
    let dialect = match dialect {
        Some(dialect) => dialect,
        None => detect(raw).verdict()?,
    };
    log::debug!("importing workspace as {dialect}");

    match dialect {
        Dialect::Canonical => Ok(raw.clone()),
        Dialect::TeamocilLegacy => teamocil::import_legacy(raw),
        Dialect::TeamocilModern => teamocil::import_modern(raw),
        Dialect::Tmuxinator => tmuxinator::import(raw),
    }
}

fn looks_canonical(root: &Mapping) -> bool {
    root.contains_key("session_name")
        || windows_of(root)
            .iter()
            .any(|w| w.as_mapping().is_some_and(|w| w.contains_key("window_name")))
}

/// The `windows` sequence of a mapping, empty when absent.
pub(crate) fn windows_of(block: &Mapping) -> &[Value] {
    block
        .get("windows")
        .and_then(Value::as_sequence)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// A root mapping that is required by every importer.
pub(crate) fn root_mapping(raw: &Value) -> Result<&Mapping> {
    raw.as_mapping()
        .ok_or_else(|| Error::config("", "workspace must be a mapping"))
}

/// Flatten a string, list of strings or null into a command list.
pub(crate) fn command_values(value: &Value) -> Vec<Value> {
    match value {
        Value::Null => Vec::new(),
        Value::Sequence(items) => items.clone(),
        other => vec![other.clone()],
    }
}

/// Copy `from` to `to` under a new key when present.
pub(crate) fn rename(source: &Mapping, from: &str, target: &mut Mapping, to: &str) {
    if let Some(value) = source.get(from) {
        target.insert(to.into(), value.clone());
    }
}
