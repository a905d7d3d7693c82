//! Workspace file reading.
//!
//! Turns YAML or JSON text, a file, or an already-built native value into
//! the raw nested mapping the rest of the pipeline works on. Files may pull
//! in other files through a top-level `include` key.

use crate::error::{Error, Result};
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level key naming other workspace files to merge in.
pub const INCLUDE_KEY: &str = "include";

/// Keys whose mappings are merged key-by-key when an include is applied.
const MERGED_MAPPINGS: [&str; 3] = ["environment", "options", "global_options"];

/// Serialization format of a workspace document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML (`.yaml`, `.yml`, and anything unrecognized).
    Yaml,
    /// JSON (`.json`).
    Json,
}

impl ConfigFormat {
    /// Picks the format from a file extension.
    ///
    /// # Examples
    ///
    /// ```
    /// use tmuxload::config::ConfigFormat;
    /// use std::path::Path;
    ///
    /// assert_eq!(ConfigFormat::from_path(Path::new("dev.json")), ConfigFormat::Json);
    /// assert_eq!(ConfigFormat::from_path(Path::new("dev.yml")), ConfigFormat::Yaml);
    /// ```
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }

    /// Preferred file extension for this format.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
        }
    }
}

/// Reads workspace documents into raw mappings.
///
/// # Examples
///
/// ```
/// use tmuxload::config::{ConfigFormat, ConfigReader};
///
/// let raw = ConfigReader::parse_str("session_name: dev\n", ConfigFormat::Yaml, "<memory>").unwrap();
/// assert_eq!(raw["session_name"].as_str(), Some("dev"));
/// ```
pub struct ConfigReader;

impl ConfigReader {
    /// Parse document text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyConfig`] for an empty document and
    /// [`Error::Config`] for malformed syntax or a non-mapping document.
    pub fn parse_str(text: &str, format: ConfigFormat, source_name: &str) -> Result<Value> {
        let blank = text.lines().all(|line| {
            let line = line.trim();
            line.is_empty() || line.starts_with('#') || line == "---"
        });
        if blank {
            return Err(Error::EmptyConfig {
                source_name: source_name.to_string(),
            });
        }

        let value: Value = match format {
            ConfigFormat::Yaml => serde_yaml::from_str(text)
                .map_err(|e| Error::config("", format!("invalid YAML in {source_name}: {e}")))?,
            ConfigFormat::Json => serde_json::from_str(text)
                .map_err(|e| Error::config("", format!("invalid JSON in {source_name}: {e}")))?,
        };

        Self::check_document(value, source_name)
    }

    /// Accept an already-parsed native value.
    ///
    /// # Errors
    ///
    /// Fails like [`ConfigReader::parse_str`] when the value is empty or not
    /// a mapping, or when it cannot be represented as YAML.
    pub fn from_native<T: Serialize>(native: &T, source_name: &str) -> Result<Value> {
        let value = serde_yaml::to_value(native)?;
        Self::check_document(value, source_name)
    }

    /// Read a workspace file and resolve its includes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] when a file cannot be read, plus every
    /// error of [`ConfigReader::parse_str`]. An include cycle is reported as
    /// a [`Error::Config`] at path `include`.
    pub fn read_file(path: &Path) -> Result<Value> {
        let mut stack = Vec::new();
        Self::read_file_inner(path, &mut stack)
    }

    /// Resolve the includes of an in-memory document.
    ///
    /// Relative include paths are resolved against `base_dir`.
    ///
    /// # Errors
    ///
    /// Fails when an included file cannot be read or parsed.
    pub fn resolve_includes(value: Value, base_dir: &Path) -> Result<Value> {
        let mut stack = Vec::new();
        Self::apply_includes(value, base_dir, &mut stack)
    }

    /// Serialize a raw or typed document.
    ///
    /// # Errors
    ///
    /// Fails when the value cannot be serialized.
    pub fn dump<T: Serialize>(value: &T, format: ConfigFormat) -> Result<String> {
        Ok(match format {
            ConfigFormat::Yaml => serde_yaml::to_string(value)?,
            ConfigFormat::Json => {
                let mut text = serde_json::to_string_pretty(value)?;
                text.push('\n');
                text
            }
        })
    }

    fn read_file_inner(path: &Path, stack: &mut Vec<PathBuf>) -> Result<Value> {
        let contents = fs::read_to_string(path).map_err(|e| Error::InvalidPath {
            path: path.to_path_buf(),
            reason: format!("Failed to read workspace file: {e}"),
        })?;

        let source_name = path.display().to_string();
        let value = Self::parse_str(&contents, ConfigFormat::from_path(path), &source_name)?;

        let identity = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        if stack.contains(&identity) {
            return Err(Error::config(
                INCLUDE_KEY,
                format!("include cycle through {source_name}"),
            ));
        }

        stack.push(identity);
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let resolved = Self::apply_includes(value, base_dir, stack);
        stack.pop();
        resolved
    }

    fn apply_includes(value: Value, base_dir: &Path, stack: &mut Vec<PathBuf>) -> Result<Value> {
        let Value::Mapping(mut document) = value else {
            return Ok(value);
        };

        let Some(include) = document.remove(INCLUDE_KEY) else {
            return Ok(Value::Mapping(document));
        };

        let targets: Vec<String> = match include {
            Value::String(s) => vec![s],
            Value::Sequence(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| match item {
                    Value::String(s) => Ok(s),
                    _ => Err(Error::config(
                        format!("{INCLUDE_KEY}[{i}]"),
                        "include entries must be file paths",
                    )),
                })
                .collect::<Result<_>>()?,
            Value::Null => Vec::new(),
            _ => {
                return Err(Error::config(
                    INCLUDE_KEY,
                    "must be a file path or a list of file paths",
                ))
            }
        };

        let mut merged = Mapping::new();
        for target in targets {
            let expanded = shellexpand::tilde(&target).into_owned();
            let path = base_dir.join(expanded);
            log::debug!("including workspace file {}", path.display());
            if let Value::Mapping(included) = Self::read_file_inner(&path, stack)? {
                merged = merge_documents(merged, included);
            }
        }

        Ok(Value::Mapping(merge_documents(merged, document)))
    }

    fn check_document(value: Value, source_name: &str) -> Result<Value> {
        match value {
            Value::Null => Err(Error::EmptyConfig {
                source_name: source_name.to_string(),
            }),
            Value::Mapping(ref m) if m.is_empty() => Err(Error::EmptyConfig {
                source_name: source_name.to_string(),
            }),
            Value::Mapping(_) => Ok(value),
            _ => Err(Error::config("", "workspace must be a mapping")),
        }
    }
}

/// Lay `overlay` on top of `base`.
///
/// Overlay keys win, `windows` sequences are concatenated and the mappings
/// named in [`MERGED_MAPPINGS`] are merged key-by-key.
fn merge_documents(mut base: Mapping, overlay: Mapping) -> Mapping {
    for (key, value) in overlay {
        let name = key.as_str().unwrap_or_default().to_string();
        let merged = match (base.remove(&key), value) {
            (Some(Value::Sequence(mut lower)), Value::Sequence(upper)) if name == "windows" => {
                lower.extend(upper);
                Value::Sequence(lower)
            }
            (Some(Value::Mapping(mut lower)), Value::Mapping(upper))
                if MERGED_MAPPINGS.contains(&name.as_str()) =>
            {
                for (k, v) in upper {
                    lower.insert(k, v);
                }
                Value::Mapping(lower)
            }
            (_, value) => value,
        };
        base.insert(key, merged);
    }
    base
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_parse_yaml() {
        let raw = ConfigReader::parse_str("session_name: a\nwindows: []\n", ConfigFormat::Yaml, "t")
            .unwrap();
        assert_eq!(raw["session_name"].as_str(), Some("a"));
    }

    #[test]
    fn test_parse_json() {
        let raw = ConfigReader::parse_str(
            r#"{"session_name": "a", "windows": [{"panes": ["ls"]}]}"#,
            ConfigFormat::Json,
            "t",
        )
        .unwrap();
        assert_eq!(raw["windows"][0]["panes"][0].as_str(), Some("ls"));
    }

    #[test]
    fn test_empty_documents() {
        for text in ["", "   \n", "# only a comment\n", "~\n", "{}\n"] {
            let err = ConfigReader::parse_str(text, ConfigFormat::Yaml, "t").unwrap_err();
            assert!(
                matches!(err, Error::EmptyConfig { .. }),
                "expected EmptyConfig for {text:?}, got {err}"
            );
        }
    }

    #[test]
    fn test_malformed_yaml_is_config_error() {
        let err = ConfigReader::parse_str("a: [unclosed\n", ConfigFormat::Yaml, "bad.yaml")
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert!(format!("{err}").contains("bad.yaml"));
    }

    #[test]
    fn test_non_mapping_document() {
        let err = ConfigReader::parse_str("- a\n- b\n", ConfigFormat::Yaml, "t").unwrap_err();
        assert_eq!(err.config_path(), Some(""));
    }

    #[test]
    fn test_from_native() {
        let mut native = std::collections::BTreeMap::new();
        native.insert("session_name", "native");
        let raw = ConfigReader::from_native(&native, "<memory>").unwrap();
        assert_eq!(raw["session_name"].as_str(), Some("native"));
    }

    #[test]
    fn test_read_missing_file() {
        let err = ConfigReader::read_file(Path::new("/nonexistent/dev.yaml")).unwrap_err();
        assert!(matches!(err, Error::InvalidPath { .. }));
    }

    #[test]
    fn test_include_merges_beneath() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "base.yaml",
            "session_name: base\nstart_directory: /base\nenvironment:\n  A: '1'\n  B: '1'\nwindows:\n  - window_name: shared\n    panes: [ls]\n",
        );
        let main = write(
            &dir,
            "main.yaml",
            "include: base.yaml\nsession_name: main\nenvironment:\n  B: '2'\nwindows:\n  - window_name: own\n    panes: [vim]\n",
        );

        let raw = ConfigReader::read_file(&main).unwrap();
        assert_eq!(raw["session_name"].as_str(), Some("main"));
        assert_eq!(raw["start_directory"].as_str(), Some("/base"));
        assert_eq!(raw["environment"]["A"].as_str(), Some("1"));
        assert_eq!(raw["environment"]["B"].as_str(), Some("2"));
        let windows = raw["windows"].as_sequence().unwrap();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0]["window_name"].as_str(), Some("shared"));
        assert_eq!(windows[1]["window_name"].as_str(), Some("own"));
        assert!(raw.get(INCLUDE_KEY).is_none());
    }

    #[test]
    fn test_include_list_and_json() {
        let dir = TempDir::new().unwrap();
        write(&dir, "one.json", r#"{"options": {"mouse": true}}"#);
        write(&dir, "two.yaml", "options:\n  status: false\n");
        let main = write(
            &dir,
            "main.yaml",
            "include: [one.json, two.yaml]\nsession_name: s\n",
        );

        let raw = ConfigReader::read_file(&main).unwrap();
        assert_eq!(raw["options"]["mouse"].as_bool(), Some(true));
        assert_eq!(raw["options"]["status"].as_bool(), Some(false));
    }

    #[test]
    fn test_include_cycle_detected() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.yaml", "include: b.yaml\nsession_name: a\n");
        write(&dir, "b.yaml", "include: a.yaml\nsession_name: b\n");

        let err = ConfigReader::read_file(&dir.path().join("a.yaml")).unwrap_err();
        assert_eq!(err.config_path(), Some(INCLUDE_KEY));
    }

    #[test]
    fn test_dump_json_and_yaml() {
        let raw = ConfigReader::parse_str("session_name: a\n", ConfigFormat::Yaml, "t").unwrap();
        let json = ConfigReader::dump(&raw, ConfigFormat::Json).unwrap();
        assert!(json.contains("\"session_name\": \"a\""));
        let yaml = ConfigReader::dump(&raw, ConfigFormat::Yaml).unwrap();
        assert_eq!(yaml.trim(), "session_name: a");
    }
}
