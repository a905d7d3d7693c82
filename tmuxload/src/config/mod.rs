//! Workspace configuration.
//!
//! A workspace file goes through a fixed pipeline before anything touches
//! the multiplexer:
//!
//! 1. read the document and merge its includes ([`ConfigReader`])
//! 2. translate a foreign dialect ([`crate::import`])
//! 3. expand shorthand ([`ShorthandExpander`])
//! 4. substitute environment variables and paths ([`EnvironmentExpander`])
//! 5. check the raw shape ([`SchemaValidator::check_raw`])
//! 6. convert to the typed tree ([`WorkspaceConfig`])
//! 7. trickle defaults down ([`DefaultsTrickler`])
//! 8. check the typed tree ([`SchemaValidator::validate`])
//!
//! [`WorkspaceLoader`] runs all of it.
//!
//! # Examples
//!
//! ```
//! use tmuxload::config::{ConfigFormat, WorkspaceLoader};
//!
//! let yaml = "
//! session_name: api
//! start_directory: /srv/api
//! windows:
//!   - editor: vim
//!   - window_name: shell
//!     panes: [git status, blank]
//! ";
//!
//! let loaded = WorkspaceLoader::new().load_str(yaml, ConfigFormat::Yaml).unwrap();
//! let config = &loaded.config;
//! assert_eq!(config.windows.len(), 2);
//! assert_eq!(config.windows[1].panes[1].start_directory.as_deref(), Some("/srv/api"));
//! ```

pub mod environment;
pub mod finder;
pub mod reader;
pub mod schema;
pub mod shorthand;
pub mod trickle;
pub mod validator;

#[cfg(test)]
mod proptests;

pub use environment::EnvironmentExpander;
pub use finder::WorkspaceFinder;
pub use reader::{ConfigFormat, ConfigReader};
pub use schema::{
    CommandSpec, Environment, OptionValue, Options, PaneConfig, WindowConfig, WorkspaceConfig,
};
pub use shorthand::ShorthandExpander;
pub use trickle::DefaultsTrickler;
pub use validator::{SchemaValidator, ValidationReport, ValidationWarning};

use crate::error::{Error, Result};
use crate::import::{self, Dialect};
use serde_yaml::Value;
use std::path::{Path, PathBuf};

/// Source name used for in-memory documents.
const MEMORY_SOURCE: &str = "<memory>";

/// A workspace that passed the whole load pipeline.
#[derive(Debug, Clone)]
pub struct LoadedWorkspace {
    /// The canonical, trickled tree.
    pub config: WorkspaceConfig,
    /// Non-fatal validation findings.
    pub report: ValidationReport,
    /// The dialect the document was read as.
    pub dialect: Dialect,
    /// The file it came from, if any.
    pub source: Option<PathBuf>,
}

/// Runs the load pipeline.
///
/// # Examples
///
/// ```
/// use tmuxload::config::{ConfigFormat, WorkspaceLoader};
/// use tmuxload::import::Dialect;
///
/// let loaded = WorkspaceLoader::new()
///     .with_dialect(Dialect::Tmuxinator)
///     .with_env_lookup(|_| None)
///     .load_str("name: blog\nwindows:\n  - editor: vim\n", ConfigFormat::Yaml)
///     .unwrap();
/// assert_eq!(loaded.config.session_name, "blog");
/// ```
#[derive(Default)]
pub struct WorkspaceLoader<'a> {
    dialect: Option<Dialect>,
    strict: bool,
    base_dir: Option<PathBuf>,
    lookup: Option<Box<dyn Fn(&str) -> Option<String> + 'a>>,
}

impl<'a> WorkspaceLoader<'a> {
    /// A loader that detects the dialect and reads the process environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read documents as `dialect` instead of detecting it.
    #[must_use]
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    /// Declare the dialect, or `None` to detect it.
    #[must_use]
    pub fn with_dialect_opt(mut self, dialect: Option<Dialect>) -> Self {
        self.dialect = dialect;
        self
    }

    /// Treat unknown window, pane and command keys as errors.
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Resolve relative paths against `dir`.
    ///
    /// Defaults to the workspace file's directory, or the current directory
    /// for in-memory documents.
    #[must_use]
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Look variables up with `lookup` instead of the process environment.
    #[must_use]
    pub fn with_env_lookup(mut self, lookup: impl Fn(&str) -> Option<String> + 'a) -> Self {
        self.lookup = Some(Box::new(lookup));
        self
    }

    /// Load a workspace file.
    ///
    /// # Errors
    ///
    /// Returns the first error of any pipeline stage.
    pub fn load_path(&self, path: &Path) -> Result<LoadedWorkspace> {
        log::debug!("loading workspace {}", path.display());
        let raw = ConfigReader::read_file(path)?;
        let base_dir = self
            .base_dir
            .clone()
            .or_else(|| path.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));
        self.finish(raw, &base_dir, Some(path.to_path_buf()))
    }

    /// Load document text.
    ///
    /// # Errors
    ///
    /// Returns the first error of any pipeline stage.
    pub fn load_str(&self, text: &str, format: ConfigFormat) -> Result<LoadedWorkspace> {
        let raw = ConfigReader::parse_str(text, format, MEMORY_SOURCE)?;
        self.load_document(raw)
    }

    /// Load an already-parsed document.
    ///
    /// # Errors
    ///
    /// Returns the first error of any pipeline stage.
    pub fn load_value(&self, raw: &Value) -> Result<LoadedWorkspace> {
        let raw = ConfigReader::from_native(raw, MEMORY_SOURCE)?;
        self.load_document(raw)
    }

    /// Run stages 2 to 5 and return the canonical raw tree.
    ///
    /// # Errors
    ///
    /// Fails on import and raw-shape errors.
    pub fn canonicalize(&self, raw: &Value, base_dir: &Path) -> Result<(Value, Dialect)> {
        let dialect = match self.dialect {
            Some(dialect) => dialect,
            None => import::detect(raw).verdict()?,
        };
        let imported = import::import(raw, Some(dialect))?;
        let expanded = ShorthandExpander::expand(&imported);

        let substituted = match &self.lookup {
            Some(lookup) => EnvironmentExpander::new(base_dir)
                .with_lookup(|name| lookup(name))
                .expand(&expanded),
            None => EnvironmentExpander::new(base_dir).expand(&expanded),
        };

        self.validator().check_raw(&substituted)?;
        Ok((substituted, dialect))
    }

    fn load_document(&self, raw: Value) -> Result<LoadedWorkspace> {
        let base_dir = match &self.base_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        };
        let raw = ConfigReader::resolve_includes(raw, &base_dir)?;
        self.finish(raw, &base_dir, None)
    }

    fn finish(&self, raw: Value, base_dir: &Path, source: Option<PathBuf>) -> Result<LoadedWorkspace> {
        let (canonical, dialect) = self.canonicalize(&raw, base_dir)?;

        let mut config: WorkspaceConfig =
            serde_yaml::from_value(canonical).map_err(|e| Error::config("", e.to_string()))?;
        DefaultsTrickler::trickle_in_place(&mut config);

        let report = self.validator().validate(&config)?;
        for warning in report.warnings() {
            log::warn!("{warning}");
        }

        Ok(LoadedWorkspace {
            config,
            report,
            dialect,
            source,
        })
    }

    fn validator(&self) -> SchemaValidator {
        SchemaValidator::new().strict(self.strict)
    }
}
