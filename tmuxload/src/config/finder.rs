//! Workspace file discovery.
//!
//! A workspace argument can be a file, a directory holding a
//! `.tmuxload.yaml`, or a bare name looked up in the workspace directory
//! (`$TMUXLOAD_CONFIGDIR`, falling back to `~/.config/tmuxload`).

use crate::error::{Error, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the workspace directory.
pub const CONFIG_DIR_ENV: &str = "TMUXLOAD_CONFIGDIR";

/// File names searched for inside a project directory.
pub const LOCAL_FILE_NAMES: [&str; 3] = [".tmuxload.yaml", ".tmuxload.yml", ".tmuxload.json"];

/// Extensions of workspace files, in lookup order.
pub const WORKSPACE_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

/// Resolves workspace arguments to files.
///
/// # Examples
///
/// ```no_run
/// use tmuxload::config::WorkspaceFinder;
///
/// let finder = WorkspaceFinder::new().unwrap();
/// let path = finder.find("api").unwrap();
/// println!("loading {}", path.display());
/// ```
#[derive(Debug, Clone)]
pub struct WorkspaceFinder {
    config_dir: PathBuf,
}

impl WorkspaceFinder {
    /// A finder using the default workspace directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] when neither `$TMUXLOAD_CONFIGDIR` nor
    /// a home directory is available.
    pub fn new() -> Result<Self> {
        let config_dir = Self::default_config_dir().ok_or_else(|| Error::InvalidPath {
            path: PathBuf::from("~/.config/tmuxload"),
            reason: format!("Cannot determine home directory; set {CONFIG_DIR_ENV}"),
        })?;
        Ok(Self { config_dir })
    }

    /// A finder using `config_dir` for name lookups.
    #[must_use]
    pub fn with_config_dir(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    /// The workspace directory, from the environment or the home directory.
    #[must_use]
    pub fn default_config_dir() -> Option<PathBuf> {
        if let Ok(dir) = env::var(CONFIG_DIR_ENV) {
            if !dir.trim().is_empty() {
                return Some(PathBuf::from(shellexpand::tilde(&dir).into_owned()));
            }
        }
        home::home_dir().map(|home| home.join(".config").join("tmuxload"))
    }

    /// Directory searched for named workspaces.
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Resolve a workspace argument to a file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] when nothing matches.
    pub fn find(&self, workspace: &str) -> Result<PathBuf> {
        let path = PathBuf::from(shellexpand::tilde(workspace).into_owned());

        if path.is_file() {
            return Ok(path);
        }

        if path.is_dir() {
            return LOCAL_FILE_NAMES
                .iter()
                .map(|name| path.join(name))
                .find(|candidate| candidate.is_file())
                .ok_or_else(|| Error::InvalidPath {
                    path: path.clone(),
                    reason: "Directory contains no .tmuxload.yaml, .tmuxload.yml or .tmuxload.json"
                        .to_string(),
                });
        }

        if looks_like_path(workspace) {
            return Err(Error::InvalidPath {
                path,
                reason: "Workspace file does not exist".to_string(),
            });
        }

        WORKSPACE_EXTENSIONS
            .iter()
            .map(|ext| self.config_dir.join(format!("{workspace}.{ext}")))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| Error::InvalidPath {
                path: self.config_dir.join(workspace),
                reason: format!(
                    "No workspace named '{workspace}' in {}",
                    self.config_dir.display()
                ),
            })
    }

    /// Names of all workspaces in the workspace directory, sorted.
    ///
    /// A missing directory yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the directory exists but cannot be read.
    pub fn list(&self) -> Result<Vec<String>> {
        if !self.config_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.config_dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let known = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| WORKSPACE_EXTENSIONS.contains(&e));
            if let (true, Some(stem)) = (known, path.file_stem().and_then(|s| s.to_str())) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        names.dedup();
        Ok(names)
    }
}

fn looks_like_path(workspace: &str) -> bool {
    workspace.contains(std::path::MAIN_SEPARATOR)
        || workspace.contains('/')
        || workspace.starts_with('.')
        || Path::new(workspace).extension().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::write(path, "session_name: t\n").unwrap();
    }

    #[test]
    fn test_existing_file_used_as_is() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("anything.yml");
        touch(&file);
        let finder = WorkspaceFinder::with_config_dir(dir.path().join("unused"));
        assert_eq!(finder.find(file.to_str().unwrap()).unwrap(), file);
    }

    #[test]
    fn test_directory_searched_for_local_file() {
        let dir = TempDir::new().unwrap();
        let local = dir.path().join(".tmuxload.json");
        touch(&local);
        let finder = WorkspaceFinder::with_config_dir(dir.path().join("unused"));
        assert_eq!(finder.find(dir.path().to_str().unwrap()).unwrap(), local);
    }

    #[test]
    fn test_directory_without_local_file() {
        let dir = TempDir::new().unwrap();
        let finder = WorkspaceFinder::with_config_dir(dir.path());
        let err = finder.find(dir.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, Error::InvalidPath { .. }));
    }

    #[test]
    fn test_name_lookup_prefers_yaml() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("api.json"));
        touch(&dir.path().join("api.yaml"));
        let finder = WorkspaceFinder::with_config_dir(dir.path());
        assert_eq!(finder.find("api").unwrap(), dir.path().join("api.yaml"));
    }

    #[test]
    fn test_unknown_name() {
        let dir = TempDir::new().unwrap();
        let finder = WorkspaceFinder::with_config_dir(dir.path());
        let err = finder.find("missing").unwrap_err();
        assert!(format!("{err}").contains("missing"));
    }

    #[test]
    fn test_missing_path_not_treated_as_name() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("dev.yaml"));
        let finder = WorkspaceFinder::with_config_dir(dir.path());
        assert!(finder.find("./dev.yaml").is_err());
    }

    #[test]
    fn test_list_workspaces() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("web.yaml"));
        touch(&dir.path().join("api.json"));
        touch(&dir.path().join("api.yml"));
        touch(&dir.path().join("notes.txt"));
        let finder = WorkspaceFinder::with_config_dir(dir.path());
        assert_eq!(finder.list().unwrap(), ["api", "web"]);
    }

    #[test]
    fn test_list_missing_directory() {
        let finder = WorkspaceFinder::with_config_dir("/nonexistent/tmuxload");
        assert!(finder.list().unwrap().is_empty());
    }

    #[test]
    #[serial]
    fn test_config_dir_from_env() {
        let old = env::var(CONFIG_DIR_ENV).ok();
        env::set_var(CONFIG_DIR_ENV, "/tmp/tmuxload-workspaces");
        let dir = WorkspaceFinder::default_config_dir();
        match old {
            Some(v) => env::set_var(CONFIG_DIR_ENV, v),
            None => env::remove_var(CONFIG_DIR_ENV),
        }
        assert_eq!(dir, Some(PathBuf::from("/tmp/tmuxload-workspaces")));
    }
}
