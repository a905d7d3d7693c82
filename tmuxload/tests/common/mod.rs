//! Common test utilities for integration tests.
//!
//! Fixtures for loading workspaces deterministically and a plugin that
//! records which hooks ran.

use std::cell::RefCell;
use std::rc::Rc;

use serde_yaml::Value;
use tmuxload::multiplexer::{Multiplexer, SessionRef, WindowRef};
use tmuxload::{ConfigFormat, LoadedWorkspace, Plugin, WorkspaceLoader};

/// Parses YAML text into a raw tree.
#[allow(dead_code)]
pub fn yaml(text: &str) -> Value {
    serde_yaml::from_str(text).expect("test YAML should parse")
}

/// A loader that never reads the process environment and resolves
/// relative paths against `/work`.
#[allow(dead_code)]
pub fn loader() -> WorkspaceLoader<'static> {
    WorkspaceLoader::new()
        .with_base_dir("/work")
        .with_env_lookup(|_| None)
}

/// Loads YAML text through the full pipeline.
#[allow(dead_code)]
pub fn load(text: &str) -> LoadedWorkspace {
    loader()
        .load_str(text, ConfigFormat::Yaml)
        .expect("workspace should load")
}

/// Shared list of `plugin:hook` entries.
pub type HookLog = Rc<RefCell<Vec<String>>>;

/// A plugin that appends every hook it sees to a [`HookLog`].
#[allow(dead_code)]
pub struct RecordingPlugin {
    name: String,
    log: HookLog,
}

impl RecordingPlugin {
    /// Creates a boxed recorder writing to `log`.
    #[allow(dead_code)]
    pub fn boxed(name: &str, log: &HookLog) -> Box<dyn Plugin> {
        Box::new(Self {
            name: name.to_string(),
            log: Rc::clone(log),
        })
    }

    fn push(&self, entry: String) {
        self.log.borrow_mut().push(entry);
    }
}

impl Plugin for RecordingPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn before_workspace_builder(
        &mut self,
        _mux: &mut dyn Multiplexer,
        session: &SessionRef,
    ) -> tmuxload::Result<()> {
        self.push(format!("before_workspace_builder:{}", session.name));
        Ok(())
    }

    fn on_window_create(
        &mut self,
        _mux: &mut dyn Multiplexer,
        window: &WindowRef,
    ) -> tmuxload::Result<()> {
        self.push(format!("on_window_create:{}", window.name));
        Ok(())
    }

    fn after_window_finished(
        &mut self,
        _mux: &mut dyn Multiplexer,
        window: &WindowRef,
    ) -> tmuxload::Result<()> {
        self.push(format!("after_window_finished:{}", window.name));
        Ok(())
    }

    fn before_script(
        &mut self,
        _mux: &mut dyn Multiplexer,
        session: &SessionRef,
    ) -> tmuxload::Result<()> {
        self.push(format!("before_script:{}", session.name));
        Ok(())
    }

    fn reattach(&mut self, _mux: &mut dyn Multiplexer, session: &SessionRef) -> tmuxload::Result<()> {
        self.push(format!("reattach:{}", session.name));
        Ok(())
    }
}
