//! Build hooks.
//!
//! A [`Plugin`] can react at five points of a build. Plugins are named in
//! a workspace's `plugins` list and looked up in a [`PluginRegistry`] that
//! the caller fills before loading; there is no discovery. Every build
//! gets a fresh [`PluginHookRunner`], so plugin state never outlives it.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};
use crate::multiplexer::{Multiplexer, SessionRef, WindowRef};
use crate::version::Version;

/// An inclusive version window. Open ends accept anything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VersionRange {
    /// Lowest accepted version.
    pub min: Option<Version>,
    /// Highest accepted version.
    pub max: Option<Version>,
}

impl VersionRange {
    /// A window from `min` to `max`, both inclusive.
    #[must_use]
    pub const fn new(min: Option<Version>, max: Option<Version>) -> Self {
        Self { min, max }
    }

    /// Accepts every version.
    #[must_use]
    pub const fn any() -> Self {
        Self::new(None, None)
    }

    /// Check if `version` lies inside the window.
    ///
    /// # Examples
    ///
    /// ```
    /// use tmuxload::plugin::VersionRange;
    /// use tmuxload::Version;
    ///
    /// let range = VersionRange::new(Some(Version::new(3, 0, 0)), None);
    /// assert!(range.contains(Version::new(3, 4, 0)));
    /// assert!(!range.contains(Version::new(2, 9, 0)));
    /// ```
    #[must_use]
    pub fn contains(&self, version: Version) -> bool {
        self.min.map_or(true, |min| version >= min) && self.max.map_or(true, |max| version <= max)
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (None, None) => write!(f, "any"),
            (Some(min), None) => write!(f, ">= {min}"),
            (None, Some(max)) => write!(f, "<= {max}"),
            (Some(min), Some(max)) => write!(f, "{min} to {max}"),
        }
    }
}

/// The versions a plugin declares it works with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compatibility {
    /// Accepted versions of this library.
    pub tmuxload: VersionRange,
    /// Accepted multiplexer versions, when it matters.
    pub multiplexer: Option<VersionRange>,
    /// Versions of this library known not to work.
    pub incompatible: Vec<Version>,
}

/// The versions a build runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeVersions {
    /// This library.
    pub tmuxload: Version,
    /// The multiplexer, when known.
    pub multiplexer: Option<Version>,
}

impl RuntimeVersions {
    /// This library's version and the given multiplexer version.
    #[must_use]
    pub fn current(multiplexer: Option<Version>) -> Self {
        Self {
            tmuxload: Version::current(),
            multiplexer,
        }
    }
}

impl Compatibility {
    /// Why the plugin cannot run against `versions`, or `None` if it can.
    #[must_use]
    pub fn conflict(&self, versions: &RuntimeVersions) -> Option<String> {
        if !self.tmuxload.contains(versions.tmuxload) {
            return Some(format!(
                "needs tmuxload {}, running {}",
                self.tmuxload, versions.tmuxload
            ));
        }
        if self.incompatible.contains(&versions.tmuxload) {
            return Some(format!(
                "marked incompatible with tmuxload {}",
                versions.tmuxload
            ));
        }
        if let (Some(range), Some(running)) = (self.multiplexer, versions.multiplexer) {
            if !range.contains(running) {
                return Some(format!("needs tmux {range}, running {running}"));
            }
        }
        None
    }
}

/// Code that runs at fixed points of a build.
///
/// Every hook does nothing by default. Returning an error aborts the
/// build.
pub trait Plugin {
    /// Name used in log messages and errors.
    fn name(&self) -> &str;

    /// Versions this plugin works with.
    fn compatibility(&self) -> Compatibility {
        Compatibility::default()
    }

    /// Runs once per build, before any configured window is constructed.
    ///
    /// # Errors
    ///
    /// An error aborts the build.
    fn before_workspace_builder(
        &mut self,
        _mux: &mut dyn Multiplexer,
        _session: &SessionRef,
    ) -> Result<()> {
        Ok(())
    }

    /// Runs right after each window is created.
    ///
    /// # Errors
    ///
    /// An error aborts the build.
    fn on_window_create(&mut self, _mux: &mut dyn Multiplexer, _window: &WindowRef) -> Result<()> {
        Ok(())
    }

    /// Runs once each window's panes and commands are done.
    ///
    /// # Errors
    ///
    /// An error aborts the build.
    fn after_window_finished(
        &mut self,
        _mux: &mut dyn Multiplexer,
        _window: &WindowRef,
    ) -> Result<()> {
        Ok(())
    }

    /// Runs just before the session's `before_script`.
    ///
    /// # Errors
    ///
    /// An error aborts the build.
    fn before_script(&mut self, _mux: &mut dyn Multiplexer, _session: &SessionRef) -> Result<()> {
        Ok(())
    }

    /// Runs instead of the creation hooks when the session already exists.
    ///
    /// # Errors
    ///
    /// An error aborts the build.
    fn reattach(&mut self, _mux: &mut dyn Multiplexer, _session: &SessionRef) -> Result<()> {
        Ok(())
    }
}

type PluginFactory = Box<dyn Fn() -> Box<dyn Plugin>>;

/// Plugin factories by name.
///
/// # Examples
///
/// ```
/// use tmuxload::plugin::{Plugin, PluginRegistry, RuntimeVersions};
///
/// struct Noop;
/// impl Plugin for Noop {
///     fn name(&self) -> &str { "noop" }
/// }
///
/// let mut registry = PluginRegistry::new();
/// registry.register("noop", || Box::new(Noop));
///
/// let runner = registry
///     .resolve(&["noop".to_string()], &RuntimeVersions::current(None))
///     .unwrap();
/// assert_eq!(runner.names(), ["noop"]);
/// assert!(registry.resolve(&["other".to_string()], &RuntimeVersions::current(None)).is_err());
/// ```
#[derive(Default)]
pub struct PluginRegistry {
    factories: BTreeMap<String, PluginFactory>,
}

impl PluginRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` under `name`, replacing any previous entry.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn Plugin> + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Instantiate the plugins a workspace names, in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PluginNotFound`] for the first unknown name.
    pub fn resolve(&self, names: &[String], versions: &RuntimeVersions) -> Result<PluginHookRunner> {
        let plugins = names
            .iter()
            .map(|name| {
                self.factories
                    .get(name)
                    .map(|factory| factory())
                    .ok_or_else(|| Error::PluginNotFound { name: name.clone() })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(PluginHookRunner::new(plugins, versions))
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.names())
            .finish()
    }
}

/// Calls each hook on every active plugin, in workspace order.
#[derive(Default)]
pub struct PluginHookRunner {
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginHookRunner {
    /// A runner over `plugins`, minus those incompatible with `versions`.
    #[must_use]
    pub fn new(plugins: Vec<Box<dyn Plugin>>, versions: &RuntimeVersions) -> Self {
        let plugins = plugins
            .into_iter()
            .filter(|plugin| match plugin.compatibility().conflict(versions) {
                Some(reason) => {
                    log::warn!("skipping plugin '{}': {reason}", plugin.name());
                    false
                }
                None => true,
            })
            .collect();
        Self { plugins }
    }

    /// A runner with no plugins.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Names of the active plugins.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    /// Run every `before_workspace_builder` hook.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Plugin`] for the first failing hook.
    pub fn before_workspace_builder(
        &mut self,
        mux: &mut dyn Multiplexer,
        session: &SessionRef,
    ) -> Result<()> {
        self.each("before_workspace_builder", |plugin| {
            plugin.before_workspace_builder(mux, session)
        })
    }

    /// Run every `on_window_create` hook.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Plugin`] for the first failing hook.
    pub fn on_window_create(&mut self, mux: &mut dyn Multiplexer, window: &WindowRef) -> Result<()> {
        self.each("on_window_create", |plugin| plugin.on_window_create(mux, window))
    }

    /// Run every `after_window_finished` hook.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Plugin`] for the first failing hook.
    pub fn after_window_finished(
        &mut self,
        mux: &mut dyn Multiplexer,
        window: &WindowRef,
    ) -> Result<()> {
        self.each("after_window_finished", |plugin| {
            plugin.after_window_finished(mux, window)
        })
    }

    /// Run every `before_script` hook.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Plugin`] for the first failing hook.
    pub fn before_script(&mut self, mux: &mut dyn Multiplexer, session: &SessionRef) -> Result<()> {
        self.each("before_script", |plugin| plugin.before_script(mux, session))
    }

    /// Run every `reattach` hook.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Plugin`] for the first failing hook.
    pub fn reattach(&mut self, mux: &mut dyn Multiplexer, session: &SessionRef) -> Result<()> {
        self.each("reattach", |plugin| plugin.reattach(mux, session))
    }

    fn each<F>(&mut self, hook: &str, mut call: F) -> Result<()>
    where
        F: FnMut(&mut dyn Plugin) -> Result<()>,
    {
        for plugin in &mut self.plugins {
            log::debug!("plugin '{}': {hook}", plugin.name());
            call(plugin.as_mut()).map_err(|e| match e {
                Error::Plugin { .. } => e,
                other => Error::Plugin {
                    plugin: plugin.name().to_string(),
                    hook: hook.to_string(),
                    message: other.to_string(),
                },
            })?;
        }
        Ok(())
    }
}

impl fmt::Debug for PluginHookRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginHookRunner")
            .field("plugins", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multiplexer::{MemoryMultiplexer, OptionScope};
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    struct Recorder {
        name: String,
        log: Log,
        compatibility: Compatibility,
        fail_on: Option<&'static str>,
    }

    impl Recorder {
        fn boxed(name: &str, log: &Log) -> Box<dyn Plugin> {
            Box::new(Self {
                name: name.to_string(),
                log: Rc::clone(log),
                compatibility: Compatibility::default(),
                fail_on: None,
            })
        }

        fn hit(&self, hook: &'static str) -> Result<()> {
            self.log.borrow_mut().push(format!("{}:{hook}", self.name));
            if self.fail_on == Some(hook) {
                return Err(Error::config("", "boom"));
            }
            Ok(())
        }
    }

    impl Plugin for Recorder {
        fn name(&self) -> &str {
            &self.name
        }

        fn compatibility(&self) -> Compatibility {
            self.compatibility.clone()
        }

        fn before_workspace_builder(
            &mut self,
            _mux: &mut dyn Multiplexer,
            _session: &SessionRef,
        ) -> Result<()> {
            self.hit("before_workspace_builder")
        }

        fn reattach(&mut self, mux: &mut dyn Multiplexer, session: &SessionRef) -> Result<()> {
            mux.set_option(OptionScope::Session(session), "status", "off")?;
            self.hit("reattach")
        }
    }

    fn versions() -> RuntimeVersions {
        RuntimeVersions {
            tmuxload: Version::new(0, 5, 0),
            multiplexer: Some(Version::new(3, 3, 0)),
        }
    }

    #[test]
    fn test_version_range_bounds() {
        let range = VersionRange::new(Some(Version::new(1, 0, 0)), Some(Version::new(2, 0, 0)));
        assert!(range.contains(Version::new(1, 0, 0)));
        assert!(range.contains(Version::new(2, 0, 0)));
        assert!(!range.contains(Version::new(2, 0, 1)));
        assert!(VersionRange::any().contains(Version::new(0, 0, 1)));
    }

    #[test]
    fn test_compatibility_conflicts() {
        let ok = Compatibility::default();
        assert_eq!(ok.conflict(&versions()), None);

        let too_old = Compatibility {
            tmuxload: VersionRange::new(Some(Version::new(1, 0, 0)), None),
            ..Default::default()
        };
        assert!(too_old.conflict(&versions()).unwrap().contains("tmuxload"));

        let banned = Compatibility {
            incompatible: vec![Version::new(0, 5, 0)],
            ..Default::default()
        };
        assert!(banned.conflict(&versions()).is_some());

        let tmux = Compatibility {
            multiplexer: Some(VersionRange::new(Some(Version::new(3, 4, 0)), None)),
            ..Default::default()
        };
        assert!(tmux.conflict(&versions()).unwrap().contains("tmux"));
        let unknown_tmux = RuntimeVersions {
            multiplexer: None,
            ..versions()
        };
        assert_eq!(tmux.conflict(&unknown_tmux), None);
    }

    #[test]
    fn test_incompatible_plugins_are_skipped() {
        let log = Log::default();
        let skipped = Box::new(Recorder {
            name: "old".to_string(),
            log: Rc::clone(&log),
            compatibility: Compatibility {
                tmuxload: VersionRange::new(None, Some(Version::new(0, 1, 0))),
                ..Default::default()
            },
            fail_on: None,
        });
        let runner = PluginHookRunner::new(vec![skipped, Recorder::boxed("new", &log)], &versions());
        assert_eq!(runner.names(), ["new"]);
    }

    #[test]
    fn test_hooks_run_in_order() {
        let log = Log::default();
        let mut runner = PluginHookRunner::new(
            vec![Recorder::boxed("a", &log), Recorder::boxed("b", &log)],
            &versions(),
        );
        let mut mux = MemoryMultiplexer::new().with_session("dev");
        let session = mux.find_session("dev").unwrap().unwrap();

        runner.before_workspace_builder(&mut mux, &session).unwrap();
        runner.reattach(&mut mux, &session).unwrap();
        runner.before_script(&mut mux, &session).unwrap();

        assert_eq!(
            *log.borrow(),
            [
                "a:before_workspace_builder",
                "b:before_workspace_builder",
                "a:reattach",
                "b:reattach"
            ]
        );
        assert_eq!(mux.session("dev").unwrap().options["status"], "off");
    }

    #[test]
    fn test_hook_error_is_wrapped() {
        let log = Log::default();
        let failing = Box::new(Recorder {
            name: "bad".to_string(),
            log: Rc::clone(&log),
            compatibility: Compatibility::default(),
            fail_on: Some("before_workspace_builder"),
        });
        let mut runner =
            PluginHookRunner::new(vec![failing, Recorder::boxed("never", &log)], &versions());
        let mut mux = MemoryMultiplexer::new().with_session("dev");
        let session = mux.find_session("dev").unwrap().unwrap();

        let err = runner.before_workspace_builder(&mut mux, &session).unwrap_err();
        match err {
            Error::Plugin { plugin, hook, .. } => {
                assert_eq!(plugin, "bad");
                assert_eq!(hook, "before_workspace_builder");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_registry_resolves_in_workspace_order() {
        let log = Log::default();
        let mut registry = PluginRegistry::new();
        let a = Rc::clone(&log);
        registry.register("a", move || Recorder::boxed("a", &a));
        let b = Rc::clone(&log);
        registry.register("b", move || Recorder::boxed("b", &b));

        let runner = registry
            .resolve(&["b".to_string(), "a".to_string()], &versions())
            .unwrap();
        assert_eq!(runner.names(), ["b", "a"]);

        let err = registry
            .resolve(&["missing".to_string()], &versions())
            .unwrap_err();
        assert!(matches!(err, Error::PluginNotFound { name } if name == "missing"));
    }
}
