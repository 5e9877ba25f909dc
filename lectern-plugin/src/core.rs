//! Plugin entity and the handle passed to its initializer

use chrono::{DateTime, Utc};

use crate::api::PluginApi;
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::{PluginError, PluginResult};
use crate::types::{PluginInfo, PluginState};

/// Setup code of a plugin
///
/// Runs at most once; it receives the plugin's handle and a fresh
/// [`PluginApi`] bound to the host.
pub type Initializer =
    Box<dyn FnOnce(&mut PluginHandle<'_>, &mut PluginApi<'_>) -> PluginResult<()> + Send + Sync>;

/// A named extension unit with its dependencies and lifecycle state
pub struct Plugin {
    name: String,
    dependencies: Vec<String>,
    initializer: Option<Initializer>,
    pub(crate) state: PluginState,
    registered_at: DateTime<Utc>,
}

impl Plugin {
    pub fn new<F>(name: impl Into<String>, dependencies: Vec<String>, initializer: F) -> Self
    where
        F: FnOnce(&mut PluginHandle<'_>, &mut PluginApi<'_>) -> PluginResult<()>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            dependencies,
            initializer: Some(Box::new(initializer)),
            state: PluginState::default(),
            registered_at: Utc::now(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn is_initialized(&self) -> bool {
        self.state.initialized
    }

    pub fn is_supported(&self) -> bool {
        self.state.supported
    }

    pub fn state(&self) -> &PluginState {
        &self.state
    }

    /// Take the initializer out; `None` once it has been taken
    pub(crate) fn take_initializer(&mut self) -> Option<Initializer> {
        self.initializer.take()
    }

    pub fn info(&self) -> PluginInfo {
        PluginInfo {
            name: self.name.clone(),
            dependencies: self.dependencies.clone(),
            initialized: self.state.initialized,
            supported: self.state.supported,
            status: self.state.status(),
            error: self.state.error.as_ref().map(ToString::to_string),
            registered_at: self.registered_at,
            initialized_at: self.state.initialized_at,
        }
    }
}

impl std::fmt::Debug for Plugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Plugin")
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Handle a plugin's initializer uses to talk back to the controller
pub struct PluginHandle<'a> {
    name: &'a str,
    sink: &'a dyn DiagnosticSink,
    failure: Option<PluginError>,
}

impl<'a> PluginHandle<'a> {
    pub(crate) fn new(name: &'a str, sink: &'a dyn DiagnosticSink) -> Self {
        Self {
            name,
            sink,
            failure: None,
        }
    }

    pub fn name(&self) -> &str {
        self.name
    }

    /// Mark the plugin unsupported and return the error to propagate
    ///
    /// The plugin counts as failed even if the initializer later returns `Ok`.
    ///
    /// ```rust,ignore
    /// controller.register("toc", |plugin, _api| {
    ///     if !has_navigation() {
    ///         return Err(plugin.fail("document has no navigation"));
    ///     }
    ///     Ok(())
    /// });
    /// ```
    pub fn fail(&mut self, reason: impl Into<String>) -> PluginError {
        let error = PluginError::initializer_failed(self.name, reason);
        self.failure = Some(error.clone());
        error
    }

    /// Non-fatal diagnostic
    pub fn warn(&self, message: impl Into<String>) {
        self.sink.emit(Diagnostic::warning(self.name, message));
    }

    /// Build an error scoped to this plugin without raising it
    pub fn create_error(&self, message: impl Into<String>) -> PluginError {
        PluginError::Plugin {
            name: self.name.to_string(),
            message: message.into(),
        }
    }

    pub fn deprecation_notice(&self, deprecated: &str, replacement: &str) {
        self.sink
            .emit(Diagnostic::deprecation(self.name, deprecated, replacement));
    }

    pub(crate) fn into_failure(self) -> Option<PluginError> {
        self.failure
    }
}
