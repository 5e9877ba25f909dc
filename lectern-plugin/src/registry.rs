//! Plugin registry and dependency resolution
//!
//! The registry owns every registered [`Plugin`] and runs the depth-first
//! initialization pass. It is a plain synchronous structure; the controller
//! wraps it in a lock and drives it from the host-ready signal.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use lectern_config::DuplicatePolicy;

use crate::api::PluginApiFactory;
use crate::core::{Plugin, PluginHandle};
use crate::diagnostics::{Diagnostic, DiagnosticSink, TracingSink};
use crate::error::{PluginError, PluginResult};
use crate::types::{PluginInfo, PluginStatus, RegistryStats};

/// Outcome of registering a plugin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Added,
    Replaced,
}

/// Registry of plugins keyed by name
pub struct PluginRegistry {
    /// Registered plugins
    plugins: HashMap<String, Plugin>,
    /// Registration order, used for the bulk pass
    order: Vec<String>,
    /// Name collision policy
    policy: DuplicatePolicy,
    /// Diagnostics destination
    sink: Arc<dyn DiagnosticSink>,
    /// Registry statistics
    stats: RegistryStats,
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new(DuplicatePolicy::default(), Arc::new(TracingSink))
    }
}

impl PluginRegistry {
    pub fn new(policy: DuplicatePolicy, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            plugins: HashMap::new(),
            order: Vec::new(),
            policy,
            sink,
            stats: RegistryStats::default(),
        }
    }

    /// Register a plugin
    ///
    /// With [`DuplicatePolicy::Replace`] a plugin registered under an existing
    /// name replaces the previous entry, keeping its position in the
    /// iteration order.
    pub fn register(&mut self, plugin: Plugin) -> PluginResult<Registration> {
        let name = plugin.name().to_string();

        if name.is_empty() {
            return Err(PluginError::generic("Plugin name cannot be empty"));
        }

        let registration = if self.plugins.contains_key(&name) {
            if self.policy == DuplicatePolicy::Reject {
                return Err(PluginError::DuplicateName { name });
            }
            let previous = self.plugins.get(&name).map(|p| p.state().status());
            if let Some(status) = previous {
                self.forget_outcome(status);
            }
            self.stats.replaced_registrations += 1;
            tracing::warn!(
                target: "plugin_registry",
                plugin = %name,
                "Plugin registered again, replacing previous entry"
            );
            Registration::Replaced
        } else {
            self.order.push(name.clone());
            self.stats.total_plugins += 1;
            Registration::Added
        };

        tracing::info!(
            target: "plugin_registry",
            plugin = %name,
            dependencies = ?plugin.dependencies(),
            "Plugin registered"
        );

        self.plugins.insert(name, plugin);
        Ok(registration)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Registered names in iteration order
    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn get_plugin_info(&self, name: &str) -> Option<PluginInfo> {
        self.plugins.get(name).map(Plugin::info)
    }

    /// All plugins in iteration order
    pub fn list_plugins(&self) -> Vec<PluginInfo> {
        self.order
            .iter()
            .filter_map(|name| self.get_plugin_info(name))
            .collect()
    }

    pub fn list_plugins_by_status(&self, status: PluginStatus) -> Vec<PluginInfo> {
        self.list_plugins()
            .into_iter()
            .filter(|info| info.status == status)
            .collect()
    }

    pub fn is_supported(&self, name: &str) -> bool {
        self.plugins.get(name).is_some_and(Plugin::is_supported)
    }

    /// Get plugin dependencies
    pub fn get_dependencies(&self, name: &str) -> Vec<String> {
        self.plugins
            .get(name)
            .map(|plugin| plugin.dependencies().to_vec())
            .unwrap_or_default()
    }

    /// Get plugins that depend on the given plugin, in iteration order
    pub fn get_dependents(&self, name: &str) -> Vec<String> {
        self.order
            .iter()
            .filter(|candidate| {
                self.plugins
                    .get(candidate.as_str())
                    .is_some_and(|plugin| plugin.dependencies().iter().any(|d| d == name))
            })
            .cloned()
            .collect()
    }

    pub fn get_stats(&self) -> RegistryStats {
        self.stats.clone()
    }

    pub fn sink(&self) -> &Arc<dyn DiagnosticSink> {
        &self.sink
    }

    /// Initialize every registered plugin in iteration order
    ///
    /// A failure is contained to the plugin whose dependency chain produced
    /// it; the pass always visits every plugin. Returns the failures that
    /// happened during this pass.
    pub fn init_all(&mut self, factory: &mut PluginApiFactory<'_>) -> Vec<PluginError> {
        let names = self.order.clone();
        let mut failures = Vec::new();

        for name in &names {
            let mut resolving = Vec::new();
            if let Err(error) = self.resolve(name, factory, &mut resolving) {
                tracing::debug!(
                    target: "plugin_registry",
                    plugin = %name,
                    error = %error,
                    "Plugin not initialized"
                );
                failures.push(error);
            }
        }

        failures
    }

    /// Initialize one plugin, its dependencies first
    ///
    /// Returns immediately for a plugin that was already attempted; the
    /// caller reads `is_supported` to learn how that attempt went.
    pub fn init_plugin(&mut self, name: &str, factory: &mut PluginApiFactory<'_>) -> PluginResult<()> {
        if !self.plugins.contains_key(name) {
            return Err(PluginError::PluginNotFound {
                name: name.to_string(),
            });
        }
        let mut resolving = Vec::new();
        self.resolve(name, factory, &mut resolving)
    }

    /// Depth-first, pre-order resolution with a "currently resolving" chain
    fn resolve(
        &mut self,
        name: &str,
        factory: &mut PluginApiFactory<'_>,
        resolving: &mut Vec<String>,
    ) -> PluginResult<()> {
        let plugin = self
            .plugins
            .get(name)
            .ok_or_else(|| PluginError::PluginNotFound {
                name: name.to_string(),
            })?;

        if plugin.is_initialized() {
            return Ok(());
        }

        if let Some(start) = resolving.iter().position(|entry| entry == name) {
            let chain = resolving[start..]
                .iter()
                .map(String::as_str)
                .chain(std::iter::once(name))
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(PluginError::CyclicDependency {
                name: name.to_string(),
                chain,
            });
        }

        let dependencies = plugin.dependencies().to_vec();

        resolving.push(name.to_string());
        let resolved = self.resolve_dependencies(name, &dependencies, factory, resolving);
        resolving.pop();

        if let Err(error) = resolved {
            if error.is_dependency_error() {
                self.stats.dependency_failures += 1;
            }
            return Err(self.record_failure(name, error));
        }

        self.run_initializer(name, factory)
    }

    fn resolve_dependencies(
        &mut self,
        name: &str,
        dependencies: &[String],
        factory: &mut PluginApiFactory<'_>,
        resolving: &mut Vec<String>,
    ) -> PluginResult<()> {
        for dependency in dependencies {
            if !self.plugins.contains_key(dependency) {
                return Err(PluginError::DependencyNotFound {
                    name: name.to_string(),
                    dependency: dependency.clone(),
                });
            }

            // Only plugins on the loop itself report the cycle; anything
            // depending on a member sees it as an unsupported dependency
            if let Err(PluginError::CyclicDependency { chain, .. }) =
                self.resolve(dependency, factory, resolving)
            {
                if on_cycle(name, &chain) {
                    return Err(PluginError::CyclicDependency {
                        name: name.to_string(),
                        chain,
                    });
                }
            }

            if !self.is_supported(dependency) {
                return Err(PluginError::DependencyUnsupported {
                    name: name.to_string(),
                    dependency: dependency.clone(),
                });
            }
        }

        Ok(())
    }

    fn run_initializer(&mut self, name: &str, factory: &mut PluginApiFactory<'_>) -> PluginResult<()> {
        let plugin = self
            .plugins
            .get_mut(name)
            .ok_or_else(|| PluginError::PluginNotFound {
                name: name.to_string(),
            })?;

        // Marked before running so re-entry never invokes the initializer twice
        plugin.state.begin();

        let Some(initializer) = plugin.take_initializer() else {
            return Err(self.record_failure(
                name,
                PluginError::initializer_failed(name, "initializer already consumed"),
            ));
        };

        self.stats.initializer_runs += 1;

        let outcome = {
            let mut handle = PluginHandle::new(name, self.sink.as_ref());
            let mut api = factory.create(name);
            let returned = catch_unwind(AssertUnwindSafe(|| initializer(&mut handle, &mut api)));
            let flagged = handle.into_failure();

            match (returned, flagged) {
                (Ok(Ok(())), None) => Ok(()),
                (_, Some(failure)) => Err(failure),
                (Ok(Err(PluginError::InitializerFailed { reason, .. })), None) => {
                    Err(PluginError::initializer_failed(name, reason))
                }
                (Ok(Err(error)), None) => Err(PluginError::initializer_failed(name, error.to_string())),
                (Err(payload), None) => Err(PluginError::initializer_failed(
                    name,
                    format!("initializer panicked: {}", panic_message(payload.as_ref())),
                )),
            }
        };

        match outcome {
            Ok(()) => {
                if let Some(plugin) = self.plugins.get_mut(name) {
                    plugin.state.succeed();
                }
                self.stats.supported_plugins += 1;
                tracing::info!(
                    target: "plugin_registry",
                    plugin = %name,
                    "Plugin initialized"
                );
                Ok(())
            }
            Err(error) => Err(self.record_failure(name, error)),
        }
    }

    /// Store the failure on the plugin, report it, and hand it back
    fn record_failure(&mut self, name: &str, error: PluginError) -> PluginError {
        if let Some(plugin) = self.plugins.get_mut(name) {
            plugin.state.fail(error.clone());
        }
        self.stats.failed_plugins += 1;
        self.sink
            .emit(Diagnostic::failure(Some(name), error.to_string()));
        error
    }

    fn forget_outcome(&mut self, status: PluginStatus) {
        match status {
            PluginStatus::Supported => {
                self.stats.supported_plugins = self.stats.supported_plugins.saturating_sub(1)
            }
            PluginStatus::Failed => {
                self.stats.failed_plugins = self.stats.failed_plugins.saturating_sub(1)
            }
            PluginStatus::Registered => {}
        }
    }
}

/// Whether `name` is one of the plugins in a `a -> b -> a` cycle chain
fn on_cycle(name: &str, chain: &str) -> bool {
    chain.split(" -> ").any(|member| member == name)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
