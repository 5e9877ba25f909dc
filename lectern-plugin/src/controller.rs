//! Plugins controller: registration entry point and host-ready orchestration
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::Instrument;
use uuid::Uuid;

use lectern_config::{DuplicatePolicy, PluginsConfig};

use crate::api::{PluginApi, PluginApiFactory};
use crate::core::{Plugin, PluginHandle};
use crate::diagnostics::{Diagnostic, DiagnosticSink, TracingSink};
use crate::error::{PluginError, PluginResult};
use crate::events::{HostEvent, HostEvents};
use crate::host::SharedHost;
use crate::registry::PluginRegistry;
use crate::types::{InitReport, PluginInfo, PluginStatus, RegistryStats};

/// Owns the plugin registry and reacts to the host's ready signal
pub struct PluginsController {
    /// Plugin registry
    registry: Arc<RwLock<PluginRegistry>>,
    /// Host notification channel
    events: HostEvents,
    /// Diagnostics destination, shared with the registry
    sink: Arc<dyn DiagnosticSink>,
    /// Controller configuration
    config: PluginsConfig,
    /// Controller state
    state: Arc<RwLock<ControllerState>>,
}

#[derive(Debug, Default)]
struct ControllerState {
    /// Host the namespace was attached to
    host: Option<SharedHost>,
    /// Number of host-ready signals handled
    passes: u64,
}

impl PluginsController {
    pub fn new(config: PluginsConfig) -> Self {
        PluginsControllerBuilder::new().with_config(config).build()
    }

    pub fn builder() -> PluginsControllerBuilder {
        PluginsControllerBuilder::new()
    }

    /// The channel this controller listens and publishes on
    pub fn events(&self) -> &HostEvents {
        &self.events
    }

    pub fn config(&self) -> &PluginsConfig {
        &self.config
    }

    /// Register a plugin without dependencies
    pub async fn register<F>(&self, name: impl Into<String>, initializer: F) -> PluginResult<()>
    where
        F: FnOnce(&mut PluginHandle<'_>, &mut PluginApi<'_>) -> PluginResult<()>
            + Send
            + Sync
            + 'static,
    {
        self.register_with_dependencies(name, Vec::<String>::new(), initializer)
            .await
    }

    /// Register a plugin that needs `dependencies` to be supported first
    ///
    /// Nothing runs at registration time unless the reader is already
    /// initialized and late registrations are enabled; in that case the
    /// plugin is resolved right away and any failure is recorded on it.
    pub async fn register_with_dependencies<F, I, S>(
        &self,
        name: impl Into<String>,
        dependencies: I,
        initializer: F,
    ) -> PluginResult<()>
    where
        F: FnOnce(&mut PluginHandle<'_>, &mut PluginApi<'_>) -> PluginResult<()>
            + Send
            + Sync
            + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let dependencies: Vec<String> = dependencies.into_iter().map(Into::into).collect();

        self.registry
            .write()
            .await
            .register(Plugin::new(name.clone(), dependencies, initializer))?;

        if !self.config.initialize_late_registrations {
            return Ok(());
        }

        let host = self.state.read().await.host.clone();
        if let Some(host) = host {
            tracing::info!(
                target: "plugins_controller",
                plugin = %name,
                "Plugin registered after reader initialization, initializing now"
            );
            if let Err(error) = self.init_plugin_on(&host, &name).await {
                tracing::debug!(
                    target: "plugins_controller",
                    plugin = %name,
                    error = %error,
                    "Late plugin not initialized"
                );
            }
        }

        Ok(())
    }

    /// Handle the host-ready signal
    ///
    /// Attaches the plugin namespace to the host, initializes every
    /// registered plugin, then schedules `PluginsLoaded` on the event
    /// channel. The signal is scheduled even when the pass fails.
    ///
    /// Deferral needs a Tokio runtime; polled on another executor the pass
    /// still runs, but `PluginsLoaded` is published synchronously.
    pub async fn on_host_ready(&self, host: SharedHost) -> PluginResult<InitReport> {
        let pass_id = Uuid::new_v4();
        let span = tracing::info_span!("plugins_pass", pass_id = %pass_id);

        let outcome = self
            .initialize_plugins(&host, pass_id)
            .instrument(span)
            .await;

        match &outcome {
            Ok(report) => {
                tracing::info!(
                    target: "plugins_controller",
                    pass_id = %report.pass_id,
                    attempted = report.attempted,
                    supported = report.supported,
                    failed = report.failed,
                    "Plugins initialized"
                );
            }
            Err(error) => {
                tracing::error!(
                    target: "plugins_controller",
                    pass_id = %pass_id,
                    error = %error,
                    "Plugins failed to initialize"
                );
                self.sink.emit(Diagnostic::failure(
                    None,
                    format!("Plugins failed to initialize: {}", error),
                ));
            }
        }

        self.schedule_plugins_loaded();
        outcome
    }

    async fn initialize_plugins(&self, host: &SharedHost, pass_id: Uuid) -> PluginResult<InitReport> {
        let mut reader = host.write().await;
        reader.attach_namespace()?;

        {
            let mut state = self.state.write().await;
            state.host = Some(Arc::clone(host));
            state.passes += 1;
        }

        let mut registry = self.registry.write().await;
        {
            let mut factory = PluginApiFactory::new(&mut reader);
            registry.init_all(&mut factory);
        }

        let attempted = registry.len();
        let supported = registry
            .names()
            .iter()
            .filter(|name| registry.is_supported(name))
            .count();

        Ok(InitReport {
            pass_id,
            attempted,
            supported,
            failed: attempted - supported,
        })
    }

    /// Publish `PluginsLoaded` once the current task yields back to the runtime
    ///
    /// Outside a Tokio runtime there is nothing to defer onto, so the signal
    /// is published before `on_host_ready` returns.
    fn schedule_plugins_loaded(&self) {
        let events = self.events.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    tokio::task::yield_now().await;
                    events.publish(HostEvent::PluginsLoaded);
                });
            }
            Err(_) => {
                tracing::warn!(
                    target: "plugins_controller",
                    "No Tokio runtime available, publishing PluginsLoaded immediately"
                );
                events.publish(HostEvent::PluginsLoaded);
            }
        }
    }

    /// Initialize one plugin (dependencies first) against the attached host
    pub async fn init_plugin(&self, name: &str) -> PluginResult<()> {
        let host = self
            .state
            .read()
            .await
            .host
            .clone()
            .ok_or(PluginError::HostNotReady)?;
        self.init_plugin_on(&host, name).await
    }

    async fn init_plugin_on(&self, host: &SharedHost, name: &str) -> PluginResult<()> {
        let mut reader = host.write().await;
        let mut registry = self.registry.write().await;
        let mut factory = PluginApiFactory::new(&mut reader);
        registry.init_plugin(name, &mut factory)
    }

    /// Run `on_host_ready` for every `ReaderInitialized` published on the channel
    ///
    /// Failures are logged and never reach the host. The task runs until the
    /// returned handle is aborted.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn listen(self: &Arc<Self>) -> JoinHandle<()> {
        let controller = Arc::clone(self);
        let mut receiver = self.events.subscribe();

        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(HostEvent::ReaderInitialized(host)) => {
                        // already logged and reported by on_host_ready
                        let _ = controller.on_host_ready(host).await;
                    }
                    Ok(HostEvent::PluginsLoaded) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            target: "plugins_controller",
                            skipped,
                            "Host event listener lagged"
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Host the plugin namespace was attached to, once ready
    pub async fn host(&self) -> Option<SharedHost> {
        self.state.read().await.host.clone()
    }

    pub async fn is_ready(&self) -> bool {
        self.state.read().await.host.is_some()
    }

    /// Number of host-ready signals that attached a namespace
    pub async fn passes(&self) -> u64 {
        self.state.read().await.passes
    }

    pub async fn plugin_info(&self, name: &str) -> Option<PluginInfo> {
        self.registry.read().await.get_plugin_info(name)
    }

    pub async fn is_supported(&self, name: &str) -> bool {
        self.registry.read().await.is_supported(name)
    }

    pub async fn list_plugins(&self) -> Vec<PluginInfo> {
        self.registry.read().await.list_plugins()
    }

    pub async fn list_plugins_by_status(&self, status: PluginStatus) -> Vec<PluginInfo> {
        self.registry.read().await.list_plugins_by_status(status)
    }

    pub async fn get_dependencies(&self, name: &str) -> Vec<String> {
        self.registry.read().await.get_dependencies(name)
    }

    pub async fn get_dependents(&self, name: &str) -> Vec<String> {
        self.registry.read().await.get_dependents(name)
    }

    pub async fn stats(&self) -> RegistryStats {
        self.registry.read().await.get_stats()
    }
}

/// Builder for [`PluginsController`]
pub struct PluginsControllerBuilder {
    config: PluginsConfig,
    events: Option<HostEvents>,
    sink: Option<Arc<dyn DiagnosticSink>>,
}

impl PluginsControllerBuilder {
    pub fn new() -> Self {
        Self {
            config: PluginsConfig::default(),
            events: None,
            sink: None,
        }
    }

    pub fn with_config(mut self, config: PluginsConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.config.duplicate_policy = policy;
        self
    }

    pub fn with_late_registrations(mut self, enable: bool) -> Self {
        self.config.initialize_late_registrations = enable;
        self
    }

    /// Share an existing host channel instead of creating one
    pub fn with_events(mut self, events: HostEvents) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn build(self) -> PluginsController {
        let sink = self.sink.unwrap_or_else(|| Arc::new(TracingSink));
        let events = self
            .events
            .unwrap_or_else(|| HostEvents::new(self.config.event_capacity));
        let registry = PluginRegistry::new(self.config.duplicate_policy, Arc::clone(&sink));

        PluginsController {
            registry: Arc::new(RwLock::new(registry)),
            events,
            sink,
            config: self.config,
            state: Arc::new(RwLock::new(ControllerState::default())),
        }
    }
}

impl Default for PluginsControllerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
