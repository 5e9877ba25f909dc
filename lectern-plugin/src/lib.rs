//! Plugin registration and initialization for Lectern
//!
//! Plugins register a name, their dependencies and an initializer. When the
//! reader host signals it is ready, the controller attaches a plugin
//! namespace to it and initializes every plugin depth-first, dependencies
//! before dependents. A plugin that fails only takes down itself and the
//! plugins that depend on it.

pub mod api;
pub mod controller;
pub mod core;
pub mod diagnostics;
pub mod error;
pub mod events;
pub mod host;
pub mod registry;
pub mod types;

// Re-export main types
pub use api::{PluginApi, PluginApiFactory};
pub use controller::{PluginsController, PluginsControllerBuilder};
pub use core::{Initializer, Plugin, PluginHandle};
pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink, MemorySink, TracingSink};
pub use error::{PluginError, PluginResult};
pub use events::{HostEvent, HostEvents};
pub use host::{Extension, ExtensionSet, PluginNamespace, ReaderHost, SharedHost};
pub use registry::{PluginRegistry, Registration};
pub use types::{InitReport, PluginInfo, PluginState, PluginStatus, RegistryStats};

/// Plugin system version
pub const PLUGIN_SYSTEM_VERSION: &str = env!("CARGO_PKG_VERSION");
