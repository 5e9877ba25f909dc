//! Plugin system error types

use thiserror::Error;

/// Plugin system result type
pub type PluginResult<T> = Result<T, PluginError>;

/// Plugin system errors
///
/// Errors are `Clone` because the registry keeps the failure that ended each
/// plugin's initialization alongside its state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PluginError {
    /// The host already carries a plugin namespace
    #[error("Plugins already initialized on this reader")]
    AlreadyInitialized,

    /// No host has been attached yet
    #[error("Reader host is not ready")]
    HostNotReady,

    /// Plugin not found
    #[error("Plugin '{name}' not found")]
    PluginNotFound { name: String },

    /// Name already registered while duplicates are rejected
    #[error("Plugin '{name}' already exists")]
    DuplicateName { name: String },

    /// A declared dependency is not registered
    #[error("Plugin '{name}': required plugin '{dependency}' not found")]
    DependencyNotFound { name: String, dependency: String },

    /// A declared dependency did not initialize successfully
    #[error("Plugin '{name}': required plugin '{dependency}' not supported")]
    DependencyUnsupported { name: String, dependency: String },

    /// The plugin sits on a dependency cycle
    #[error("Plugin '{name}' is part of a dependency cycle: {chain}")]
    CyclicDependency { name: String, chain: String },

    /// The initializer returned an error, called `fail` or panicked
    #[error("Plugin '{name}' failed to load: {reason}")]
    InitializerFailed { name: String, reason: String },

    /// Error built by a plugin through its handle
    #[error("Error in {name} Plugin: {message}")]
    Plugin { name: String, message: String },

    /// Generic error
    #[error("Plugin system error: {0}")]
    Generic(String),
}

impl PluginError {
    /// Create a new generic plugin error
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic(message.into())
    }

    /// Create a new initializer failure
    pub fn initializer_failed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InitializerFailed {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error is a dependency cycle report
    pub fn is_cycle(&self) -> bool {
        matches!(self, Self::CyclicDependency { .. })
    }

    /// Whether this error came from resolving dependencies rather than running the initializer
    pub fn is_dependency_error(&self) -> bool {
        matches!(
            self,
            Self::DependencyNotFound { .. }
                | Self::DependencyUnsupported { .. }
                | Self::CyclicDependency { .. }
        )
    }
}
