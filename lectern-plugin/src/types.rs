//! Plugin state and snapshot types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::PluginError;

/// Plugin status derived from the lifecycle flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginStatus {
    /// Registered, initialization not attempted yet
    Registered,
    /// Initializer completed and every dependency is supported
    Supported,
    /// Initialization was attempted and failed
    Failed,
}

impl fmt::Display for PluginStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registered => write!(f, "registered"),
            Self::Supported => write!(f, "supported"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Lifecycle flags of a registered plugin
///
/// `supported` implies `initialized`; once `initialized` is set it never
/// goes back to false.
#[derive(Debug, Clone, Default)]
pub struct PluginState {
    pub initialized: bool,
    pub supported: bool,
    pub error: Option<PluginError>,
    pub initialized_at: Option<DateTime<Utc>>,
}

impl PluginState {
    pub fn status(&self) -> PluginStatus {
        match (self.initialized, self.supported) {
            (false, _) => PluginStatus::Registered,
            (true, true) => PluginStatus::Supported,
            (true, false) => PluginStatus::Failed,
        }
    }

    /// Mark the initialization attempt as started
    pub(crate) fn begin(&mut self) {
        self.initialized = true;
        self.supported = false;
        self.initialized_at = Some(Utc::now());
    }

    pub(crate) fn succeed(&mut self) {
        self.initialized = true;
        self.supported = true;
        self.error = None;
    }

    pub(crate) fn fail(&mut self, error: PluginError) {
        if self.initialized_at.is_none() {
            self.initialized_at = Some(Utc::now());
        }
        self.initialized = true;
        self.supported = false;
        self.error = Some(error);
    }
}

/// Plugin information exposed to the host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginInfo {
    pub name: String,
    pub dependencies: Vec<String>,
    pub initialized: bool,
    pub supported: bool,
    pub status: PluginStatus,
    /// Failure message when `status` is `Failed`
    pub error: Option<String>,
    pub registered_at: DateTime<Utc>,
    pub initialized_at: Option<DateTime<Utc>>,
}

/// Registry statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    /// Number of registered plugins
    pub total_plugins: usize,
    /// Number of plugins whose initialization succeeded
    pub supported_plugins: usize,
    /// Number of plugins whose initialization failed
    pub failed_plugins: usize,
    /// Failures caused by a missing, unsupported or cyclic dependency
    pub dependency_failures: u64,
    /// Number of initializer invocations
    pub initializer_runs: u64,
    /// Registrations that replaced an existing entry
    pub replaced_registrations: u64,
}

/// Summary of one host-ready pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitReport {
    pub pass_id: uuid::Uuid,
    pub attempted: usize,
    pub supported: usize,
    pub failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_flags() {
        let mut state = PluginState::default();
        assert_eq!(state.status(), PluginStatus::Registered);

        state.begin();
        assert_eq!(state.status(), PluginStatus::Failed);
        assert!(state.initialized_at.is_some());

        state.succeed();
        assert_eq!(state.status(), PluginStatus::Supported);
    }

    #[test]
    fn test_failure_keeps_error() {
        let mut state = PluginState::default();
        state.fail(PluginError::initializer_failed("a", "boom"));

        assert!(state.initialized);
        assert!(!state.supported);
        assert!(state.initialized_at.is_some());
        assert_eq!(
            state.error.as_ref().map(|e| e.to_string()).as_deref(),
            Some("Plugin 'a' failed to load: boom")
        );
    }

    #[test]
    fn test_plugin_status_display() {
        assert_eq!(PluginStatus::Supported.to_string(), "supported");
        assert_eq!(PluginStatus::Failed.to_string(), "failed");
    }
}
