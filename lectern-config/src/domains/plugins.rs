//! Plugin controller configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Plugin controller configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PluginsConfig {
    /// What `register` does when a name is already taken
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,

    /// Initialize plugins registered after the host-ready pass right away
    #[serde(default = "crate::domains::utils::default_true")]
    pub initialize_late_registrations: bool,

    /// Capacity of the host event channel
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

/// Behaviour on name collision during registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Last registration wins
    #[default]
    Replace,
    /// Refuse the second registration
    Reject,
}

impl Default for PluginsConfig {
    fn default() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::Replace,
            initialize_late_registrations: true,
            event_capacity: default_event_capacity(),
        }
    }
}

fn default_event_capacity() -> usize {
    16
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replace => write!(f, "replace"),
            Self::Reject => write!(f, "reject"),
        }
    }
}

impl FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "replace" => Ok(Self::Replace),
            "reject" => Ok(Self::Reject),
            _ => Err(format!("Invalid duplicate policy: {}", s)),
        }
    }
}

impl Validatable for PluginsConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.event_capacity, "event_capacity", self.domain_name())
    }

    fn domain_name(&self) -> &'static str {
        "plugins"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plugins_config_defaults() {
        let config = PluginsConfig::default();
        assert_eq!(config.duplicate_policy, DuplicatePolicy::Replace);
        assert!(config.initialize_late_registrations);
        assert_eq!(config.event_capacity, 16);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = PluginsConfig {
            event_capacity: 0,
            ..PluginsConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_policy_from_str() {
        assert_eq!(DuplicatePolicy::from_str("Reject").unwrap(), DuplicatePolicy::Reject);
        assert_eq!(DuplicatePolicy::from_str("replace").unwrap(), DuplicatePolicy::Replace);
        assert!(DuplicatePolicy::from_str("merge").is_err());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: PluginsConfig = serde_yaml::from_str("duplicate_policy: reject\n").unwrap();
        assert_eq!(config.duplicate_policy, DuplicatePolicy::Reject);
        assert!(config.initialize_late_registrations);
        assert_eq!(config.event_capacity, 16);
    }
}
