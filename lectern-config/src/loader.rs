//! Configuration loading and environment variable handling

use crate::domains::LecternConfig;
use crate::error::{ConfigError, ConfigResult};
use std::path::Path;
use std::str::FromStr;

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "LECTERN".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<LecternConfig> {
        let content = std::fs::read_to_string(path)?;
        self.from_yaml_str(&content)
    }

    /// Load configuration from YAML text with environment overrides
    pub fn from_yaml_str(&self, content: &str) -> ConfigResult<LecternConfig> {
        let mut config: LecternConfig = serde_yaml::from_str(content)?;
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<LecternConfig> {
        let mut config = LecternConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<LecternConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    fn apply_env_overrides(&self, config: &mut LecternConfig) -> ConfigResult<()> {
        self.apply_logging_overrides(&mut config.logging)?;
        self.apply_plugins_overrides(&mut config.plugins)?;
        Ok(())
    }

    fn apply_logging_overrides(
        &self,
        config: &mut crate::domains::logging::LoggingConfig,
    ) -> ConfigResult<()> {
        if let Ok(log_level) = self.get_env_var("LOG_LEVEL") {
            config.level = crate::domains::logging::LogLevel::from_str(&log_level)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_LEVEL: {}", log_level)))?;
        }

        if let Ok(format) = self.get_env_var("LOG_FORMAT") {
            config.format = crate::domains::logging::LogFormat::from_str(&format)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_FORMAT: {}", format)))?;
        }

        Ok(())
    }

    fn apply_plugins_overrides(
        &self,
        config: &mut crate::domains::plugins::PluginsConfig,
    ) -> ConfigResult<()> {
        if let Ok(policy) = self.get_env_var("PLUGINS_DUPLICATE_POLICY") {
            config.duplicate_policy = crate::domains::plugins::DuplicatePolicy::from_str(&policy)
                .map_err(|_| {
                    ConfigError::EnvError(format!("Invalid PLUGINS_DUPLICATE_POLICY: {}", policy))
                })?;
        }

        if let Ok(init_late) = self.get_env_var("PLUGINS_INIT_LATE") {
            config.initialize_late_registrations = init_late
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid PLUGINS_INIT_LATE: {}", e)))?;
        }

        if let Ok(capacity) = self.get_env_var("PLUGINS_EVENT_CAPACITY") {
            config.event_capacity = capacity.parse().map_err(|e| {
                ConfigError::EnvError(format!("Invalid PLUGINS_EVENT_CAPACITY: {}", e))
            })?;
        }

        Ok(())
    }

    /// Get environment variable with prefix
    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
