//! Domain-driven configuration for lectern
//!
//! Configuration is split by functional domain (logging, plugins), each with
//! serde defaults, validation and `LECTERN_*` environment overrides.

pub mod domains;
pub mod error;
pub mod loader;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

pub use domains::{
    logging::{LogFormat, LogLevel, LoggingConfig},
    plugins::{DuplicatePolicy, PluginsConfig},
    LecternConfig,
};
