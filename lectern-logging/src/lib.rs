//! Logging initialisation for lectern hosts
//!
//! The plugin crates only emit `tracing` events; this crate installs the
//! global subscriber a host application wants, driven by `LoggingConfig`.

pub mod init;

pub use init::{build_env_filter, init_logging_from_config, init_simple_tracing};
