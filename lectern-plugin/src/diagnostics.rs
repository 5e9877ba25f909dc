//! Structured diagnostics emitted by plugins and the controller
//!
//! Warnings, deprecation notices and failures all go through one
//! [`DiagnosticSink`]; the [`DiagnosticKind`] tells them apart.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Mutex, PoisonError};

/// Kind of diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    Warning,
    Deprecation,
    Failure,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Deprecation => write!(f, "deprecation"),
            Self::Failure => write!(f, "failure"),
        }
    }
}

/// A single diagnostic record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Plugin the diagnostic is about, `None` for controller-level events
    pub plugin: Option<String>,
    pub kind: DiagnosticKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl Diagnostic {
    pub fn new(plugin: Option<&str>, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            plugin: plugin.map(str::to_string),
            kind,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn warning(plugin: &str, message: impl Into<String>) -> Self {
        Self::new(Some(plugin), DiagnosticKind::Warning, message)
    }

    pub fn deprecation(plugin: &str, deprecated: &str, replacement: &str) -> Self {
        Self::new(
            Some(plugin),
            DiagnosticKind::Deprecation,
            format!(
                "{} in plugin {} is deprecated, use {} instead",
                deprecated, plugin, replacement
            ),
        )
    }

    pub fn failure(plugin: Option<&str>, message: impl Into<String>) -> Self {
        Self::new(plugin, DiagnosticKind::Failure, message)
    }
}

/// Destination for plugin diagnostics
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        let plugin = diagnostic.plugin.as_deref().unwrap_or("-");
        match diagnostic.kind {
            DiagnosticKind::Warning | DiagnosticKind::Deprecation => tracing::warn!(
                target: "plugin",
                plugin = %plugin,
                kind = %diagnostic.kind,
                "{}",
                diagnostic.message
            ),
            DiagnosticKind::Failure => tracing::error!(
                target: "plugin",
                plugin = %plugin,
                kind = %diagnostic.kind,
                "{}",
                diagnostic.message
            ),
        }
    }
}

/// Keeps diagnostics in memory so the host can inspect them later
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<Diagnostic>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn entries_for(&self, plugin: &str) -> Vec<Diagnostic> {
        self.entries()
            .into_iter()
            .filter(|d| d.plugin.as_deref() == Some(plugin))
            .collect()
    }
}

impl DiagnosticSink for MemorySink {
    fn emit(&self, diagnostic: Diagnostic) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(diagnostic);
    }
}
