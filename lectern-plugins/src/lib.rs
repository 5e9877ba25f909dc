//! Plugins bundled with the lectern reader
//!
//! Each bundled plugin registers itself on a [`PluginsController`] and
//! publishes its reader extensions once the host is ready.

pub mod bundled;

pub use bundled::{register_bundled, AnnotationStore, Annotation, Footnote, FootnoteIndex};

// Re-export common plugin types for convenience
pub use lectern_plugin::{
    ExtensionSet, PluginApi, PluginError, PluginHandle, PluginResult, PluginsController,
    ReaderHost, SharedHost,
};
