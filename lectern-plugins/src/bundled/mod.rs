//! Bundled plugin implementations

pub mod annotations;
pub mod footnotes;

pub use annotations::{Annotation, AnnotationStore};
pub use footnotes::{Footnote, FootnoteIndex};

use lectern_plugin::{PluginResult, PluginsController};

/// Register every bundled plugin, dependencies first
pub async fn register_bundled(controller: &PluginsController) -> PluginResult<()> {
    footnotes::register(controller).await?;
    annotations::register(controller).await?;

    tracing::debug!(target: "plugin", "Bundled plugins registered");
    Ok(())
}
