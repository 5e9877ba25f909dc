//! Annotation store plugin, layered on the footnote index

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use lectern_plugin::{ExtensionSet, PluginError, PluginResult, PluginsController};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::footnotes::{self, FootnoteIndex};

pub const PLUGIN_NAME: &str = "annotations";

/// Extension key the store is published under
pub const STORE_KEY: &str = "store";

/// A reader note, optionally tied to a footnote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: Uuid,
    pub page: u32,
    pub text: String,
    pub footnote: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Annotations made while reading
#[derive(Debug)]
pub struct AnnotationStore {
    footnotes: Arc<FootnoteIndex>,
    annotations: RwLock<Vec<Annotation>>,
}

impl AnnotationStore {
    pub fn new(footnotes: Arc<FootnoteIndex>) -> Self {
        Self {
            footnotes,
            annotations: RwLock::new(Vec::new()),
        }
    }

    /// Record an annotation; a referenced footnote must exist in the index
    pub fn annotate(
        &self,
        page: u32,
        text: impl Into<String>,
        footnote: Option<&str>,
    ) -> PluginResult<Uuid> {
        if let Some(id) = footnote {
            if !self.footnotes.contains(id) {
                return Err(PluginError::Plugin {
                    name: PLUGIN_NAME.to_string(),
                    message: format!("unknown footnote '{}'", id),
                });
            }
        }

        let annotation = Annotation {
            id: Uuid::new_v4(),
            page,
            text: text.into(),
            footnote: footnote.map(str::to_string),
            created_at: Utc::now(),
        };
        let id = annotation.id;

        self.annotations
            .write()
            .map_err(|_| PluginError::generic("annotation store lock poisoned"))?
            .push(annotation);
        Ok(id)
    }

    pub fn on_page(&self, page: u32) -> Vec<Annotation> {
        self.annotations
            .read()
            .map(|all| all.iter().filter(|a| a.page == page).cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.annotations.read().map(|all| all.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Footnote index this store resolves references against
    pub fn footnotes(&self) -> &FootnoteIndex {
        &self.footnotes
    }

    /// All annotations as JSON, in creation order
    pub fn export(&self) -> serde_json::Value {
        let annotations = self
            .annotations
            .read()
            .map(|all| all.clone())
            .unwrap_or_default();
        serde_json::json!({
            "count": annotations.len(),
            "annotations": annotations,
        })
    }
}

pub async fn register(controller: &PluginsController) -> PluginResult<()> {
    controller
        .register_with_dependencies(PLUGIN_NAME, [footnotes::PLUGIN_NAME], |plugin, api| {
            let index = api
                .reader()
                .plugin_slot(footnotes::PLUGIN_NAME)
                .and_then(|slot| slot.get_arc::<FootnoteIndex>(footnotes::INDEX_KEY));

            let Some(index) = index else {
                return Err(plugin.fail("footnote index is not available on the reader"));
            };

            api.extend_reader(ExtensionSet::new().with(STORE_KEY, AnnotationStore::new(index)));
            Ok(())
        })
        .await
}
