//! Footnote index plugin

use std::collections::BTreeMap;
use std::sync::RwLock;

use lectern_plugin::{ExtensionSet, PluginError, PluginResult, PluginsController};
use serde::{Deserialize, Serialize};

pub const PLUGIN_NAME: &str = "footnotes";

/// Extension key the index is published under
pub const INDEX_KEY: &str = "index";

/// A footnote anchored on a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footnote {
    pub id: String,
    pub page: u32,
    pub text: String,
}

/// Footnotes known to the reader, keyed by id
#[derive(Debug, Default)]
pub struct FootnoteIndex {
    notes: RwLock<BTreeMap<String, Footnote>>,
}

impl FootnoteIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a footnote
    pub fn insert(&self, id: impl Into<String>, page: u32, text: impl Into<String>) -> PluginResult<()> {
        let id = id.into();
        if id.is_empty() {
            return Err(PluginError::Plugin {
                name: PLUGIN_NAME.to_string(),
                message: "footnote id cannot be empty".to_string(),
            });
        }

        let mut notes = self
            .notes
            .write()
            .map_err(|_| PluginError::generic("footnote index lock poisoned"))?;
        notes.insert(
            id.clone(),
            Footnote {
                id,
                page,
                text: text.into(),
            },
        );
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<Footnote> {
        self.notes.read().ok().and_then(|notes| notes.get(id).cloned())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.notes
            .read()
            .map(|notes| notes.contains_key(id))
            .unwrap_or(false)
    }

    /// Footnotes on `page`, ordered by id
    pub fn on_page(&self, page: u32) -> Vec<Footnote> {
        self.notes
            .read()
            .map(|notes| notes.values().filter(|n| n.page == page).cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.notes.read().map(|notes| notes.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub async fn register(controller: &PluginsController) -> PluginResult<()> {
    controller
        .register(PLUGIN_NAME, |_plugin, api| {
            api.extend_reader(ExtensionSet::new().with(INDEX_KEY, FootnoteIndex::new()));
            Ok(())
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_lookup_by_page() {
        let index = FootnoteIndex::new();
        index.insert("fn-2", 4, "second").unwrap();
        index.insert("fn-1", 4, "first").unwrap();
        index.insert("fn-3", 9, "elsewhere").unwrap();

        let page = index.on_page(4);
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].id, "fn-1");
        assert_eq!(index.get("fn-3").unwrap().text, "elsewhere");
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_insert_replaces_existing_id() {
        let index = FootnoteIndex::new();
        index.insert("fn-1", 1, "draft").unwrap();
        index.insert("fn-1", 2, "final").unwrap();

        assert_eq!(index.len(), 1);
        assert_eq!(index.get("fn-1").unwrap().page, 2);
    }

    #[test]
    fn test_empty_id_rejected() {
        let index = FootnoteIndex::new();
        assert!(index.insert("", 1, "text").is_err());
        assert!(index.is_empty());
    }
}
