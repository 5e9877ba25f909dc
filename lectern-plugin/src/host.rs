//! The reader host and its plugin namespace
//!
//! The host owns `plugins`, a namespace created exactly once by the
//! controller at the first host-ready pass. Each plugin gets one slot in it,
//! keyed by plugin name, which it fills through `PluginApi::extend_reader`.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{PluginError, PluginResult};

/// Host handle shared between the application and the controller
pub type SharedHost = Arc<RwLock<ReaderHost>>;

/// Value stored in an extension slot
pub type Extension = Arc<dyn Any + Send + Sync>;

/// Named extension values a plugin contributes to the reader
#[derive(Clone, Default)]
pub struct ExtensionSet {
    entries: HashMap<String, Extension>,
}

impl ExtensionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value under `key`
    pub fn with<T>(mut self, key: impl Into<String>, value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        self.insert(key, value);
        self
    }

    pub fn insert<T>(&mut self, key: impl Into<String>, value: T)
    where
        T: Any + Send + Sync,
    {
        self.entries.insert(key.into(), Arc::new(value));
    }

    /// Get a value as a specific type
    pub fn get<T>(&self, key: &str) -> Option<&T>
    where
        T: Any + Send + Sync,
    {
        self.entries.get(key).and_then(|value| value.downcast_ref::<T>())
    }

    /// Get the shared handle for a value as a specific type
    pub fn get_arc<T>(&self, key: &str) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        self.entries
            .get(key)
            .cloned()
            .and_then(|value| value.downcast::<T>().ok())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge `other` into this set; keys from `other` win
    pub fn merge(&mut self, other: ExtensionSet) {
        self.entries.extend(other.entries);
    }
}

impl fmt::Debug for ExtensionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.keys().collect();
        keys.sort_unstable();
        f.debug_struct("ExtensionSet").field("keys", &keys).finish()
    }
}

/// Per-host container keyed by plugin name
#[derive(Debug, Clone, Default)]
pub struct PluginNamespace {
    slots: HashMap<String, ExtensionSet>,
}

impl PluginNamespace {
    pub fn slot(&self, plugin: &str) -> Option<&ExtensionSet> {
        self.slots.get(plugin)
    }

    /// Merge `extensions` into the slot reserved for `plugin`
    pub fn extend(&mut self, plugin: &str, extensions: ExtensionSet) {
        self.slots
            .entry(plugin.to_string())
            .or_default()
            .merge(extensions);
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// The reader application instance plugins attach to
#[derive(Debug, Default)]
pub struct ReaderHost {
    plugins: Option<PluginNamespace>,
}

impl ReaderHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a fresh host in the shared handle the controller expects
    pub fn shared() -> SharedHost {
        Arc::new(RwLock::new(Self::new()))
    }

    pub fn has_namespace(&self) -> bool {
        self.plugins.is_some()
    }

    pub fn namespace(&self) -> Option<&PluginNamespace> {
        self.plugins.as_ref()
    }

    pub(crate) fn namespace_mut(&mut self) -> Option<&mut PluginNamespace> {
        self.plugins.as_mut()
    }

    /// Create the empty plugin namespace
    ///
    /// Fails with `AlreadyInitialized` if a namespace is already attached,
    /// whether or not any plugin has filled a slot in it.
    pub fn attach_namespace(&mut self) -> PluginResult<()> {
        if self.plugins.is_some() {
            return Err(PluginError::AlreadyInitialized);
        }
        self.plugins = Some(PluginNamespace::default());
        Ok(())
    }

    /// Extensions contributed by `plugin`
    pub fn plugin_slot(&self, plugin: &str) -> Option<&ExtensionSet> {
        self.plugins.as_ref().and_then(|ns| ns.slot(plugin))
    }

    /// Typed lookup of one extension value
    pub fn extension<T>(&self, plugin: &str, key: &str) -> Option<&T>
    where
        T: Any + Send + Sync,
    {
        self.plugin_slot(plugin).and_then(|slot| slot.get::<T>(key))
    }
}
