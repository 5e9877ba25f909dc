//! Per-plugin capability object and its factory

use crate::host::{ExtensionSet, ReaderHost};

/// Capability object handed to one plugin's initializer
///
/// Bound to exactly one plugin and to the host the controller was readied
/// with. The only write it allows is into that plugin's own namespace slot.
pub struct PluginApi<'a> {
    plugin_name: &'a str,
    host: &'a mut ReaderHost,
}

impl<'a> PluginApi<'a> {
    pub fn plugin_name(&self) -> &str {
        self.plugin_name
    }

    /// Merge `extensions` into `host.plugins[plugin_name]`
    ///
    /// No-op when the host has no plugin namespace.
    pub fn extend_reader(&mut self, extensions: ExtensionSet) {
        match self.host.namespace_mut() {
            Some(namespace) => {
                tracing::debug!(
                    target: "plugin",
                    plugin = %self.plugin_name,
                    keys = extensions.len(),
                    "Extending reader"
                );
                namespace.extend(self.plugin_name, extensions);
            }
            None => {
                tracing::debug!(
                    target: "plugin",
                    plugin = %self.plugin_name,
                    "Reader has no plugin namespace, extension dropped"
                );
            }
        }
    }

    /// Read-only view of the host, e.g. to use a dependency's extensions
    pub fn reader(&self) -> &ReaderHost {
        &*self.host
    }
}

/// Builds a fresh [`PluginApi`] for every initialization attempt
pub struct PluginApiFactory<'h> {
    host: &'h mut ReaderHost,
}

impl<'h> PluginApiFactory<'h> {
    pub fn new(host: &'h mut ReaderHost) -> Self {
        Self { host }
    }

    pub fn create<'a>(&'a mut self, plugin_name: &'a str) -> PluginApi<'a> {
        PluginApi {
            plugin_name,
            host: &mut *self.host,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extend_reader_writes_own_slot() {
        let mut host = ReaderHost::new();
        host.attach_namespace().unwrap();

        {
            let mut factory = PluginApiFactory::new(&mut host);
            let mut api = factory.create("footnotes");
            assert_eq!(api.plugin_name(), "footnotes");
            api.extend_reader(ExtensionSet::new().with("count", 2usize));

            let mut api = factory.create("annotations");
            api.extend_reader(ExtensionSet::new().with("count", 5usize));
            assert_eq!(api.reader().extension::<usize>("footnotes", "count"), Some(&2));
        }

        assert_eq!(host.extension::<usize>("footnotes", "count"), Some(&2));
        assert_eq!(host.extension::<usize>("annotations", "count"), Some(&5));
    }

    #[test]
    fn test_extend_reader_without_namespace_is_noop() {
        let mut host = ReaderHost::new();

        {
            let mut factory = PluginApiFactory::new(&mut host);
            factory
                .create("footnotes")
                .extend_reader(ExtensionSet::new().with("count", 2usize));
        }

        assert!(!host.has_namespace());
        assert!(host.plugin_slot("footnotes").is_none());
    }
}
