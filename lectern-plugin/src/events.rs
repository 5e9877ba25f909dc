//! Host notification channel
//!
//! The host publishes `ReaderInitialized` when it is ready; the controller
//! answers with `PluginsLoaded` once every plugin has had its attempt.

use tokio::sync::broadcast;

use crate::host::SharedHost;

/// Signals exchanged between the host and the plugins controller
#[derive(Debug, Clone)]
pub enum HostEvent {
    /// The reader is ready; carries the host to extend
    ReaderInitialized(SharedHost),
    /// Every registered plugin has attempted initialization
    PluginsLoaded,
}

impl HostEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ReaderInitialized(_) => "reader_initialized",
            Self::PluginsLoaded => "plugins_loaded",
        }
    }
}

/// Broadcast channel carrying [`HostEvent`]s
#[derive(Debug, Clone)]
pub struct HostEvents {
    sender: broadcast::Sender<HostEvent>,
}

impl HostEvents {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HostEvent> {
        self.sender.subscribe()
    }

    /// Publish an event, returning how many subscribers received it
    pub fn publish(&self, event: HostEvent) -> usize {
        let name = event.name();
        match self.sender.send(event) {
            Ok(receivers) => {
                tracing::debug!(target: "host_events", event = name, receivers, "Event published");
                receivers
            }
            Err(_) => {
                tracing::debug!(target: "host_events", event = name, "Event dropped, no subscribers");
                0
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for HostEvents {
    fn default() -> Self {
        Self::new(16)
    }
}
