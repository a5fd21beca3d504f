//! Shared in-process notification bus.

use crate::types::ViewsChanged;
use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

use super::types::BusConfig;

/// Identifier of one bus listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Receiving end of a bus registration.
pub struct BusListener {
    pub id: ListenerId,
    receiver: Receiver<ViewsChanged>,
}

impl BusListener {
    pub fn new(id: ListenerId, receiver: Receiver<ViewsChanged>) -> Self {
        Self { id, receiver }
    }

    /// Try to receive an event (non-blocking).
    pub fn try_recv(&self) -> Result<ViewsChanged, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Result<ViewsChanged, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}

/// Anything consumers can register with to receive change batches.
///
/// The bus below is the in-process implementation; a socket or IPC bridge
/// only needs to hand out listeners fed from its own source.
pub trait NotificationSource: Send + Sync {
    fn listen(&self) -> BusListener;
    fn unlisten(&self, id: ListenerId);
}

/// Fans every published batch out to all registered listeners.
///
/// Listeners filter for themselves; the bus does not look at descriptors.
pub struct NotificationBus {
    listeners: RwLock<HashMap<ListenerId, Sender<ViewsChanged>>>,
    next_id: AtomicU64,
    config: BusConfig,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::with_config(BusConfig::default())
    }

    pub fn with_config(config: BusConfig) -> Self {
        Self {
            listeners: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            config,
        }
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Publish a batch to every listener. Listeners that cannot keep up are dropped.
    pub fn publish(&self, event: ViewsChanged) {
        if event.is_empty() {
            return;
        }

        let mut to_remove = Vec::new();
        {
            let listeners = self.listeners.read();
            for (id, sender) in listeners.iter() {
                if sender.try_send(event.clone()).is_err() {
                    to_remove.push(*id);
                }
            }
        }

        if !to_remove.is_empty() {
            let mut listeners = self.listeners.write();
            for id in to_remove {
                if listeners.remove(&id).is_some() {
                    warn!(listener = id.0, "dropping listener that fell behind");
                }
            }
        }
    }
}

impl NotificationSource for NotificationBus {
    fn listen(&self) -> BusListener {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (sender, receiver) = bounded(self.config.buffer_size);
        self.listeners.write().insert(id, sender);
        debug!(listener = id.0, "listener registered");
        BusListener::new(id, receiver)
    }

    fn unlisten(&self, id: ListenerId) {
        if self.listeners.write().remove(&id).is_some() {
            debug!(listener = id.0, "listener removed");
        }
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new()
    }
}
