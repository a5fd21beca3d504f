//! In-process view host.
//!
//! Holds the authoritative snapshot of each registered view, answers
//! subscribe requests from it, and publishes every applied update on the
//! notification bus. Useful when server and consumers share a process, and
//! as the far end of the protocol in tests.

use crate::error::{Result, TransportError};
use crate::patch::apply_updated_paths;
use crate::subscriptions::{NotificationBus, SubscribeResponder, ViewTransport};
use crate::types::{ChangeNotification, SubscriptionId, ViewDescriptor, ViewsChanged};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

struct HostedView {
    descriptor: ViewDescriptor,
    snapshot: Value,
}

#[derive(Default)]
struct HostState {
    /// Descriptors are not hashable; views are found by structural equality.
    views: Vec<HostedView>,
    subscriptions: HashMap<SubscriptionId, ViewDescriptor>,
}

impl HostState {
    fn position(&self, descriptor: &ViewDescriptor) -> Option<usize> {
        self.views.iter().position(|v| v.descriptor == *descriptor)
    }

    fn has_subscribers(&self, descriptor: &ViewDescriptor) -> bool {
        self.subscriptions.values().any(|d| d == descriptor)
    }
}

/// Authoritative views served to in-process subscribers.
pub struct LocalViewHost {
    state: RwLock<HostState>,
    next_id: AtomicU64,
    bus: Arc<NotificationBus>,
}

impl LocalViewHost {
    pub fn new(bus: Arc<NotificationBus>) -> Self {
        Self {
            state: RwLock::new(HostState::default()),
            next_id: AtomicU64::new(1),
            bus,
        }
    }

    /// Register a view, or replace the snapshot of an existing one.
    ///
    /// Replacing a subscribed view publishes a whole-value replacement.
    pub fn register_view(&self, descriptor: ViewDescriptor, snapshot: Value) {
        let publish = {
            let mut state = self.state.write();
            match state.position(&descriptor) {
                Some(pos) => state.views[pos].snapshot = snapshot.clone(),
                None => state.views.push(HostedView {
                    descriptor: descriptor.clone(),
                    snapshot: snapshot.clone(),
                }),
            }
            state.has_subscribers(&descriptor)
        };

        if publish {
            self.bus
                .publish(ViewsChanged::single(ChangeNotification::replace_all(descriptor, snapshot)));
        }
    }

    /// Stop serving a view. Existing subscriptions stay registered but see no more updates.
    pub fn remove_view(&self, descriptor: &ViewDescriptor) -> Option<Value> {
        let mut state = self.state.write();
        let pos = state.position(descriptor)?;
        Some(state.views.remove(pos).snapshot)
    }

    /// Current authoritative snapshot of a view.
    pub fn view(&self, descriptor: &ViewDescriptor) -> Option<Value> {
        let state = self.state.read();
        state.position(descriptor).map(|pos| state.views[pos].snapshot.clone())
    }

    /// Number of live subscriptions across all views.
    pub fn subscription_count(&self) -> usize {
        self.state.read().subscriptions.len()
    }

    /// Number of live subscriptions for one view.
    pub fn subscribers_of(&self, descriptor: &ViewDescriptor) -> usize {
        self.state
            .read()
            .subscriptions
            .values()
            .filter(|d| *d == descriptor)
            .count()
    }

    /// Apply path-addressed writes to a hosted view and notify subscribers.
    pub fn update_view(&self, descriptor: &ViewDescriptor, updated_paths: Map<String, Value>) -> Result<()> {
        self.publish_batch(vec![ChangeNotification::new(descriptor.clone(), updated_paths)])
    }

    /// Apply several changes and publish them as one event.
    ///
    /// Either every change applies or none does.
    pub fn publish_batch(&self, changes: Vec<ChangeNotification>) -> Result<()> {
        let event = {
            let mut state = self.state.write();

            let mut staged: Vec<(usize, Value)> = Vec::with_capacity(changes.len());
            for change in &changes {
                let pos = state
                    .position(&change.descriptor)
                    .ok_or_else(|| TransportError::ViewNotFound(change.descriptor.clone()))?;
                // later changes to the same view build on earlier ones
                let base = staged
                    .iter()
                    .rev()
                    .find(|entry| entry.0 == pos)
                    .map(|entry| &entry.1)
                    .unwrap_or(&state.views[pos].snapshot);
                let next = apply_updated_paths(base, &change.updated_paths)?;
                staged.push((pos, next));
            }
            for (pos, snapshot) in staged {
                state.views[pos].snapshot = snapshot;
            }

            let changes: Vec<ChangeNotification> = changes
                .into_iter()
                .filter(|change| state.has_subscribers(&change.descriptor))
                .collect();
            ViewsChanged { changes }
        };

        self.bus.publish(event);
        Ok(())
    }
}

impl ViewTransport for LocalViewHost {
    fn subscribe(&self, descriptor: &ViewDescriptor, responder: SubscribeResponder) {
        let answer = {
            let mut state = self.state.write();
            match state.position(descriptor) {
                Some(pos) => {
                    let snapshot = state.views[pos].snapshot.clone();
                    let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
                    state.subscriptions.insert(id, descriptor.clone());
                    Ok((id, snapshot))
                }
                None => Err(TransportError::ViewNotFound(descriptor.clone())),
            }
        };

        // answer outside the lock: a late answer may call back into unsubscribe
        match answer {
            Ok((id, snapshot)) => {
                debug!(subscription = id.0, view = %descriptor, "subscription opened");
                responder.succeed(id, snapshot);
            }
            Err(error) => responder.fail(error),
        }
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        match self.state.write().subscriptions.remove(&id) {
            Some(descriptor) => debug!(subscription = id.0, view = %descriptor, "subscription closed"),
            None => debug!(subscription = id.0, "unsubscribe for unknown subscription"),
        }
    }
}
