//! Per-view subscription lifecycle.

use crate::error::TransportError;
use crate::patch::apply_notification;
use crate::types::{ChangeNotification, ViewDescriptor, ViewsChanged};
use crossbeam_channel::TryRecvError;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, trace, warn};

use super::bus::{BusListener, NotificationSource};
use super::transport::{SubscribeResponder, SubscribeSlot, ViewTransport};
use super::types::{PollOutcome, SubscriptionConfig, SubscriptionHandle, SubscriptionPhase};

/// Internal lifecycle state.
enum State {
    Unsubscribed,
    Subscribing { slot: Arc<SubscribeSlot> },
    Subscribed { handle: SubscriptionHandle },
    Disposed,
}

/// Keeps one consumer's snapshot of one view in sync with the server.
///
/// Owned by the consumer and driven from its event loop: call [`poll`]
/// whenever a subscribe response or a bus event may have arrived, and
/// [`teardown`] (or drop) when the consumer goes away.
///
/// [`poll`]: ViewSubscription::poll
/// [`teardown`]: ViewSubscription::teardown
pub struct ViewSubscription {
    transport: Arc<dyn ViewTransport>,
    source: Arc<dyn NotificationSource>,
    listener: Option<BusListener>,
    descriptor: ViewDescriptor,
    config: SubscriptionConfig,
    state: State,
    snapshot: Value,
    last_error: Option<TransportError>,
    /// The bus dropped our listener; the snapshot no longer follows the server.
    stale: bool,
}

impl ViewSubscription {
    /// Start listening for changes and send the subscribe request.
    pub fn mount(
        transport: Arc<dyn ViewTransport>,
        source: Arc<dyn NotificationSource>,
        descriptor: ViewDescriptor,
        config: SubscriptionConfig,
    ) -> Self {
        let listener = source.listen();
        let mut subscription = Self {
            transport,
            source,
            listener: Some(listener),
            snapshot: config.default_snapshot.clone(),
            descriptor,
            config,
            state: State::Unsubscribed,
            last_error: None,
            stale: false,
        };
        subscription.start_subscribe();
        subscription
    }

    /// Current snapshot, or the configured default before one arrives.
    pub fn snapshot(&self) -> &Value {
        &self.snapshot
    }

    pub fn descriptor(&self) -> &ViewDescriptor {
        &self.descriptor
    }

    pub fn phase(&self) -> SubscriptionPhase {
        match self.state {
            State::Unsubscribed => SubscriptionPhase::Unsubscribed,
            State::Subscribing { .. } => SubscriptionPhase::Subscribing,
            State::Subscribed { .. } => SubscriptionPhase::Subscribed,
            State::Disposed => SubscriptionPhase::Disposed,
        }
    }

    /// Live handle, present only while subscribed.
    pub fn handle(&self) -> Option<&SubscriptionHandle> {
        match &self.state {
            State::Subscribed { handle } => Some(handle),
            _ => None,
        }
    }

    /// Error of the last failed subscribe request.
    pub fn last_error(&self) -> Option<&TransportError> {
        self.last_error.as_ref()
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn is_disposed(&self) -> bool {
        matches!(self.state, State::Disposed)
    }

    /// Switch to another view.
    ///
    /// A structurally equal descriptor is a no-op. Otherwise the current
    /// subscription is released and a new one requested.
    pub fn set_descriptor(&mut self, descriptor: ViewDescriptor) {
        if self.is_disposed() {
            warn!(view = %descriptor, "descriptor change on a disposed subscription ignored");
            return;
        }
        if descriptor == self.descriptor {
            return;
        }

        debug!(from = %self.descriptor, to = %descriptor, "view descriptor changed");
        self.release();
        self.descriptor = descriptor;
        self.last_error = None;
        if self.config.reset_on_change {
            self.snapshot = self.config.default_snapshot.clone();
        }
        self.start_subscribe();
    }

    /// Adopt a pending subscribe response and apply queued notifications.
    ///
    /// Notifications are applied strictly in arrival order. Those for other
    /// descriptors are dropped; those arriving before the subscription is
    /// live are discarded, since the initial snapshot already reflects them
    /// or will.
    pub fn poll(&mut self) -> PollOutcome {
        let mut outcome = PollOutcome::default();
        if self.is_disposed() {
            return outcome;
        }

        outcome.adopted = self.adopt_response();

        for event in self.drain_listener() {
            for change in event.changes {
                self.handle_change(change, &mut outcome);
            }
        }

        outcome
    }

    /// Release everything. Safe to call more than once.
    ///
    /// The local transition is synchronous: once this returns no
    /// notification is applied, whatever the network unsubscribe does.
    pub fn teardown(&mut self) {
        if self.is_disposed() {
            return;
        }

        self.release();
        if let Some(listener) = self.listener.take() {
            self.source.unlisten(listener.id);
        }
        self.snapshot = self.config.default_snapshot.clone();
        self.state = State::Disposed;
        debug!(view = %self.descriptor, "subscription disposed");
    }

    fn start_subscribe(&mut self) {
        let slot = SubscribeSlot::new();
        self.state = State::Subscribing { slot: slot.clone() };

        let responder = SubscribeResponder::new(
            slot,
            self.transport.clone(),
            self.descriptor.clone(),
        );
        debug!(view = %self.descriptor, "subscribing");
        self.transport.subscribe(&self.descriptor, responder);

        // transports may answer synchronously
        self.adopt_response();
    }

    /// Give up the current handle or in-flight request.
    fn release(&mut self) {
        match std::mem::replace(&mut self.state, State::Unsubscribed) {
            State::Subscribing { slot } => {
                if let Some(id) = slot.dispose() {
                    self.transport.unsubscribe(id);
                }
            }
            State::Subscribed { handle } => {
                debug!(subscription = handle.id.0, view = %handle.descriptor, "unsubscribing");
                self.transport.unsubscribe(handle.id);
            }
            State::Unsubscribed => {}
            State::Disposed => self.state = State::Disposed,
        }
    }

    fn adopt_response(&mut self) -> bool {
        let ready = match &self.state {
            State::Subscribing { slot } => slot.take_ready(),
            _ => None,
        };

        match ready {
            Some(Ok(response)) => {
                debug!(
                    subscription = response.subscription_id.0,
                    view = %self.descriptor,
                    "subscribed"
                );
                self.snapshot = response.snapshot;
                self.state = State::Subscribed {
                    handle: SubscriptionHandle {
                        id: response.subscription_id,
                        descriptor: self.descriptor.clone(),
                    },
                };
                true
            }
            Some(Err(error)) => {
                warn!(view = %self.descriptor, %error, "subscribe failed, keeping default value");
                self.last_error = Some(error);
                self.state = State::Unsubscribed;
                false
            }
            None => false,
        }
    }

    fn drain_listener(&mut self) -> Vec<ViewsChanged> {
        let mut events = Vec::new();
        let Some(listener) = self.listener.as_ref() else {
            return events;
        };

        loop {
            match listener.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.stale {
                        warn!(view = %self.descriptor, "notification listener lost, snapshot is stale");
                        self.stale = true;
                    }
                    break;
                }
            }
        }
        events
    }

    fn handle_change(&mut self, change: ChangeNotification, outcome: &mut PollOutcome) {
        if change.descriptor != self.descriptor {
            trace!(view = %change.descriptor, "notification for another view");
            outcome.filtered += 1;
            return;
        }
        if !matches!(self.state, State::Subscribed { .. }) {
            debug!(view = %self.descriptor, "notification before subscription is live, discarded");
            outcome.discarded += 1;
            return;
        }

        match apply_notification(&self.snapshot, &change) {
            Ok(next) => {
                self.snapshot = next;
                outcome.applied += 1;
            }
            Err(error) => {
                warn!(view = %self.descriptor, %error, "rejected change notification");
                outcome.rejected += 1;
            }
        }
    }
}

impl Drop for ViewSubscription {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscriptions::NotificationBus;
    use crate::types::SubscriptionId;
    use parking_lot::Mutex;
    use serde_json::json;

    /// Answers every subscribe immediately with a fixed snapshot.
    struct EagerTransport {
        snapshot: Value,
        next_id: Mutex<u64>,
        released: Mutex<Vec<SubscriptionId>>,
    }

    impl EagerTransport {
        fn new(snapshot: Value) -> Arc<Self> {
            Arc::new(Self {
                snapshot,
                next_id: Mutex::new(1),
                released: Mutex::new(Vec::new()),
            })
        }
    }

    impl ViewTransport for EagerTransport {
        fn subscribe(&self, _descriptor: &ViewDescriptor, responder: SubscribeResponder) {
            let id = {
                let mut next = self.next_id.lock();
                let id = *next;
                *next += 1;
                id
            };
            responder.succeed(SubscriptionId(id), self.snapshot.clone());
        }

        fn unsubscribe(&self, id: SubscriptionId) {
            self.released.lock().push(id);
        }
    }

    fn foo(id: u64) -> ViewDescriptor {
        ViewDescriptor::from(json!({"type": "Foo", "id": id}))
    }

    fn change(descriptor: ViewDescriptor, path: &str, value: Value) -> ViewsChanged {
        let mut updated_paths = serde_json::Map::new();
        updated_paths.insert(path.to_string(), value);
        ViewsChanged::single(ChangeNotification::new(descriptor, updated_paths))
    }

    #[test]
    fn test_synchronous_subscribe_is_adopted_on_mount() {
        let transport = EagerTransport::new(json!({"count": 1}));
        let bus = Arc::new(NotificationBus::new());

        let sub = ViewSubscription::mount(
            transport.clone(),
            bus.clone(),
            foo(1),
            SubscriptionConfig::default(),
        );

        assert_eq!(sub.phase(), SubscriptionPhase::Subscribed);
        assert_eq!(sub.snapshot(), &json!({"count": 1}));
        assert_eq!(sub.handle().unwrap().id, SubscriptionId(1));
    }

    #[test]
    fn test_filters_by_descriptor() {
        let transport = EagerTransport::new(json!({"count": 1}));
        let bus = Arc::new(NotificationBus::new());
        let mut sub = ViewSubscription::mount(
            transport.clone(),
            bus.clone(),
            foo(1),
            SubscriptionConfig::default(),
        );

        bus.publish(change(foo(2), "count", json!(99)));
        bus.publish(change(foo(1), "count", json!(2)));

        let outcome = sub.poll();
        assert_eq!(outcome.filtered, 1);
        assert_eq!(outcome.applied, 1);
        assert_eq!(sub.snapshot(), &json!({"count": 2}));
    }

    #[test]
    fn test_descriptor_change_resubscribes() {
        let transport = EagerTransport::new(json!({"count": 1}));
        let bus = Arc::new(NotificationBus::new());
        let mut sub = ViewSubscription::mount(
            transport.clone(),
            bus.clone(),
            foo(1),
            SubscriptionConfig::default(),
        );

        sub.set_descriptor(ViewDescriptor::from(json!({"id": 1, "type": "Foo"})));
        assert!(transport.released.lock().is_empty());

        sub.set_descriptor(foo(2));
        assert_eq!(*transport.released.lock(), vec![SubscriptionId(1)]);
        assert_eq!(sub.handle().unwrap().id, SubscriptionId(2));
        assert_eq!(sub.descriptor(), &foo(2));
    }

    #[test]
    fn test_teardown_is_idempotent() {
        let transport = EagerTransport::new(json!({}));
        let bus = Arc::new(NotificationBus::new());
        let mut sub = ViewSubscription::mount(
            transport.clone(),
            bus.clone(),
            foo(1),
            SubscriptionConfig::default(),
        );

        sub.teardown();
        sub.teardown();
        drop(sub);

        assert_eq!(*transport.released.lock(), vec![SubscriptionId(1)]);
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn test_rejected_patch_keeps_snapshot() {
        let transport = EagerTransport::new(json!({"items": [1]}));
        let bus = Arc::new(NotificationBus::new());
        let mut sub = ViewSubscription::mount(
            transport.clone(),
            bus.clone(),
            foo(1),
            SubscriptionConfig::default(),
        );

        bus.publish(change(foo(1), "items.7", json!(0)));
        let outcome = sub.poll();

        assert_eq!(outcome.rejected, 1);
        assert!(!outcome.changed());
        assert_eq!(sub.snapshot(), &json!({"items": [1]}));
    }
}
