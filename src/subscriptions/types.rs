//! Subscription types for view synchronization.

use crate::types::{SubscriptionId, ViewDescriptor};
use serde_json::{json, Value};

/// Configuration for a view subscription.
#[derive(Clone, Debug)]
pub struct SubscriptionConfig {
    /// Value exposed before the first snapshot arrives, and kept when
    /// subscribing fails.
    /// Default: `{}`
    pub default_snapshot: Value,

    /// Reset to `default_snapshot` when the descriptor changes, instead of
    /// showing the previous view's data until the new snapshot arrives.
    /// Default: true
    pub reset_on_change: bool,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            default_snapshot: json!({}),
            reset_on_change: true,
        }
    }
}

impl SubscriptionConfig {
    /// Config with a specific fallback value.
    pub fn with_default(default_snapshot: Value) -> Self {
        Self {
            default_snapshot,
            ..Default::default()
        }
    }
}

/// Configuration for the shared notification bus.
#[derive(Clone, Debug)]
pub struct BusConfig {
    /// Max buffered events per listener before the listener is dropped.
    /// Default: 1024
    pub buffer_size: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self { buffer_size: 1024 }
    }
}

/// Observable lifecycle phase of a [`ViewSubscription`](super::ViewSubscription).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubscriptionPhase {
    /// No request in flight and no live handle (initial, or after a failed subscribe).
    Unsubscribed,
    /// Subscribe request sent, response not yet adopted.
    Subscribing,
    /// Live handle held; notifications are being applied.
    Subscribed,
    /// Torn down; nothing will be applied again.
    Disposed,
}

/// Token for a live subscription, held only while subscribed.
#[derive(Clone, Debug, PartialEq)]
pub struct SubscriptionHandle {
    pub id: SubscriptionId,
    pub descriptor: ViewDescriptor,
}

/// What one call to `poll` did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PollOutcome {
    /// A subscribe response was adopted as the new snapshot.
    pub adopted: bool,
    /// Notifications folded into the snapshot.
    pub applied: usize,
    /// Notifications for other descriptors.
    pub filtered: usize,
    /// Matching notifications discarded because no snapshot was live yet.
    pub discarded: usize,
    /// Matching notifications that failed to apply.
    pub rejected: usize,
}

impl PollOutcome {
    /// Whether the exposed snapshot changed.
    pub fn changed(&self) -> bool {
        self.adopted || self.applied > 0
    }
}
