//! View subscriptions kept in sync with server-pushed patches.
//!
//! A [`ViewSubscription`] owns the snapshot of one view for one consumer:
//! - Sends the subscribe request through a [`ViewTransport`]
//! - Filters the shared [`NotificationBus`] for its own descriptor
//! - Folds matching notifications into the snapshot in arrival order
//! - Releases the server-side subscription on teardown, including one whose
//!   response arrives after the consumer is gone
//!
//! # Example
//!
//! ```ignore
//! let bus = Arc::new(NotificationBus::new());
//! let mut draw = ViewSubscription::mount(
//!     transport,
//!     bus.clone(),
//!     ViewDescriptor::new("Draw", [("uuid".to_string(), json!(round_id))]),
//!     SubscriptionConfig::with_default(json!({"debates": []})),
//! );
//!
//! // In the event loop
//! if draw.poll().changed() {
//!     render(draw.snapshot());
//! }
//! ```

mod bus;
mod manager;
mod transport;
mod types;

pub use bus::{BusListener, ListenerId, NotificationBus, NotificationSource};
pub use manager::ViewSubscription;
pub use transport::{SubscribeResponder, ViewTransport};
pub use types::{BusConfig, PollOutcome, SubscriptionConfig, SubscriptionHandle, SubscriptionPhase};
