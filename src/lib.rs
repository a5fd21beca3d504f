//! # View Sync
//!
//! Client-side synchronization of server-held views, with speculative
//! moves computed locally before the server confirms them.
//!
//! ## Core Concepts
//!
//! - **Paths**: Dot-separated addresses into JSON trees, parsed into typed segments
//! - **Patches**: Batches of path-addressed writes applied copy-on-write
//! - **Subscriptions**: One consumer's live snapshot of one view
//! - **Simulation**: The records a drag-and-drop move would change
//!
//! ## Example
//!
//! ```ignore
//! use viewsync::{LocalViewHost, NotificationBus, SubscriptionConfig, ViewDescriptor, ViewSubscription};
//!
//! let bus = Arc::new(NotificationBus::new());
//! let host = Arc::new(LocalViewHost::new(bus.clone()));
//! host.register_view(ViewDescriptor::from(json!({"type": "Draw", "uuid": "r1"})), json!({"debates": []}));
//!
//! let mut view = ViewSubscription::mount(
//!     host.clone(),
//!     bus.clone(),
//!     ViewDescriptor::from(json!({"type": "Draw", "uuid": "r1"})),
//!     SubscriptionConfig::default(),
//! );
//!
//! host.update_view(view.descriptor(), updated_paths)?;
//! view.poll();
//! ```

pub mod action;
pub mod error;
pub mod host;
pub mod patch;
pub mod path;
pub mod simulate;
pub mod subscriptions;
pub mod types;

// Re-exports
pub use action::{execute_action, ActionExecutor, ActionRequest, ActionResult, UPDATE_DRAW};
pub use error::{PatchError, PathError, Result, SimulationError, SyncError, TransportError};
pub use host::LocalViewHost;
pub use patch::{apply_entry, apply_notification, apply_updated_paths, parse_updated_paths, PatchEntry};
pub use path::{
    clone_tree, get_path, get_path_mut, update_path, update_path_owned, PatchTarget, Path,
    PathSegment, ROOT_PATH,
};
pub use simulate::{
    simulate_move, try_simulate_move, ChangedRecords, DrawLayout, Locator, MoveRequest,
    TrayLayout, TrayPlacement, TrayRole,
};
pub use subscriptions::{
    BusConfig, BusListener, ListenerId, NotificationBus, NotificationSource, PollOutcome,
    SubscribeResponder, SubscriptionConfig, SubscriptionHandle, SubscriptionPhase,
    ViewSubscription, ViewTransport,
};
pub use types::*;
