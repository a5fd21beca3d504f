//! Error types for view synchronization.

use crate::types::{SubscriptionId, ViewDescriptor};
use thiserror::Error;

/// Errors raised while parsing or resolving a path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("Invalid path: {path} (failed at segment {position})")]
    InvalidPath { path: String, position: usize },

    #[error("Empty segment in path: {0:?}")]
    EmptySegment(String),
}

/// Errors raised while applying a change notification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    #[error("Cannot parse patch path {path:?}: {source}")]
    Parse { path: String, source: PathError },

    #[error("Cannot apply patch at {path:?}: {source}")]
    Apply { path: String, source: PathError },
}

/// Errors raised by a view transport.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    #[error("View not found: {0}")]
    ViewNotFound(ViewDescriptor),

    #[error("Unknown subscription: {0}")]
    UnknownSubscription(SubscriptionId),

    #[error("Request cancelled before a response arrived")]
    Cancelled,

    #[error("Remote error: {0}")]
    Remote(String),
}

/// Errors raised while simulating a move.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error("Locator does not address a record: {0}")]
    NotARecord(String),

    #[error("Tray item not found: {0}")]
    TrayItemNotFound(String),

    #[error("No tray configured for this layout")]
    NoTray,

    #[error("Expected a list at {0}")]
    NotAList(String),

    #[error("Index {index} out of bounds at {container} (len {len})")]
    IndexOutOfBounds {
        container: String,
        index: usize,
        len: usize,
    },

    #[error("Malformed tray entry: {0}")]
    MalformedTrayEntry(String),
}

/// Main error type for view synchronization.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Patch(#[from] PatchError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Simulation(#[from] SimulationError),

    #[error("Action {action} failed: {message}")]
    ActionFailed { action: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for SyncError {
    fn from(e: serde_json::Error) -> Self {
        SyncError::Serialization(e.to_string())
    }
}

/// Result type for view synchronization.
pub type Result<T> = std::result::Result<T, SyncError>;
