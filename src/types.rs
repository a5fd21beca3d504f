//! Core types shared by subscriptions, patching and the view host.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Event name under which change batches are published.
pub const VIEWS_CHANGED_EVENT: &str = "views-changed";

/// Structured key naming a parameterized read query against server state.
///
/// Descriptors are compared by deep structural equality of their JSON form,
/// so `{"type": "Draw", "uuid": 1}` equals `{"uuid": 1, "type": "Draw"}`.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewDescriptor(Value);

impl ViewDescriptor {
    /// Build a descriptor from a `type` discriminant and extra parameters.
    pub fn new(kind: impl Into<String>, params: impl IntoIterator<Item = (String, Value)>) -> Self {
        let mut map = Map::new();
        map.insert("type".to_string(), Value::String(kind.into()));
        map.extend(params);
        ViewDescriptor(Value::Object(map))
    }

    /// Wrap an arbitrary JSON value.
    pub fn from_value(value: Value) -> Self {
        ViewDescriptor(value)
    }

    /// The `type` discriminant, if present.
    pub fn kind(&self) -> Option<&str> {
        self.0.get("type").and_then(Value::as_str)
    }

    /// Look up a parameter by name.
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for ViewDescriptor {
    fn from(value: Value) -> Self {
        ViewDescriptor(value)
    }
}

impl fmt::Debug for ViewDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "View({})", self.0)
    }
}

impl fmt::Display for ViewDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier issued by the transport for a live subscription.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

impl fmt::Debug for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubscriptionId({})", self.0)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Successful answer to a subscribe request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubscribeResponse {
    pub subscription_id: SubscriptionId,
    /// Snapshot of the view as of the subscription.
    pub snapshot: Value,
}

/// Sparse, path-addressed update for one view.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChangeNotification {
    #[serde(rename = "view", alias = "descriptor")]
    pub descriptor: ViewDescriptor,
    /// Dot-separated path strings mapped to their new values.
    pub updated_paths: Map<String, Value>,
}

impl ChangeNotification {
    pub fn new(descriptor: ViewDescriptor, updated_paths: Map<String, Value>) -> Self {
        Self {
            descriptor,
            updated_paths,
        }
    }

    /// A notification replacing the whole snapshot.
    pub fn replace_all(descriptor: ViewDescriptor, snapshot: Value) -> Self {
        let mut updated_paths = Map::new();
        updated_paths.insert(".".to_string(), snapshot);
        Self::new(descriptor, updated_paths)
    }
}

/// Payload of one `views-changed` event.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewsChanged {
    pub changes: Vec<ChangeNotification>,
}

impl ViewsChanged {
    pub fn single(change: ChangeNotification) -> Self {
        Self {
            changes: vec![change],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}
