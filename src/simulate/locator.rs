//! Move requests and the slots they address.

use crate::path::{Path, PathSegment};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One end of a move.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Locator {
    /// A location in the snapshot: `container` is a list when `index` is
    /// set, otherwise a single-valued well (possibly `null`).
    Slot {
        container: Path,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
    },
    /// The pool of unplaced items, addressed by item identity.
    Tray { item: String },
}

impl Locator {
    /// Position `index` of the list at `container`.
    pub fn list(container: Path, index: usize) -> Self {
        Locator::Slot {
            container,
            index: Some(index),
        }
    }

    /// The single-valued well at `container`.
    pub fn well(container: Path) -> Self {
        Locator::Slot {
            container,
            index: None,
        }
    }

    pub fn tray(item: impl Into<String>) -> Self {
        Locator::Tray { item: item.into() }
    }

    pub fn is_tray(&self) -> bool {
        matches!(self, Locator::Tray { .. })
    }
}

/// A drag-and-drop style move.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub from: Locator,
    pub to: Locator,
    /// Exchange with the destination's occupant instead of inserting.
    #[serde(default)]
    pub swap: bool,
}

impl MoveRequest {
    pub fn new(from: Locator, to: Locator, swap: bool) -> Self {
        Self { from, to, swap }
    }

    /// The move that undoes a swap.
    pub fn inverse(&self) -> Self {
        Self {
            from: self.to.clone(),
            to: self.from.clone(),
            swap: self.swap,
        }
    }
}

/// Rebuilt records keyed by their key in the records collection.
pub type ChangedRecords = BTreeMap<PathSegment, Value>;
