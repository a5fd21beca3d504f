//! Applying change notifications to snapshots.
//!
//! A notification carries a map from dot-string paths to new values. The
//! whole batch is applied to a private copy of the snapshot; if any entry
//! fails to parse or resolve, the batch is rejected and the caller keeps the
//! snapshot it already had.

use crate::error::PatchError;
use crate::path::{update_path_owned, PatchTarget};
use crate::types::ChangeNotification;
use serde_json::{Map, Value};

/// One parsed entry of a notification.
#[derive(Clone, Debug, PartialEq)]
pub struct PatchEntry {
    pub target: PatchTarget,
    pub value: Value,
}

/// Parse `updated_paths` into entries in application order.
///
/// Entries are ordered by ascending depth, whole-value replacement first;
/// ties keep the map's iteration order. A write to an ancestor therefore
/// always lands before writes to its descendants.
pub fn parse_updated_paths(updated_paths: &Map<String, Value>) -> Result<Vec<PatchEntry>, PatchError> {
    let mut entries = updated_paths
        .iter()
        .map(|(path, value)| {
            let target = PatchTarget::parse(path).map_err(|source| PatchError::Parse {
                path: path.clone(),
                source,
            })?;
            Ok(PatchEntry {
                target,
                value: value.clone(),
            })
        })
        .collect::<Result<Vec<_>, PatchError>>()?;

    // stable sort keeps map order among equal depths
    entries.sort_by_key(|entry| entry.target.depth());
    Ok(entries)
}

/// Apply a single parsed entry, consuming the tree.
pub fn apply_entry(tree: Value, entry: PatchEntry) -> Result<Value, PatchError> {
    match entry.target {
        PatchTarget::Root => Ok(entry.value),
        PatchTarget::Path(path) => {
            update_path_owned(tree, path.segments(), entry.value).map_err(|source| {
                PatchError::Apply {
                    path: path.to_string(),
                    source,
                }
            })
        }
    }
}

/// Apply a map of path-addressed writes to `snapshot`, returning the new snapshot.
pub fn apply_updated_paths(
    snapshot: &Value,
    updated_paths: &Map<String, Value>,
) -> Result<Value, PatchError> {
    let entries = parse_updated_paths(updated_paths)?;

    // A root replacement discards everything before it; skip the copy.
    let start = if matches!(entries.first(), Some(e) if e.target == PatchTarget::Root) {
        Value::Null
    } else {
        snapshot.clone()
    };

    entries.into_iter().try_fold(start, apply_entry)
}

/// Apply one notification to `snapshot`.
///
/// The descriptor is not checked here; filtering is the subscriber's job.
pub fn apply_notification(
    snapshot: &Value,
    notification: &ChangeNotification,
) -> Result<Value, PatchError> {
    apply_updated_paths(snapshot, &notification.updated_paths)
}
