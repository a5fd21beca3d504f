//! Read, write and clone primitives over JSON trees.

use super::segment::{Path, PathSegment};
use crate::error::PathError;
use serde_json::{Map, Value};

fn invalid(path: &[PathSegment], position: usize) -> PathError {
    PathError::InvalidPath {
        path: Path::from(path.to_vec()).to_string(),
        position,
    }
}

/// Map keys are strings; an index segment addresses the key of the same spelling.
fn map_key(segment: &PathSegment) -> String {
    match segment {
        PathSegment::Key(key) => key.clone(),
        PathSegment::Index(index) => index.to_string(),
    }
}

fn child<'a>(node: &'a Value, segment: &PathSegment) -> Option<&'a Value> {
    match (node, segment) {
        (Value::Object(map), PathSegment::Key(key)) => map.get(key),
        (Value::Object(map), PathSegment::Index(index)) => map.get(&index.to_string()),
        (Value::Array(items), PathSegment::Index(index)) => items.get(*index),
        _ => None,
    }
}

fn child_mut<'a>(node: &'a mut Value, segment: &PathSegment) -> Option<&'a mut Value> {
    match (node, segment) {
        (Value::Object(map), PathSegment::Key(key)) => map.get_mut(key),
        (Value::Object(map), PathSegment::Index(index)) => map.get_mut(&index.to_string()),
        (Value::Array(items), PathSegment::Index(index)) => items.get_mut(*index),
        _ => None,
    }
}

/// Resolve `path` in `tree`.
///
/// Every segment must address an existing key or an in-bounds index.
pub fn get_path<'a>(tree: &'a Value, path: &[PathSegment]) -> Result<&'a Value, PathError> {
    let mut current = tree;
    for (position, segment) in path.iter().enumerate() {
        current = child(current, segment).ok_or_else(|| invalid(path, position))?;
    }
    Ok(current)
}

/// Mutable variant of [`get_path`].
pub fn get_path_mut<'a>(
    tree: &'a mut Value,
    path: &[PathSegment],
) -> Result<&'a mut Value, PathError> {
    let mut current = tree;
    for (position, segment) in path.iter().enumerate() {
        current = child_mut(current, segment).ok_or_else(|| invalid(path, position))?;
    }
    Ok(current)
}

/// Return a copy of `tree` with the value at `path` replaced by `value`.
///
/// An empty path returns `value`. Containers along the path are rebuilt with
/// their kind preserved and untouched siblings copied across; `tree` itself
/// is never modified. Every segment but the last must resolve. The last may
/// also name a new map key or the index one past the end of a sequence,
/// which appends.
pub fn update_path(tree: &Value, path: &[PathSegment], value: Value) -> Result<Value, PathError> {
    rebuild(tree, path, 0, value)
}

fn rebuild(
    node: &Value,
    path: &[PathSegment],
    position: usize,
    value: Value,
) -> Result<Value, PathError> {
    let Some(segment) = path.get(position) else {
        return Ok(value);
    };
    let is_last = position + 1 == path.len();

    match node {
        Value::Object(map) => {
            let key = map_key(segment);
            let replaced = match map.get(&key) {
                Some(existing) => rebuild(existing, path, position + 1, value)?,
                None if is_last => value,
                None => return Err(invalid(path, position)),
            };

            let mut out = Map::new();
            let mut replaced = Some(replaced);
            for (k, v) in map {
                if *k == key {
                    if let Some(new_value) = replaced.take() {
                        out.insert(k.clone(), new_value);
                    }
                } else {
                    out.insert(k.clone(), v.clone());
                }
            }
            if let Some(new_value) = replaced {
                out.insert(key, new_value);
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => {
            let index = segment.as_index().ok_or_else(|| invalid(path, position))?;
            if index < items.len() {
                let replaced = rebuild(&items[index], path, position + 1, value)?;
                let mut out = Vec::with_capacity(items.len());
                out.extend_from_slice(&items[..index]);
                out.push(replaced);
                out.extend_from_slice(&items[index + 1..]);
                Ok(Value::Array(out))
            } else if index == items.len() && is_last {
                let mut out = Vec::with_capacity(items.len() + 1);
                out.extend_from_slice(items);
                out.push(value);
                Ok(Value::Array(out))
            } else {
                Err(invalid(path, position))
            }
        }
        _ => Err(invalid(path, position)),
    }
}

/// Owned variant of [`update_path`] that edits `tree` in place and returns it.
///
/// On error the tree is consumed; callers that need the original must keep
/// their own copy.
pub fn update_path_owned(
    mut tree: Value,
    path: &[PathSegment],
    value: Value,
) -> Result<Value, PathError> {
    let Some((last, parents)) = path.split_last() else {
        return Ok(value);
    };

    let parent = get_path_mut(&mut tree, parents)?;
    match parent {
        Value::Object(map) => {
            map.insert(map_key(last), value);
        }
        Value::Array(items) => match last.as_index() {
            Some(index) if index < items.len() => items[index] = value,
            Some(index) if index == items.len() => items.push(value),
            _ => return Err(invalid(path, parents.len())),
        },
        _ => return Err(invalid(path, parents.len())),
    }
    Ok(tree)
}

/// Deep, independent copy of a tree.
pub fn clone_tree(tree: &Value) -> Value {
    tree.clone()
}
