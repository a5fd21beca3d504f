//! Local effect of a move on one or two records.

use super::locator::{ChangedRecords, Locator, MoveRequest};
use super::tray::{DrawLayout, TrayPlacement};
use crate::error::SimulationError;
use crate::path::{clone_tree, get_path, update_path, Path, PathSegment};
use serde_json::Value;
use tracing::{debug, warn};

/// A slot container split into the record that owns it and the path inside it.
struct RecordRef {
    key: PathSegment,
    inner: Path,
}

impl RecordRef {
    fn parse(layout: &DrawLayout, container: &Path) -> Result<Self, SimulationError> {
        match (container.get(0), container.get(1)) {
            (Some(PathSegment::Key(records)), Some(key)) if *records == layout.records_key => {
                Ok(Self {
                    key: key.clone(),
                    inner: container.skip(2),
                })
            }
            _ => Err(SimulationError::NotARecord(container.to_string())),
        }
    }
}

/// Copies of the touched records, rebuilt as writes come in.
struct Workspace<'a> {
    snapshot: &'a Value,
    layout: &'a DrawLayout,
    records: ChangedRecords,
}

impl<'a> Workspace<'a> {
    fn new(snapshot: &'a Value, layout: &'a DrawLayout) -> Self {
        Self {
            snapshot,
            layout,
            records: ChangedRecords::new(),
        }
    }

    fn read(&self, container: &Path) -> Result<Value, SimulationError> {
        Ok(clone_tree(get_path(self.snapshot, container.segments())?))
    }

    fn write(&mut self, target: &RecordRef, value: Value) -> Result<(), SimulationError> {
        let record = match self.records.get(&target.key) {
            Some(record) => record,
            None => get_path(
                self.snapshot,
                &[
                    PathSegment::Key(self.layout.records_key.clone()),
                    target.key.clone(),
                ],
            )?,
        };
        let rebuilt = update_path(record, target.inner.segments(), value)?;
        self.records.insert(target.key.clone(), rebuilt);
        Ok(())
    }

    fn finish(self) -> ChangedRecords {
        self.records
    }
}

fn into_list(value: Value, container: &Path) -> Result<Vec<Value>, SimulationError> {
    match value {
        Value::Array(items) => Ok(items),
        _ => Err(SimulationError::NotAList(container.to_string())),
    }
}

fn check_index(container: &Path, index: usize, len: usize) -> Result<(), SimulationError> {
    if index < len {
        Ok(())
    } else {
        Err(SimulationError::IndexOutOfBounds {
            container: container.to_string(),
            index,
            len,
        })
    }
}

/// Compute the records a move would change, without touching `snapshot`.
///
/// Returns zero, one or two records keyed by their key in the records
/// collection. Moves that cannot be resolved yield an empty map.
pub fn simulate_move(snapshot: &Value, request: &MoveRequest, layout: &DrawLayout) -> ChangedRecords {
    match try_simulate_move(snapshot, request, layout) {
        Ok(changed) => changed,
        Err(SimulationError::TrayItemNotFound(item)) => {
            warn!(item = %item, "tray item not found, move ignored");
            ChangedRecords::new()
        }
        Err(error) => {
            debug!(%error, ?request, "move could not be simulated");
            ChangedRecords::new()
        }
    }
}

/// Like [`simulate_move`] but reports why a move could not be simulated.
pub fn try_simulate_move(
    snapshot: &Value,
    request: &MoveRequest,
    layout: &DrawLayout,
) -> Result<ChangedRecords, SimulationError> {
    let swap = request.swap;

    let from = match &request.from {
        Locator::Tray { item } => {
            if request.to.is_tray() {
                return Ok(ChangedRecords::new());
            }
            let tray = layout.tray.as_ref().ok_or(SimulationError::NoTray)?;
            match tray.resolve(snapshot, &layout.records_key, item)? {
                TrayPlacement::Unplaced(value) => {
                    return place_from_tray(snapshot, layout, value, &request.to, swap);
                }
                TrayPlacement::Placed(slot) => slot,
            }
        }
        slot => slot.clone(),
    };

    let Locator::Slot {
        container: from_container,
        index: from_index,
    } = &from
    else {
        return Ok(ChangedRecords::new());
    };

    match &request.to {
        Locator::Tray { .. } => remove_to_tray(snapshot, layout, from_container, *from_index),
        Locator::Slot {
            container: to_container,
            index: to_index,
        } => move_between_slots(
            snapshot,
            layout,
            (from_container, *from_index),
            (to_container, *to_index),
            swap,
        ),
    }
}

fn place_from_tray(
    snapshot: &Value,
    layout: &DrawLayout,
    item: Value,
    to: &Locator,
    swap: bool,
) -> Result<ChangedRecords, SimulationError> {
    let Locator::Slot { container, index } = to else {
        return Ok(ChangedRecords::new());
    };
    let target = RecordRef::parse(layout, container)?;
    let mut workspace = Workspace::new(snapshot, layout);

    let placed = match index {
        Some(index) => {
            let mut items = into_list(workspace.read(container)?, container)?;
            if swap && *index < items.len() {
                items[*index] = item;
            } else {
                let at = (*index).min(items.len());
                items.insert(at, item);
            }
            Value::Array(items)
        }
        None => item,
    };

    workspace.write(&target, placed)?;
    Ok(workspace.finish())
}

fn remove_to_tray(
    snapshot: &Value,
    layout: &DrawLayout,
    container: &Path,
    index: Option<usize>,
) -> Result<ChangedRecords, SimulationError> {
    let source = RecordRef::parse(layout, container)?;
    let mut workspace = Workspace::new(snapshot, layout);

    let remaining = match index {
        Some(index) => {
            let mut items = into_list(workspace.read(container)?, container)?;
            check_index(container, index, items.len())?;
            items.remove(index);
            Value::Array(items)
        }
        None => Value::Null,
    };

    workspace.write(&source, remaining)?;
    Ok(workspace.finish())
}

fn move_between_slots(
    snapshot: &Value,
    layout: &DrawLayout,
    (from_container, from_index): (&Path, Option<usize>),
    (to_container, to_index): (&Path, Option<usize>),
    swap: bool,
) -> Result<ChangedRecords, SimulationError> {
    let source = RecordRef::parse(layout, from_container)?;
    let target = RecordRef::parse(layout, to_container)?;
    let mut workspace = Workspace::new(snapshot, layout);

    let from_value = workspace.read(from_container)?;
    let same_container = from_container == to_container;

    match (from_index, to_index) {
        (Some(from_index), Some(to_index)) if same_container => {
            let mut items = into_list(from_value, from_container)?;
            check_index(from_container, from_index, items.len())?;
            if swap {
                check_index(to_container, to_index, items.len())?;
                items.swap(from_index, to_index);
            } else if from_index < to_index {
                // insert first so `to_index` still refers to the pre-move list
                let at = to_index.min(items.len());
                let moved = items[from_index].clone();
                items.insert(at, moved);
                items.remove(from_index);
            } else {
                let moved = items.remove(from_index);
                items.insert(to_index, moved);
            }
            workspace.write(&source, Value::Array(items))?;
        }
        (Some(from_index), Some(to_index)) => {
            let mut source_items = into_list(from_value, from_container)?;
            let mut target_items = into_list(workspace.read(to_container)?, to_container)?;
            check_index(from_container, from_index, source_items.len())?;
            if swap {
                check_index(to_container, to_index, target_items.len())?;
                std::mem::swap(&mut source_items[from_index], &mut target_items[to_index]);
            } else {
                let moved = source_items.remove(from_index);
                let at = to_index.min(target_items.len());
                target_items.insert(at, moved);
            }
            workspace.write(&source, Value::Array(source_items))?;
            workspace.write(&target, Value::Array(target_items))?;
        }
        (None, Some(to_index)) => {
            if from_value.is_null() {
                // nothing to drop; a null never lands in a list
                debug!(from = %from_container, "move from an empty well ignored");
                return Ok(ChangedRecords::new());
            }
            let mut target_items = into_list(workspace.read(to_container)?, to_container)?;
            let displaced = if swap && to_index < target_items.len() {
                std::mem::replace(&mut target_items[to_index], from_value)
            } else {
                let at = to_index.min(target_items.len());
                target_items.insert(at, from_value);
                Value::Null
            };
            workspace.write(&source, displaced)?;
            workspace.write(&target, Value::Array(target_items))?;
        }
        (Some(from_index), None) => {
            let mut source_items = into_list(from_value, from_container)?;
            check_index(from_container, from_index, source_items.len())?;
            let to_value = workspace.read(to_container)?;
            let moved = if swap && !to_value.is_null() {
                std::mem::replace(&mut source_items[from_index], to_value)
            } else {
                source_items.remove(from_index)
            };
            workspace.write(&source, Value::Array(source_items))?;
            workspace.write(&target, moved)?;
        }
        (None, None) => {
            let to_value = workspace.read(to_container)?;
            workspace.write(&source, to_value)?;
            workspace.write(&target, from_value)?;
        }
    }

    Ok(workspace.finish())
}
