//! Snapshot layout and tray resolution.

use super::locator::Locator;
use crate::error::SimulationError;
use crate::path::Path;
use serde_json::Value;

/// How a tray position role maps onto a slot inside a record.
#[derive(Clone, Debug)]
pub struct TrayRole {
    /// Value of the role's `type` tag, e.g. `Panel`.
    pub role: String,
    /// Container path inside the record.
    pub container: Path,
    /// Whether the container is a list and the role carries a `position`.
    pub indexed: bool,
}

/// Where the auxiliary index of tray items lives and how to read it.
///
/// Entries look like
/// `{"adjudicator": {"uuid": ..}, "position": {"type": "NotSet"}}` or
/// `{"adjudicator": {..}, "position": {"type": "Set", "debate_index": 2,
/// "position": {"type": "Panel", "position": 1}}}`.
#[derive(Clone, Debug)]
pub struct TrayLayout {
    /// Top-level key of the index array.
    pub index_key: String,
    /// Key of the item inside an index entry.
    pub item_key: String,
    /// Identity field of the item.
    pub id_key: String,
    /// Key of the position inside an index entry.
    pub position_key: String,
    /// Key of the record index inside a `Set` position.
    pub record_index_key: String,
    pub roles: Vec<TrayRole>,
}

impl TrayLayout {
    /// Adjudicator tray of a draw view.
    pub fn adjudicators() -> Self {
        Self {
            index_key: "adjudicator_index".to_string(),
            item_key: "adjudicator".to_string(),
            id_key: "uuid".to_string(),
            position_key: "position".to_string(),
            record_index_key: "debate_index".to_string(),
            roles: vec![
                TrayRole {
                    role: "Panel".to_string(),
                    container: crate::path!["ballot", "adjudicators"],
                    indexed: true,
                },
                TrayRole {
                    role: "President".to_string(),
                    container: crate::path!["ballot", "president"],
                    indexed: false,
                },
            ],
        }
    }
}

impl Default for TrayLayout {
    fn default() -> Self {
        Self::adjudicators()
    }
}

/// Shape of the snapshot a simulation runs against.
#[derive(Clone, Debug)]
pub struct DrawLayout {
    /// Top-level key of the records collection; every slot container starts
    /// with this key followed by the record's key.
    pub records_key: String,
    pub tray: Option<TrayLayout>,
}

impl Default for DrawLayout {
    fn default() -> Self {
        Self {
            records_key: "debates".to_string(),
            tray: Some(TrayLayout::adjudicators()),
        }
    }
}

/// What a tray identity resolved to.
#[derive(Clone, Debug, PartialEq)]
pub enum TrayPlacement {
    /// Not placed anywhere; carries the item itself.
    Unplaced(Value),
    /// Already placed; carries the slot it occupies.
    Placed(Locator),
}

fn id_matches(id: &Value, item: &str) -> bool {
    match id {
        Value::String(s) => s == item,
        Value::Number(n) => n.to_string() == item,
        _ => false,
    }
}

fn malformed(item: &str, what: &str) -> SimulationError {
    SimulationError::MalformedTrayEntry(format!("{}: {}", item, what))
}

impl TrayLayout {
    /// Look `item` up in the auxiliary index of `snapshot`.
    pub fn resolve(
        &self,
        snapshot: &Value,
        records_key: &str,
        item: &str,
    ) -> Result<TrayPlacement, SimulationError> {
        let entry = snapshot
            .get(&self.index_key)
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .find(|entry| {
                entry
                    .get(&self.item_key)
                    .and_then(|it| it.get(&self.id_key))
                    .is_some_and(|id| id_matches(id, item))
            })
            .ok_or_else(|| SimulationError::TrayItemNotFound(item.to_string()))?;

        let position = entry
            .get(&self.position_key)
            .ok_or_else(|| malformed(item, "missing position"))?;

        match position.get("type").and_then(Value::as_str) {
            Some("NotSet") => {
                let value = entry
                    .get(&self.item_key)
                    .cloned()
                    .ok_or_else(|| malformed(item, "missing item"))?;
                Ok(TrayPlacement::Unplaced(value))
            }
            Some("Set") => {
                let record_index = position
                    .get(&self.record_index_key)
                    .and_then(Value::as_u64)
                    .ok_or_else(|| malformed(item, "missing record index"))?;
                let role = position
                    .get("position")
                    .ok_or_else(|| malformed(item, "missing role"))?;
                let role_type = role.get("type").and_then(Value::as_str).unwrap_or_default();
                let slot = self
                    .roles
                    .iter()
                    .find(|r| r.role == role_type)
                    .ok_or_else(|| malformed(item, "unknown role"))?;

                let mut container = Path::root();
                container.push(records_key);
                container.push(record_index as usize);
                for segment in slot.container.segments() {
                    container.push(segment.clone());
                }

                let index = if slot.indexed {
                    let index = role
                        .get("position")
                        .and_then(Value::as_u64)
                        .ok_or_else(|| malformed(item, "missing role position"))?;
                    Some(index as usize)
                } else {
                    None
                };

                Ok(TrayPlacement::Placed(Locator::Slot { container, index }))
            }
            _ => Err(malformed(item, "unknown position type")),
        }
    }
}
