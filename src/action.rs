//! Authoritative mutations as named actions.
//!
//! Actions travel as `{"type": <name>, "action": <params>}` and answer with
//! `{"success": bool, "error": ..}`. Nothing here talks to a server; an
//! [`ActionExecutor`] does.

use crate::error::{Result, SyncError};
use crate::simulate::ChangedRecords;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::error;

/// Name of the action that writes back edited draw records.
pub const UPDATE_DRAW: &str = "UpdateDraw";

/// A named action with its parameter record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    #[serde(rename = "type")]
    pub action_type: String,
    #[serde(rename = "action")]
    pub params: Value,
}

impl ActionRequest {
    pub fn new(action_type: impl Into<String>, params: Value) -> Self {
        Self {
            action_type: action_type.into(),
            params,
        }
    }

    /// Package simulated records as an `UpdateDraw` action.
    ///
    /// Each record contributes its `ballot`; records without one are skipped.
    pub fn update_draw(tournament_id: &Value, changed: &ChangedRecords) -> Self {
        let updated_ballots: Vec<Value> = changed
            .values()
            .filter_map(|record| record.get("ballot").cloned())
            .collect();

        Self::new(
            UPDATE_DRAW,
            json!({
                "tournament_id": tournament_id,
                "updated_ballots": updated_ballots,
            }),
        )
    }
}

/// Answer to an action.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
        }
    }
}

/// Executes named actions against the authoritative state.
pub trait ActionExecutor {
    fn execute(&self, request: &ActionRequest) -> ActionResult;
}

/// Execute `request`, turning an unsuccessful answer into an error.
pub fn execute_action<E: ActionExecutor + ?Sized>(executor: &E, request: &ActionRequest) -> Result<()> {
    let result = executor.execute(request);
    if result.success {
        return Ok(());
    }

    let message = result.error.unwrap_or_else(|| "unknown error".to_string());
    error!(action = %request.action_type, %message, "error when executing action");
    Err(SyncError::ActionFailed {
        action: request.action_type.clone(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PathSegment;
    use parking_lot::Mutex;

    struct Recorder {
        seen: Mutex<Vec<ActionRequest>>,
        answer: ActionResult,
    }

    impl ActionExecutor for Recorder {
        fn execute(&self, request: &ActionRequest) -> ActionResult {
            self.seen.lock().push(request.clone());
            self.answer.clone()
        }
    }

    #[test]
    fn test_update_draw_packaging() {
        let mut changed = ChangedRecords::new();
        changed.insert(PathSegment::Index(0), json!({"index": 0, "ballot": {"uuid": "b0"}}));
        changed.insert(PathSegment::Index(3), json!({"index": 3, "ballot": {"uuid": "b3"}}));

        let request = ActionRequest::update_draw(&json!("t1"), &changed);

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "type": "UpdateDraw",
                "action": {
                    "tournament_id": "t1",
                    "updated_ballots": [{"uuid": "b0"}, {"uuid": "b3"}]
                }
            })
        );
    }

    #[test]
    fn test_execute_action_outcomes() {
        let ok = Recorder {
            seen: Mutex::new(Vec::new()),
            answer: ActionResult::ok(),
        };
        let request = ActionRequest::new("Noop", json!({}));
        assert!(execute_action(&ok, &request).is_ok());
        assert_eq!(ok.seen.lock().len(), 1);

        let failing = Recorder {
            seen: Mutex::new(Vec::new()),
            answer: ActionResult::failed("ballot locked"),
        };
        let err = execute_action(&failing, &request).unwrap_err();
        assert!(matches!(err, SyncError::ActionFailed { ref message, .. } if message == "ballot locked"));
    }

    #[test]
    fn test_result_wire_format() {
        let parsed: ActionResult =
            serde_json::from_value(json!({"success": false, "error": "nope"})).unwrap();
        assert_eq!(parsed, ActionResult::failed("nope"));

        let parsed: ActionResult = serde_json::from_value(json!({"success": true})).unwrap();
        assert_eq!(parsed, ActionResult::ok());
    }
}
