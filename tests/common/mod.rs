//! Shared fixtures for integration tests.
#![allow(dead_code)]

use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use viewsync::{SubscribeResponder, SubscriptionId, ViewDescriptor, ViewTransport};

/// Holds subscribe requests until the test answers them.
#[derive(Default)]
pub struct ManualTransport {
    pending: Mutex<Vec<SubscribeResponder>>,
    unsubscribed: Mutex<Vec<SubscriptionId>>,
}

impl ManualTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Descriptors of the requests still waiting, oldest first.
    pub fn pending_descriptors(&self) -> Vec<ViewDescriptor> {
        self.pending
            .lock()
            .iter()
            .map(|r| r.descriptor().clone())
            .collect()
    }

    /// Answer the oldest pending request successfully.
    pub fn answer(&self, id: u64, snapshot: Value) {
        let responder = self.pending.lock().remove(0);
        responder.succeed(SubscriptionId(id), snapshot);
    }

    /// Fail the oldest pending request.
    pub fn reject(&self, error: viewsync::TransportError) {
        let responder = self.pending.lock().remove(0);
        responder.fail(error);
    }

    /// Drop the oldest pending request without answering it.
    pub fn abandon(&self) {
        let responder = self.pending.lock().remove(0);
        drop(responder);
    }

    pub fn unsubscribed(&self) -> Vec<SubscriptionId> {
        self.unsubscribed.lock().clone()
    }
}

impl ViewTransport for ManualTransport {
    fn subscribe(&self, _descriptor: &ViewDescriptor, responder: SubscribeResponder) {
        self.pending.lock().push(responder);
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.unsubscribed.lock().push(id);
    }
}

/// Route library logs to the test harness. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub fn draw_descriptor(round: &str) -> ViewDescriptor {
    ViewDescriptor::from(json!({"type": "Draw", "uuid": round}))
}

pub fn paths(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected an object"),
    }
}

/// A small round draw with a president, a panel and the adjudicator index.
pub fn draw_snapshot() -> Value {
    json!({
        "debates": [
            {"index": 0, "uuid": "d0", "ballot": {
                "uuid": "b0",
                "government": {"uuid": "t1"}, "opposition": {"uuid": "t2"},
                "adjudicators": [{"uuid": "a"}, {"uuid": "b"}],
                "president": {"uuid": "p"}
            }},
            {"index": 1, "uuid": "d1", "ballot": {
                "uuid": "b1",
                "government": {"uuid": "t3"}, "opposition": {"uuid": "t4"},
                "adjudicators": [{"uuid": "c"}],
                "president": null
            }}
        ],
        "adjudicator_index": [
            {"adjudicator": {"uuid": "a"}, "position": {"type": "Set", "debate_index": 0,
                "position": {"type": "Panel", "position": 0}}},
            {"adjudicator": {"uuid": "b"}, "position": {"type": "Set", "debate_index": 0,
                "position": {"type": "Panel", "position": 1}}},
            {"adjudicator": {"uuid": "c"}, "position": {"type": "Set", "debate_index": 1,
                "position": {"type": "Panel", "position": 0}}},
            {"adjudicator": {"uuid": "p"}, "position": {"type": "Set", "debate_index": 0,
                "position": {"type": "President"}}},
            {"adjudicator": {"uuid": "free"}, "position": {"type": "NotSet"}}
        ]
    })
}
