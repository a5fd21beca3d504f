//! End-to-end flow: host, subscriptions, speculation and write-back.

mod common;

use common::{draw_descriptor, draw_snapshot, paths};
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use viewsync::{
    execute_action, simulate_move, ActionExecutor, ActionRequest, ActionResult, ChangedRecords,
    DrawLayout, LocalViewHost, Locator, MoveRequest, NotificationBus, PathSegment,
    SubscriptionConfig, SubscriptionPhase, SyncError, TransportError, ViewDescriptor,
    ViewSubscription, UPDATE_DRAW,
};

fn setup() -> (Arc<NotificationBus>, Arc<LocalViewHost>) {
    let bus = Arc::new(NotificationBus::new());
    let host = Arc::new(LocalViewHost::new(bus.clone()));
    host.register_view(draw_descriptor("r1"), draw_snapshot());
    (bus, host)
}

fn mount(host: &Arc<LocalViewHost>, bus: &Arc<NotificationBus>, descriptor: ViewDescriptor) -> ViewSubscription {
    ViewSubscription::mount(
        host.clone(),
        bus.clone(),
        descriptor,
        SubscriptionConfig::default(),
    )
}

/// Applies `UpdateDraw` by rewriting the ballots of the hosted draw.
struct DrawServer {
    host: Arc<LocalViewHost>,
    descriptor: ViewDescriptor,
    executed: Mutex<Vec<ActionRequest>>,
}

impl ActionExecutor for DrawServer {
    fn execute(&self, request: &ActionRequest) -> ActionResult {
        self.executed.lock().push(request.clone());
        if request.action_type != UPDATE_DRAW {
            return ActionResult::failed(format!("unknown action {}", request.action_type));
        }

        let Some(snapshot) = self.host.view(&self.descriptor) else {
            return ActionResult::failed("draw not found");
        };
        let ballots = request.params["updated_ballots"].as_array().cloned().unwrap_or_default();

        let mut updated = Map::new();
        for ballot in ballots {
            let position = snapshot["debates"]
                .as_array()
                .and_then(|debates| debates.iter().position(|d| d["ballot"]["uuid"] == ballot["uuid"]));
            match position {
                Some(index) => {
                    updated.insert(format!("debates.{index}.ballot"), ballot);
                }
                None => return ActionResult::failed("unknown ballot"),
            }
        }

        match self.host.update_view(&self.descriptor, updated) {
            Ok(()) => ActionResult::ok(),
            Err(error) => ActionResult::failed(error.to_string()),
        }
    }
}

#[test]
fn test_subscribe_receives_host_snapshot_synchronously() {
    let (bus, host) = setup();
    let view = mount(&host, &bus, draw_descriptor("r1"));

    assert_eq!(view.phase(), SubscriptionPhase::Subscribed);
    assert_eq!(view.snapshot(), &draw_snapshot());
    assert_eq!(host.subscribers_of(&draw_descriptor("r1")), 1);
}

#[test]
fn test_unknown_view_fails_subscribe() {
    let (bus, host) = setup();
    let view = mount(&host, &bus, draw_descriptor("missing"));

    assert_eq!(view.phase(), SubscriptionPhase::Unsubscribed);
    assert!(matches!(view.last_error(), Some(TransportError::ViewNotFound(_))));
    assert_eq!(view.snapshot(), &json!({}));
}

#[test]
fn test_host_updates_flow_to_subscribers() {
    let (bus, host) = setup();
    let mut view = mount(&host, &bus, draw_descriptor("r1"));

    host.update_view(
        &draw_descriptor("r1"),
        paths(json!({"debates.1.ballot.president": {"uuid": "free"}})),
    )
    .unwrap();
    let outcome = view.poll();

    assert_eq!(outcome.applied, 1);
    assert_eq!(view.snapshot(), &host.view(&draw_descriptor("r1")).unwrap());
}

#[test]
fn test_speculative_move_confirmed_by_server() {
    common::init_tracing();
    let (bus, host) = setup();
    let mut view = mount(&host, &bus, draw_descriptor("r1"));
    let server = DrawServer {
        host: host.clone(),
        descriptor: draw_descriptor("r1"),
        executed: Mutex::new(Vec::new()),
    };

    let request = MoveRequest::new(
        Locator::list(viewsync::path!["debates", 0usize, "ballot", "adjudicators"], 1),
        Locator::list(viewsync::path!["debates", 1usize, "ballot", "adjudicators"], 1),
        false,
    );
    let changed: ChangedRecords = simulate_move(view.snapshot(), &request, &DrawLayout::default());
    assert_eq!(changed.len(), 2);

    // the snapshot stays authoritative until the server answers
    assert_eq!(view.snapshot(), &draw_snapshot());

    let action = ActionRequest::update_draw(&json!("tournament-1"), &changed);
    execute_action(&server, &action).unwrap();
    view.poll();

    let expected: Vec<Value> = changed
        .values()
        .map(|record| record["ballot"]["adjudicators"].clone())
        .collect();
    assert_eq!(view.snapshot()["debates"][0]["ballot"]["adjudicators"], expected[0]);
    assert_eq!(view.snapshot()["debates"][1]["ballot"]["adjudicators"], expected[1]);
    assert_eq!(
        changed[&PathSegment::Index(1)]["ballot"]["adjudicators"],
        json!([{"uuid": "c"}, {"uuid": "b"}])
    );
    assert_eq!(server.executed.lock().len(), 1);
}

#[test]
fn test_rejected_action_leaves_views_untouched() {
    common::init_tracing();
    let (bus, host) = setup();
    let mut view = mount(&host, &bus, draw_descriptor("r1"));
    let server = DrawServer {
        host: host.clone(),
        descriptor: draw_descriptor("r1"),
        executed: Mutex::new(Vec::new()),
    };

    let action = ActionRequest::new(UPDATE_DRAW, json!({
        "tournament_id": "tournament-1",
        "updated_ballots": [{"uuid": "no-such-ballot"}]
    }));
    let err = execute_action(&server, &action).unwrap_err();

    assert!(matches!(err, SyncError::ActionFailed { .. }));
    assert!(!view.poll().changed());
    assert_eq!(view.snapshot(), &draw_snapshot());
}

#[test]
fn test_switching_rounds_moves_subscription() {
    let (bus, host) = setup();
    host.register_view(draw_descriptor("r2"), json!({"debates": []}));
    let mut view = mount(&host, &bus, draw_descriptor("r1"));

    view.set_descriptor(draw_descriptor("r2"));

    assert_eq!(view.snapshot(), &json!({"debates": []}));
    assert_eq!(host.subscribers_of(&draw_descriptor("r1")), 0);
    assert_eq!(host.subscribers_of(&draw_descriptor("r2")), 1);

    host.update_view(&draw_descriptor("r1"), paths(json!({"debates.0.index": 9})))
        .unwrap();
    assert_eq!(view.poll().applied, 0);
}

#[test]
fn test_dropping_views_releases_host_subscriptions() {
    let (bus, host) = setup();
    let first = mount(&host, &bus, draw_descriptor("r1"));
    let second = mount(&host, &bus, draw_descriptor("r1"));
    assert_eq!(host.subscription_count(), 2);

    drop(first);
    assert_eq!(host.subscription_count(), 1);
    drop(second);
    assert_eq!(host.subscription_count(), 0);
    assert_eq!(bus.listener_count(), 0);
}

#[test]
fn test_reregistering_view_replaces_subscriber_snapshot() {
    let (bus, host) = setup();
    let mut view = mount(&host, &bus, draw_descriptor("r1"));

    host.register_view(draw_descriptor("r1"), json!({"debates": [], "regenerated": true}));
    view.poll();

    assert_eq!(view.snapshot(), &json!({"debates": [], "regenerated": true}));
}
