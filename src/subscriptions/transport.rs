//! Request/response seam between subscriptions and the server.

use crate::error::TransportError;
use crate::types::{SubscribeResponse, SubscriptionId, ViewDescriptor};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// The server side of the view protocol.
///
/// `subscribe` may answer immediately or keep the responder and answer
/// later; `unsubscribe` is fire-and-forget.
pub trait ViewTransport: Send + Sync {
    fn subscribe(&self, descriptor: &ViewDescriptor, responder: SubscribeResponder);
    fn unsubscribe(&self, id: SubscriptionId);
}

type SubscribeResult = Result<SubscribeResponse, TransportError>;

enum SlotState {
    Waiting,
    Ready(SubscribeResult),
    Taken,
    /// The subscriber is gone; late responses must be unsubscribed.
    Disposed,
}

/// Where the response to one subscribe request lands.
pub(crate) struct SubscribeSlot {
    state: Mutex<SlotState>,
}

impl SubscribeSlot {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(SlotState::Waiting),
        })
    }

    /// Take a response that has arrived. Returns `None` while waiting.
    pub(crate) fn take_ready(&self) -> Option<SubscribeResult> {
        let mut state = self.state.lock();
        match std::mem::replace(&mut *state, SlotState::Taken) {
            SlotState::Ready(result) => Some(result),
            other => {
                *state = other;
                None
            }
        }
    }

    /// Mark the slot disposed.
    ///
    /// If a successful response already arrived but was never adopted, its id
    /// is returned so the caller can release it.
    pub(crate) fn dispose(&self) -> Option<SubscriptionId> {
        let mut state = self.state.lock();
        match std::mem::replace(&mut *state, SlotState::Disposed) {
            SlotState::Ready(Ok(response)) => Some(response.subscription_id),
            _ => None,
        }
    }

    /// Store `result`, or hand it back if the slot was disposed.
    fn fill(&self, result: SubscribeResult) -> Option<SubscribeResult> {
        let mut state = self.state.lock();
        match *state {
            SlotState::Disposed => Some(result),
            _ => {
                *state = SlotState::Ready(result);
                None
            }
        }
    }
}

/// One-shot completion handle for a subscribe request.
///
/// Dropping it without answering resolves the request as
/// [`TransportError::Cancelled`]. It keeps the transport alive until it
/// resolves, so a response that outlives its subscriber can still be
/// unsubscribed.
pub struct SubscribeResponder {
    slot: Arc<SubscribeSlot>,
    /// Released on completion.
    transport: Option<Arc<dyn ViewTransport>>,
    descriptor: ViewDescriptor,
    completed: bool,
}

impl SubscribeResponder {
    pub(crate) fn new(
        slot: Arc<SubscribeSlot>,
        transport: Arc<dyn ViewTransport>,
        descriptor: ViewDescriptor,
    ) -> Self {
        Self {
            slot,
            transport: Some(transport),
            descriptor,
            completed: false,
        }
    }

    /// Descriptor this request subscribes to.
    pub fn descriptor(&self) -> &ViewDescriptor {
        &self.descriptor
    }

    /// Answer the request.
    ///
    /// If the subscriber was torn down in the meantime, a successful
    /// response is immediately unsubscribed instead of delivered.
    pub fn resolve(mut self, result: Result<SubscribeResponse, TransportError>) {
        self.complete(result);
    }

    pub fn succeed(self, subscription_id: SubscriptionId, snapshot: Value) {
        self.resolve(Ok(SubscribeResponse {
            subscription_id,
            snapshot,
        }));
    }

    pub fn fail(self, error: TransportError) {
        self.resolve(Err(error));
    }

    fn complete(&mut self, result: SubscribeResult) {
        self.completed = true;
        let transport = self.transport.take();
        let Some(returned) = self.slot.fill(result) else {
            return;
        };

        if let Ok(response) = returned {
            debug!(
                subscription = response.subscription_id.0,
                view = %self.descriptor,
                "subscribe answered after teardown, releasing"
            );
            match transport {
                Some(transport) => transport.unsubscribe(response.subscription_id),
                None => warn!(
                    subscription = response.subscription_id.0,
                    "no transport to release late subscription"
                ),
            }
        }
    }
}

impl Drop for SubscribeResponder {
    fn drop(&mut self) {
        if !self.completed {
            self.complete(Err(TransportError::Cancelled));
        }
    }
}
