//! Subscriptions pending SDK readiness.
//!
//! ```text
//! Buffering --drain (SDK ready)--> Forwarding
//! ```
//!
//! The transition is one-way. While buffering, subscriptions are kept in
//! submission order; the drain hands them to the SDK in that same order.

use crate::{EventCallback, ProviderSdk};
use std::fmt;
use tracing::{debug, trace};

/// Queue lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    /// SDK not initialized yet: subscriptions are buffered.
    Buffering,
    /// SDK initialized: subscriptions go straight to the SDK.
    Forwarding,
}

/// A subscription waiting for the SDK.
#[derive(Clone)]
pub struct PendingEvent {
    pub name: String,
    pub callback: EventCallback,
}

impl fmt::Debug for PendingEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingEvent")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// FIFO buffer of SDK subscriptions.
#[derive(Debug)]
pub struct EventQueue {
    state: QueueState,
    pending: Vec<PendingEvent>,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    pub fn new() -> Self {
        Self {
            state: QueueState::Buffering,
            pending: Vec::new(),
        }
    }

    pub fn state(&self) -> QueueState {
        self.state
    }

    /// Number of subscriptions waiting for the SDK.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Subscribe to an SDK event.
    ///
    /// Repeated subscriptions to the same event are kept; each fires
    /// independently.
    pub fn subscribe(
        &mut self,
        name: impl Into<String>,
        callback: EventCallback,
        sdk: &dyn ProviderSdk,
    ) {
        let name = name.into();
        match self.state {
            QueueState::Forwarding => {
                trace!(event = %name, "Forwarding subscription to the SDK");
                sdk.subscribe(&name, callback);
            }
            QueueState::Buffering => {
                trace!(event = %name, position = self.pending.len(), "Buffering subscription");
                self.pending.push(PendingEvent { name, callback });
            }
        }
    }

    /// Hand every buffered subscription to the SDK in submission order and
    /// switch to forwarding.
    ///
    /// Returns the number of subscriptions forwarded. Draining an already
    /// forwarding queue does nothing.
    pub fn drain(&mut self, sdk: &dyn ProviderSdk) -> usize {
        if self.state == QueueState::Forwarding {
            debug!("Event queue already drained");
            return 0;
        }

        self.state = QueueState::Forwarding;
        let pending = std::mem::take(&mut self.pending);
        let count = pending.len();
        for event in pending {
            sdk.subscribe(&event.name, event.callback);
        }

        debug!(count, "Drained buffered SDK subscriptions");
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DoneCallback, ProviderConfig, StatusEvent};
    use parking_lot::Mutex;
    use std::sync::Arc;
    use url::Url;

    #[derive(Default)]
    struct RecordingSdk {
        subscribed: Mutex<Vec<String>>,
    }

    impl ProviderSdk for RecordingSdk {
        fn inject_script(&self, _container_id: &str, _script_url: &Url) {}

        fn init(&self, _config: &ProviderConfig) {}

        fn subscribe(&self, event_name: &str, callback: EventCallback) {
            self.subscribed.lock().push(event_name.to_string());
            callback(&StatusEvent::unknown());
        }

        fn get_login_status(&self, _callback: EventCallback) {}

        fn logout(&self, done: DoneCallback) {
            done();
        }
    }

    fn noop() -> EventCallback {
        Arc::new(|_: &StatusEvent| {})
    }

    #[test]
    fn test_buffers_until_drained() {
        let sdk = RecordingSdk::default();
        let mut queue = EventQueue::new();

        queue.subscribe("a", noop(), &sdk);
        queue.subscribe("b", noop(), &sdk);

        assert_eq!(queue.state(), QueueState::Buffering);
        assert_eq!(queue.pending_len(), 2);
        assert!(sdk.subscribed.lock().is_empty());
    }

    #[test]
    fn test_drain_preserves_submission_order() {
        let sdk = RecordingSdk::default();
        let mut queue = EventQueue::new();

        for name in ["a", "b", "c"] {
            queue.subscribe(name, noop(), &sdk);
        }

        assert_eq!(queue.drain(&sdk), 3);
        assert_eq!(*sdk.subscribed.lock(), vec!["a", "b", "c"]);
        assert_eq!(queue.pending_len(), 0);
        assert_eq!(queue.state(), QueueState::Forwarding);
    }

    #[test]
    fn test_subscribe_after_drain_forwards_immediately() {
        let sdk = RecordingSdk::default();
        let mut queue = EventQueue::new();
        queue.subscribe("early", noop(), &sdk);
        queue.drain(&sdk);

        queue.subscribe("late", noop(), &sdk);

        assert_eq!(*sdk.subscribed.lock(), vec!["early", "late"]);
        assert_eq!(queue.pending_len(), 0);
    }

    #[test]
    fn test_second_drain_is_noop() {
        let sdk = RecordingSdk::default();
        let mut queue = EventQueue::new();
        queue.subscribe("a", noop(), &sdk);

        assert_eq!(queue.drain(&sdk), 1);
        assert_eq!(queue.drain(&sdk), 0);
        assert_eq!(sdk.subscribed.lock().len(), 1);
    }

    #[test]
    fn test_duplicate_subscriptions_each_fire() {
        let sdk = RecordingSdk::default();
        let mut queue = EventQueue::new();
        let fired = Arc::new(Mutex::new(0));

        for _ in 0..2 {
            let fired = fired.clone();
            queue.subscribe(
                "auth.statusChange",
                Arc::new(move |_: &StatusEvent| *fired.lock() += 1),
                &sdk,
            );
        }
        queue.drain(&sdk);

        assert_eq!(*fired.lock(), 2);
    }
}
