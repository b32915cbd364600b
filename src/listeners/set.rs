//! # ListenerSet: synchronous fan-out over registered listeners.
//!
//! [`ListenerSet`] is shared by both engines' emit effects and the manager.
//!
//! ## What it guarantees
//! - Listeners are called in registration order, synchronously.
//! - Panics inside a listener are caught and logged (isolation).
//! - Envelopes that fail to decode are logged and skipped.
//!
//! ## Diagram
//! ```text
//!    status(&Status) / deliver(Vec<Envelope>)
//!        │
//!        ├──► catch_unwind(L1.on_*)
//!        ├──► catch_unwind(L2.on_*)
//!        └──► catch_unwind(LN.on_*)
//! ```

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::warn;

use crate::listeners::Listener;
use crate::models::{Decoded, Envelope, Status};

/// Registered listeners.
#[derive(Default)]
pub struct ListenerSet {
    listeners: RwLock<Vec<Arc<dyn Listener>>>,
}

impl ListenerSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener.
    pub fn add(&self, listener: Arc<dyn Listener>) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    /// Removes a previously registered listener; `false` if it was not there.
    pub fn remove(&self, listener: &Arc<dyn Listener>) -> bool {
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|l| !Arc::ptr_eq(l, listener));
        listeners.len() != before
    }

    /// True if there are no listeners.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Decodes `envelopes` and hands each one to every listener.
    pub fn deliver(&self, envelopes: &[Envelope]) {
        for envelope in envelopes {
            match envelope.decode() {
                Ok(Decoded::Message(message)) => {
                    self.each("on_message", |l| l.on_message(&message));
                }
                Ok(Decoded::Presence(event)) => {
                    self.each("on_presence", |l| l.on_presence(&event));
                }
                Err(e) => {
                    warn!(channel = %envelope.channel, error = %e, "dropping undecodable envelope");
                }
            }
        }
    }

    /// Hands `status` to every listener.
    pub fn status(&self, status: &Status) {
        self.each("on_status", |l| l.on_status(status));
    }

    fn each(&self, callback: &'static str, f: impl Fn(&dyn Listener)) {
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in listeners {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| f(listener.as_ref()))) {
                warn!(
                    listener = listener.name(),
                    callback,
                    panic = panic_message(panic.as_ref()),
                    "listener panicked"
                );
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Message, PresenceEvent, StatusCategory};
    use serde_json::json;
    use std::collections::BTreeSet;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        messages: Mutex<Vec<Message>>,
        presence: Mutex<Vec<PresenceEvent>>,
        statuses: Mutex<Vec<StatusCategory>>,
    }

    impl Listener for Recorder {
        fn on_message(&self, message: &Message) {
            self.messages.lock().unwrap().push(message.clone());
        }

        fn on_presence(&self, event: &PresenceEvent) {
            self.presence.lock().unwrap().push(event.clone());
        }

        fn on_status(&self, status: &Status) {
            self.statuses.lock().unwrap().push(status.category);
        }
    }

    struct Panicker;

    impl Listener for Panicker {
        fn on_message(&self, _message: &Message) {
            panic!("boom");
        }

        fn name(&self) -> &'static str {
            "panicker"
        }
    }

    fn channels(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn routes_messages_and_presence() {
        let set = ListenerSet::new();
        let rec = Arc::new(Recorder::default());
        set.add(rec.clone());

        set.deliver(&[
            Envelope::new("a", json!(1)),
            Envelope::new("a-pnpres", json!({"action": "leave", "uuid": "u"})),
            Envelope::new("b-pnpres", json!(42)),
        ]);

        assert_eq!(rec.messages.lock().unwrap().len(), 1);
        assert_eq!(rec.presence.lock().unwrap().len(), 1);
    }

    #[test]
    fn panicking_listener_does_not_starve_others() {
        let set = ListenerSet::new();
        let rec = Arc::new(Recorder::default());
        set.add(Arc::new(Panicker));
        set.add(rec.clone());

        set.deliver(&[Envelope::new("a", json!("x"))]);
        assert_eq!(rec.messages.lock().unwrap().len(), 1);
    }

    #[test]
    fn every_status_is_forwarded() {
        let set = ListenerSet::new();
        let rec = Arc::new(Recorder::default());
        set.add(rec.clone());

        let connected = Status::connected(channels(&["a"]), BTreeSet::new());
        set.status(&connected);
        set.status(&Status::disconnected(channels(&["a"]), BTreeSet::new(), None));
        set.status(&connected);

        assert_eq!(
            *rec.statuses.lock().unwrap(),
            vec![
                StatusCategory::Connected,
                StatusCategory::Disconnected,
                StatusCategory::Connected,
            ]
        );
    }

    #[test]
    fn remove_by_identity() {
        let set = ListenerSet::new();
        let rec: Arc<dyn Listener> = Arc::new(Recorder::default());
        set.add(rec.clone());
        assert_eq!(set.len(), 1);
        assert!(set.remove(&rec));
        assert!(!set.remove(&rec));
        assert!(set.is_empty());
    }
}
