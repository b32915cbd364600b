//! # Listener trait.
//!
//! Callbacks run inline on the engine's dispatch path, one listener after the
//! other. They must return quickly; hand heavy work off to a channel or task.
//! A panicking listener is isolated and logged, the remaining ones still run.

use crate::models::{Message, PresenceEvent, Status};

/// Receiver of messages, presence events and connection statuses.
///
/// Every callback has an empty default so implementations only override what
/// they care about.
pub trait Listener: Send + Sync + 'static {
    fn on_message(&self, _message: &Message) {}

    fn on_presence(&self, _event: &PresenceEvent) {}

    fn on_status(&self, _status: &Status) {}

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
