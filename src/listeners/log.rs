//! # Logging listener for debugging and demos.
//!
//! [`LogListener`] forwards everything it receives to `tracing` at `info`.
//!
//! ## Output
//! ```text
//! INFO message channel=chat kind=Message timetoken=17000000000000000 payload={"text":"hi"}
//! INFO presence channel=lobby action=Join uuid=bob occupancy=3
//! INFO status category=connected channels=["chat"] groups=[] error=None
//! ```

use tracing::info;

use crate::listeners::Listener;
use crate::models::{Message, PresenceEvent, Status};

/// Listener that logs every callback.
///
/// Enabled via the `logging` feature.
pub struct LogListener;

impl Listener for LogListener {
    fn on_message(&self, m: &Message) {
        info!(
            channel = %m.channel,
            kind = ?m.kind,
            timetoken = ?m.timetoken,
            payload = %m.payload,
            "message"
        );
    }

    fn on_presence(&self, e: &PresenceEvent) {
        info!(
            channel = %e.channel,
            action = ?e.action,
            uuid = ?e.uuid,
            occupancy = ?e.occupancy,
            "presence"
        );
    }

    fn on_status(&self, s: &Status) {
        info!(
            category = %s.category,
            channels = ?s.channels,
            groups = ?s.groups,
            error = ?s.error,
            "status"
        );
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
