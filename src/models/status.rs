//! # Connection status reported to listeners.

use std::collections::BTreeSet;
use std::fmt;

use crate::error::EngineError;

/// Category of a [`Status`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatusCategory {
    /// The subscription loop is connected (after a handshake or a reconnect).
    Connected,
    /// The loop stopped: explicit disconnect, unsubscribe or reconnect give-up.
    Disconnected,
}

impl fmt::Display for StatusCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusCategory::Connected => f.write_str("connected"),
            StatusCategory::Disconnected => f.write_str("disconnected"),
        }
    }
}

/// Status handed to [`Listener::on_status`](crate::Listener::on_status).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Status {
    pub category: StatusCategory,
    /// Channels affected by the change.
    pub channels: BTreeSet<String>,
    /// Channel groups affected by the change.
    pub groups: BTreeSet<String>,
    /// Failure cause when the status reports a give-up.
    pub error: Option<EngineError>,
}

impl Status {
    pub fn connected(channels: BTreeSet<String>, groups: BTreeSet<String>) -> Self {
        Self {
            category: StatusCategory::Connected,
            channels,
            groups,
            error: None,
        }
    }

    pub fn disconnected(
        channels: BTreeSet<String>,
        groups: BTreeSet<String>,
        error: Option<EngineError>,
    ) -> Self {
        Self {
            category: StatusCategory::Disconnected,
            channels,
            groups,
            error,
        }
    }

    /// `true` if this status reports an error (give-up).
    #[inline]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
