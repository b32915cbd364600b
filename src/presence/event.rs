use std::collections::BTreeSet;

use crate::engine::Named;
use crate::error::EngineError;

/// Input of the presence heartbeat machine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HeartbeatEvent {
    Joined {
        channels: BTreeSet<String>,
        groups: BTreeSet<String>,
    },
    Left {
        channels: BTreeSet<String>,
        groups: BTreeSet<String>,
        suppress_leave: bool,
    },
    LeftAll {
        suppress_leave: bool,
    },
    HeartbeatSuccess,
    HeartbeatFailure {
        reason: EngineError,
        attempt: u32,
    },
    HeartbeatGiveup {
        reason: EngineError,
    },
    Reconnect,
    Disconnect {
        suppress_leave: bool,
    },
    /// The cooldown between two heartbeats elapsed.
    TimesUp,
}

impl Named for HeartbeatEvent {
    fn name(&self) -> &'static str {
        match self {
            HeartbeatEvent::Joined { .. } => "joined",
            HeartbeatEvent::Left { .. } => "left",
            HeartbeatEvent::LeftAll { .. } => "left_all",
            HeartbeatEvent::HeartbeatSuccess => "heartbeat_success",
            HeartbeatEvent::HeartbeatFailure { .. } => "heartbeat_failure",
            HeartbeatEvent::HeartbeatGiveup { .. } => "heartbeat_giveup",
            HeartbeatEvent::Reconnect => "reconnect",
            HeartbeatEvent::Disconnect { .. } => "disconnect",
            HeartbeatEvent::TimesUp => "times_up",
        }
    }
}
