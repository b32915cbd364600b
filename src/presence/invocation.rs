use std::collections::BTreeSet;

use crate::engine::{Dispatch, Invocation, Named};
use crate::error::EngineError;

/// Registry key of manageable presence effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HeartbeatEffectKind {
    Heartbeat,
    Wait,
    DelayedHeartbeat,
}

/// Output of the presence heartbeat machine.
///
/// `Leave` is fire-and-forget: it outlives the state that issued it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HeartbeatInvocation {
    Heartbeat {
        channels: BTreeSet<String>,
        groups: BTreeSet<String>,
    },
    CancelHeartbeat,
    Wait,
    CancelWait,
    DelayedHeartbeat {
        channels: BTreeSet<String>,
        groups: BTreeSet<String>,
        attempt: u32,
        reason: Option<EngineError>,
    },
    CancelDelayedHeartbeat,
    Leave {
        channels: BTreeSet<String>,
        groups: BTreeSet<String>,
    },
}

impl Named for HeartbeatInvocation {
    fn name(&self) -> &'static str {
        match self {
            HeartbeatInvocation::Heartbeat { .. } => "heartbeat",
            HeartbeatInvocation::CancelHeartbeat => "cancel_heartbeat",
            HeartbeatInvocation::Wait => "wait",
            HeartbeatInvocation::CancelWait => "cancel_wait",
            HeartbeatInvocation::DelayedHeartbeat { .. } => "delayed_heartbeat",
            HeartbeatInvocation::CancelDelayedHeartbeat => "cancel_delayed_heartbeat",
            HeartbeatInvocation::Leave { .. } => "leave",
        }
    }
}

impl Invocation for HeartbeatInvocation {
    type Kind = HeartbeatEffectKind;

    fn dispatch(&self) -> Dispatch<HeartbeatEffectKind> {
        use HeartbeatEffectKind as K;
        match self {
            HeartbeatInvocation::Heartbeat { .. } => Dispatch::Manage(K::Heartbeat),
            HeartbeatInvocation::CancelHeartbeat => Dispatch::Cancel(K::Heartbeat),
            HeartbeatInvocation::Wait => Dispatch::Manage(K::Wait),
            HeartbeatInvocation::CancelWait => Dispatch::Cancel(K::Wait),
            HeartbeatInvocation::DelayedHeartbeat { .. } => Dispatch::Manage(K::DelayedHeartbeat),
            HeartbeatInvocation::CancelDelayedHeartbeat => Dispatch::Cancel(K::DelayedHeartbeat),
            HeartbeatInvocation::Leave { .. } => Dispatch::Detach,
        }
    }
}
