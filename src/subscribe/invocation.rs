//! # Subscribe engine invocations.
//!
//! Outputs of the subscribe state machine and how the dispatcher treats them:
//!
//! | invocation                 | dispatch                          |
//! |----------------------------|-----------------------------------|
//! | `Handshake`                | manage `Handshake`                |
//! | `CancelHandshake`          | cancel `Handshake`                |
//! | `ReceiveMessages`          | manage `ReceiveMessages`          |
//! | `CancelReceiveMessages`    | cancel `ReceiveMessages`          |
//! | `HandshakeReconnect`       | manage `HandshakeReconnect`       |
//! | `CancelHandshakeReconnect` | cancel `HandshakeReconnect`       |
//! | `ReceiveReconnect`         | manage `ReceiveReconnect`         |
//! | `CancelReceiveReconnect`   | cancel `ReceiveReconnect`         |
//! | `EmitMessages`             | emit                              |
//! | `EmitStatus`               | emit                              |

use std::collections::BTreeSet;

use crate::engine::{Dispatch, Invocation, Named};
use crate::error::EngineError;
use crate::models::{Cursor, Envelope, Status};

/// Registry key of manageable subscribe effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SubscribeEffectKind {
    Handshake,
    ReceiveMessages,
    HandshakeReconnect,
    ReceiveReconnect,
}

/// Output of the subscribe state machine.
#[derive(Clone, Debug, PartialEq)]
pub enum SubscribeInvocation {
    Handshake {
        channels: BTreeSet<String>,
        groups: BTreeSet<String>,
    },
    CancelHandshake,
    ReceiveMessages {
        channels: BTreeSet<String>,
        groups: BTreeSet<String>,
        cursor: Cursor,
    },
    CancelReceiveMessages,
    HandshakeReconnect {
        channels: BTreeSet<String>,
        groups: BTreeSet<String>,
        attempt: u32,
        reason: Option<EngineError>,
    },
    CancelHandshakeReconnect,
    ReceiveReconnect {
        channels: BTreeSet<String>,
        groups: BTreeSet<String>,
        cursor: Cursor,
        attempt: u32,
        reason: Option<EngineError>,
    },
    CancelReceiveReconnect,
    EmitMessages {
        messages: Vec<Envelope>,
    },
    EmitStatus {
        status: Status,
    },
}

impl Named for SubscribeInvocation {
    fn name(&self) -> &'static str {
        match self {
            SubscribeInvocation::Handshake { .. } => "handshake",
            SubscribeInvocation::CancelHandshake => "cancel_handshake",
            SubscribeInvocation::ReceiveMessages { .. } => "receive_messages",
            SubscribeInvocation::CancelReceiveMessages => "cancel_receive_messages",
            SubscribeInvocation::HandshakeReconnect { .. } => "handshake_reconnect",
            SubscribeInvocation::CancelHandshakeReconnect => "cancel_handshake_reconnect",
            SubscribeInvocation::ReceiveReconnect { .. } => "receive_reconnect",
            SubscribeInvocation::CancelReceiveReconnect => "cancel_receive_reconnect",
            SubscribeInvocation::EmitMessages { .. } => "emit_messages",
            SubscribeInvocation::EmitStatus { .. } => "emit_status",
        }
    }
}

impl Invocation for SubscribeInvocation {
    type Kind = SubscribeEffectKind;

    fn dispatch(&self) -> Dispatch<SubscribeEffectKind> {
        use SubscribeEffectKind as K;
        match self {
            SubscribeInvocation::Handshake { .. } => Dispatch::Manage(K::Handshake),
            SubscribeInvocation::CancelHandshake => Dispatch::Cancel(K::Handshake),
            SubscribeInvocation::ReceiveMessages { .. } => Dispatch::Manage(K::ReceiveMessages),
            SubscribeInvocation::CancelReceiveMessages => Dispatch::Cancel(K::ReceiveMessages),
            SubscribeInvocation::HandshakeReconnect { .. } => {
                Dispatch::Manage(K::HandshakeReconnect)
            }
            SubscribeInvocation::CancelHandshakeReconnect => {
                Dispatch::Cancel(K::HandshakeReconnect)
            }
            SubscribeInvocation::ReceiveReconnect { .. } => Dispatch::Manage(K::ReceiveReconnect),
            SubscribeInvocation::CancelReceiveReconnect => Dispatch::Cancel(K::ReceiveReconnect),
            SubscribeInvocation::EmitMessages { .. } | SubscribeInvocation::EmitStatus { .. } => {
                Dispatch::Emit
            }
        }
    }
}
