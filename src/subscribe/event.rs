//! # Subscribe engine events.
//!
//! Inputs of the subscribe state machine. External ones come from the
//! [`SubscriptionManager`](crate::SubscriptionManager); the rest are reported by
//! effects.
//!
//! ```text
//! manager:  SubscriptionChanged · SubscriptionRestored · Disconnect · Reconnect · UnsubscribeAll
//! effects:  Handshake{Success,Failure} · HandshakeReconnect{Success,Failure,Giveup}
//!           Receive{Success,Failure}   · ReceiveReconnect{Success,Failure,Giveup}
//! ```

use std::collections::BTreeSet;

use crate::engine::Named;
use crate::error::EngineError;
use crate::models::{Cursor, Envelope};

/// Input of the subscribe state machine.
#[derive(Clone, Debug, PartialEq)]
pub enum SubscribeEvent {
    /// The subscription set changed; start over from a fresh cursor.
    SubscriptionChanged {
        channels: BTreeSet<String>,
        groups: BTreeSet<String>,
    },
    /// Subscribe and continue from a known cursor (catch-up).
    SubscriptionRestored {
        channels: BTreeSet<String>,
        groups: BTreeSet<String>,
        cursor: Cursor,
    },
    HandshakeSuccess {
        cursor: Cursor,
    },
    HandshakeFailure {
        reason: EngineError,
        attempt: u32,
    },
    HandshakeReconnectSuccess {
        cursor: Cursor,
    },
    HandshakeReconnectFailure {
        reason: EngineError,
        attempt: u32,
    },
    HandshakeReconnectGiveup {
        reason: EngineError,
    },
    ReceiveSuccess {
        cursor: Cursor,
        messages: Vec<Envelope>,
    },
    ReceiveFailure {
        reason: EngineError,
    },
    ReceiveReconnectSuccess {
        cursor: Cursor,
        messages: Vec<Envelope>,
    },
    ReceiveReconnectFailure {
        reason: EngineError,
        attempt: u32,
    },
    ReceiveReconnectGiveup {
        reason: EngineError,
    },
    /// Stop the loop but keep the subscription set and cursor.
    Disconnect,
    /// Resume after a disconnect or give-up, optionally from another cursor.
    Reconnect {
        cursor: Option<Cursor>,
    },
    /// Drop every subscription.
    UnsubscribeAll,
}

impl Named for SubscribeEvent {
    fn name(&self) -> &'static str {
        match self {
            SubscribeEvent::SubscriptionChanged { .. } => "subscription_changed",
            SubscribeEvent::SubscriptionRestored { .. } => "subscription_restored",
            SubscribeEvent::HandshakeSuccess { .. } => "handshake_success",
            SubscribeEvent::HandshakeFailure { .. } => "handshake_failure",
            SubscribeEvent::HandshakeReconnectSuccess { .. } => "handshake_reconnect_success",
            SubscribeEvent::HandshakeReconnectFailure { .. } => "handshake_reconnect_failure",
            SubscribeEvent::HandshakeReconnectGiveup { .. } => "handshake_reconnect_giveup",
            SubscribeEvent::ReceiveSuccess { .. } => "receive_success",
            SubscribeEvent::ReceiveFailure { .. } => "receive_failure",
            SubscribeEvent::ReceiveReconnectSuccess { .. } => "receive_reconnect_success",
            SubscribeEvent::ReceiveReconnectFailure { .. } => "receive_reconnect_failure",
            SubscribeEvent::ReceiveReconnectGiveup { .. } => "receive_reconnect_giveup",
            SubscribeEvent::Disconnect => "disconnect",
            SubscribeEvent::Reconnect { .. } => "reconnect",
            SubscribeEvent::UnsubscribeAll => "unsubscribe_all",
        }
    }
}
