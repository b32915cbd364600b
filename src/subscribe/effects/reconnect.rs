//! # Reconnect effects.
//!
//! ```text
//! sleep(policy.delay(attempt))  ── cancelled ──► None
//!   └─► same call as handshake / receive
//!         ├─ Ok                 ──► *ReconnectSuccess
//!         ├─ Cancelled          ──► None
//!         ├─ retryable error    ──► *ReconnectFailure{reason, attempt}
//!         └─ final error (4xx)  ──► *ReconnectGiveup{reason}
//! ```
//!
//! The retry budget itself is checked by the state when it processes the failure.

use std::collections::BTreeSet;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::TransportError;
use crate::models::Cursor;
use crate::subscribe::SubscribeEvent;
use crate::subscribe::effects::SubscribeEffects;

/// Sleeps the policy delay for `attempt`; `false` if cancelled meanwhile.
async fn backoff(fx: &SubscribeEffects, attempt: u32, token: &CancellationToken) -> bool {
    let delay = fx.policy.delay(attempt);
    debug!(attempt, ?delay, "reconnecting after delay");
    tokio::select! {
        biased;
        _ = token.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

pub(super) async fn handshake(
    fx: &SubscribeEffects,
    channels: &BTreeSet<String>,
    groups: &BTreeSet<String>,
    attempt: u32,
    token: &CancellationToken,
) -> Option<SubscribeEvent> {
    if !backoff(fx, attempt, token).await {
        return None;
    }
    match fx.subscribe(channels, groups, Cursor::default(), token).await {
        Ok(resp) => Some(SubscribeEvent::HandshakeReconnectSuccess {
            cursor: resp.cursor,
        }),
        Err(TransportError::Cancelled) => None,
        Err(e) if !e.is_retryable() => {
            Some(SubscribeEvent::HandshakeReconnectGiveup { reason: e.into() })
        }
        Err(e) => Some(SubscribeEvent::HandshakeReconnectFailure {
            reason: e.into(),
            attempt,
        }),
    }
}

pub(super) async fn receive(
    fx: &SubscribeEffects,
    channels: &BTreeSet<String>,
    groups: &BTreeSet<String>,
    cursor: Cursor,
    attempt: u32,
    token: &CancellationToken,
) -> Option<SubscribeEvent> {
    if !backoff(fx, attempt, token).await {
        return None;
    }
    match fx.subscribe(channels, groups, cursor, token).await {
        Ok(resp) => Some(SubscribeEvent::ReceiveReconnectSuccess {
            cursor: resp.cursor,
            messages: resp.messages,
        }),
        Err(TransportError::Cancelled) => None,
        Err(e) if !e.is_retryable() => {
            Some(SubscribeEvent::ReceiveReconnectGiveup { reason: e.into() })
        }
        Err(e) => Some(SubscribeEvent::ReceiveReconnectFailure {
            reason: e.into(),
            attempt,
        }),
    }
}
