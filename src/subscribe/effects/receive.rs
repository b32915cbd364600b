//! Receive: one long-poll at the current cursor.

use std::collections::BTreeSet;

use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::error::TransportError;
use crate::models::Cursor;
use crate::subscribe::SubscribeEvent;
use crate::subscribe::effects::SubscribeEffects;

pub(super) async fn run(
    fx: &SubscribeEffects,
    channels: &BTreeSet<String>,
    groups: &BTreeSet<String>,
    cursor: Cursor,
    token: &CancellationToken,
) -> Option<SubscribeEvent> {
    match fx.subscribe(channels, groups, cursor, token).await {
        Ok(resp) => {
            trace!(cursor = %resp.cursor, messages = resp.messages.len(), "received");
            Some(SubscribeEvent::ReceiveSuccess {
                cursor: resp.cursor,
                messages: resp.messages,
            })
        }
        Err(TransportError::Cancelled) => None,
        Err(e) => {
            debug!(error = %e, label = e.as_label(), %cursor, "receive failed");
            Some(SubscribeEvent::ReceiveFailure { reason: e.into() })
        }
    }
}
