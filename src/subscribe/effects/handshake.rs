//! Handshake: subscribe at `{0,0}` to obtain the first cursor.

use std::collections::BTreeSet;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::TransportError;
use crate::models::Cursor;
use crate::subscribe::SubscribeEvent;
use crate::subscribe::effects::SubscribeEffects;

pub(super) async fn run(
    fx: &SubscribeEffects,
    channels: &BTreeSet<String>,
    groups: &BTreeSet<String>,
    token: &CancellationToken,
) -> Option<SubscribeEvent> {
    match fx.subscribe(channels, groups, Cursor::default(), token).await {
        Ok(resp) => Some(SubscribeEvent::HandshakeSuccess {
            cursor: resp.cursor,
        }),
        Err(TransportError::Cancelled) => None,
        Err(e) => {
            debug!(error = %e, label = e.as_label(), "handshake failed");
            Some(SubscribeEvent::HandshakeFailure {
                reason: e.into(),
                attempt: 1,
            })
        }
    }
}
