//! # Presence effects.
//!
//! | invocation         | effect                                              |
//! |--------------------|-----------------------------------------------------|
//! | `Heartbeat`        | heartbeat call → success / failure(attempt 1)       |
//! | `Wait`             | sleep the heartbeat interval → `TimesUp`            |
//! | `DelayedHeartbeat` | sleep `policy.delay(attempt)`, then heartbeat call  |
//! | `Leave`            | leave call, detached; the outcome is only logged    |

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::engine::{Effects, Named};
use crate::error::{EngineError, TransportError};
use crate::policies::ReconnectionPolicy;
use crate::presence::{HeartbeatEffectKind, HeartbeatEvent, HeartbeatInvocation};
use crate::transport::Transport;
use crate::transport::endpoints::{self, ServiceParams};

/// Effect handler of the presence engine.
pub struct PresenceEffects {
    transport: Arc<dyn Transport>,
    params: ServiceParams,
    interval: Duration,
    policy: ReconnectionPolicy,
}

impl PresenceEffects {
    pub fn new(
        transport: Arc<dyn Transport>,
        params: ServiceParams,
        interval: Duration,
        policy: ReconnectionPolicy,
    ) -> Self {
        Self {
            transport,
            params,
            interval,
            policy,
        }
    }

    async fn heartbeat(
        &self,
        channels: &BTreeSet<String>,
        groups: &BTreeSet<String>,
        token: &CancellationToken,
    ) -> Result<(), TransportError> {
        let request = endpoints::heartbeat_request(&self.params, channels, groups);
        let result = self
            .transport
            .issue(request, token.clone())
            .await
            .and_then(endpoints::decode_presence_ack);
        if token.is_cancelled() {
            return Err(TransportError::Cancelled);
        }
        result
    }

    async fn sleep(&self, delay: Duration, token: &CancellationToken) -> bool {
        tokio::select! {
            biased;
            _ = token.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }
}

/// Sends a leave for `channels` / `groups`, logging the outcome.
pub(crate) async fn announce_leave(
    transport: &dyn Transport,
    params: &ServiceParams,
    channels: &BTreeSet<String>,
    groups: &BTreeSet<String>,
    token: CancellationToken,
) {
    let request = endpoints::leave_request(params, channels, groups);
    match transport
        .issue(request, token)
        .await
        .and_then(endpoints::decode_presence_ack)
    {
        Ok(()) => debug!(?channels, ?groups, "leave announced"),
        Err(TransportError::Cancelled) => {}
        Err(e) => warn!(error = %e, label = e.as_label(), "leave failed"),
    }
}

#[async_trait]
impl Effects<HeartbeatInvocation> for PresenceEffects {
    type Event = HeartbeatEvent;

    fn emit(&self, invocation: HeartbeatInvocation) {
        debug!(invocation = invocation.name(), "not an emit invocation, ignoring");
    }

    async fn run(
        &self,
        invocation: HeartbeatInvocation,
        token: CancellationToken,
    ) -> Option<HeartbeatEvent> {
        match invocation {
            HeartbeatInvocation::Heartbeat { channels, groups } => {
                match self.heartbeat(&channels, &groups, &token).await {
                    Ok(()) => Some(HeartbeatEvent::HeartbeatSuccess),
                    Err(TransportError::Cancelled) => None,
                    Err(e) => Some(HeartbeatEvent::HeartbeatFailure {
                        reason: e.into(),
                        attempt: 1,
                    }),
                }
            }
            HeartbeatInvocation::Wait => self
                .sleep(self.interval, &token)
                .await
                .then_some(HeartbeatEvent::TimesUp),
            HeartbeatInvocation::DelayedHeartbeat {
                channels,
                groups,
                attempt,
                ..
            } => {
                if !self.sleep(self.policy.delay(attempt), &token).await {
                    return None;
                }
                match self.heartbeat(&channels, &groups, &token).await {
                    Ok(()) => Some(HeartbeatEvent::HeartbeatSuccess),
                    Err(TransportError::Cancelled) => None,
                    Err(e) if !e.is_retryable() => {
                        warn!(error = %e, "heartbeat rejected, giving up");
                        Some(HeartbeatEvent::HeartbeatGiveup { reason: e.into() })
                    }
                    Err(e) => Some(HeartbeatEvent::HeartbeatFailure {
                        reason: e.into(),
                        attempt,
                    }),
                }
            }
            HeartbeatInvocation::Leave { channels, groups } => {
                announce_leave(
                    self.transport.as_ref(),
                    &self.params,
                    &channels,
                    &groups,
                    token,
                )
                .await;
                None
            }
            other => {
                debug!(invocation = other.name(), "not a managed invocation, ignoring");
                None
            }
        }
    }

    fn panicked(&self, kind: HeartbeatEffectKind, reason: EngineError) -> Option<HeartbeatEvent> {
        Some(match kind {
            HeartbeatEffectKind::Heartbeat => HeartbeatEvent::HeartbeatFailure { reason, attempt: 1 },
            HeartbeatEffectKind::Wait => HeartbeatEvent::TimesUp,
            HeartbeatEffectKind::DelayedHeartbeat => HeartbeatEvent::HeartbeatGiveup { reason },
        })
    }
}
