//! # Subscribe effects.
//!
//! [`SubscribeEffects`] maps each subscribe invocation to its effect with a
//! plain `match`:
//!
//! | invocation           | effect                                         | module        |
//! |----------------------|------------------------------------------------|---------------|
//! | `Handshake`          | subscribe at `{0,0}`                           | [`handshake`] |
//! | `ReceiveMessages`    | long-poll at the current cursor                | [`receive`]   |
//! | `HandshakeReconnect` | sleep `policy.delay(attempt)`, then handshake  | [`reconnect`] |
//! | `ReceiveReconnect`   | sleep `policy.delay(attempt)`, then long-poll  | [`reconnect`] |
//! | `EmitMessages`       | decode and hand to listeners                   | inline        |
//! | `EmitStatus`         | hand to listeners                              | inline        |
//!
//! Every network effect returns `None` once its token is cancelled, even if
//! the transport still produced a result.

mod handshake;
mod receive;
mod reconnect;

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::engine::{Effects, Named};
use crate::error::{EngineError, TransportError};
use crate::listeners::ListenerSet;
use crate::models::Cursor;
use crate::policies::ReconnectionPolicy;
use crate::subscribe::{SubscribeEffectKind, SubscribeEvent, SubscribeInvocation};
use crate::transport::endpoints::{self, ServiceParams, SubscribeResponse};
use crate::transport::Transport;

/// Effect handler of the subscribe engine.
pub struct SubscribeEffects {
    transport: Arc<dyn Transport>,
    listeners: Arc<ListenerSet>,
    params: ServiceParams,
    policy: ReconnectionPolicy,
}

impl SubscribeEffects {
    pub fn new(
        transport: Arc<dyn Transport>,
        listeners: Arc<ListenerSet>,
        params: ServiceParams,
        policy: ReconnectionPolicy,
    ) -> Self {
        Self {
            transport,
            listeners,
            params,
            policy,
        }
    }

    /// One subscribe call; `Cancelled` if `token` fired, whatever the transport said.
    async fn subscribe(
        &self,
        channels: &BTreeSet<String>,
        groups: &BTreeSet<String>,
        cursor: Cursor,
        token: &CancellationToken,
    ) -> Result<SubscribeResponse, TransportError> {
        let request = endpoints::subscribe_request(&self.params, channels, groups, cursor);
        let result = self
            .transport
            .issue(request, token.clone())
            .await
            .and_then(endpoints::decode_subscribe);
        if token.is_cancelled() {
            return Err(TransportError::Cancelled);
        }
        result
    }
}

#[async_trait]
impl Effects<SubscribeInvocation> for SubscribeEffects {
    type Event = SubscribeEvent;

    fn emit(&self, invocation: SubscribeInvocation) {
        match invocation {
            SubscribeInvocation::EmitMessages { messages } => self.listeners.deliver(&messages),
            SubscribeInvocation::EmitStatus { status } => self.listeners.status(&status),
            other => debug!(invocation = other.name(), "not an emit invocation, ignoring"),
        }
    }

    async fn run(
        &self,
        invocation: SubscribeInvocation,
        token: CancellationToken,
    ) -> Option<SubscribeEvent> {
        match invocation {
            SubscribeInvocation::Handshake { channels, groups } => {
                handshake::run(self, &channels, &groups, &token).await
            }
            SubscribeInvocation::ReceiveMessages {
                channels,
                groups,
                cursor,
            } => receive::run(self, &channels, &groups, cursor, &token).await,
            SubscribeInvocation::HandshakeReconnect {
                channels,
                groups,
                attempt,
                ..
            } => reconnect::handshake(self, &channels, &groups, attempt, &token).await,
            SubscribeInvocation::ReceiveReconnect {
                channels,
                groups,
                cursor,
                attempt,
                ..
            } => reconnect::receive(self, &channels, &groups, cursor, attempt, &token).await,
            other => {
                debug!(invocation = other.name(), "not a managed invocation, ignoring");
                None
            }
        }
    }

    /// A panicking first call counts as a failure; a panicking reconnect gives up.
    fn panicked(&self, kind: SubscribeEffectKind, reason: EngineError) -> Option<SubscribeEvent> {
        Some(match kind {
            SubscribeEffectKind::Handshake => SubscribeEvent::HandshakeFailure { reason, attempt: 1 },
            SubscribeEffectKind::ReceiveMessages => SubscribeEvent::ReceiveFailure { reason },
            SubscribeEffectKind::HandshakeReconnect => {
                SubscribeEvent::HandshakeReconnectGiveup { reason }
            }
            SubscribeEffectKind::ReceiveReconnect => SubscribeEvent::ReceiveReconnectGiveup { reason },
        })
    }
}
