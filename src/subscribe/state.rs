//! # Subscribe engine states and transition table.
//!
//! ```text
//!                SubscriptionChanged
//! Unsubscribed ───────────────────────► Handshaking ──HandshakeSuccess──► Receiving ◄─┐
//!                                          │    ▲                            │  │     │ ReceiveSuccess
//!                             HandshakeFailure  │ HandshakeReconnectSuccess  │  └─────┘
//!                                          ▼    │                      ReceiveFailure
//!                                HandshakeReconnecting                       ▼
//!                                          │ give-up               ReceiveReconnecting
//!                                          ▼                                 │ give-up
//!                                   HandshakeFailed                          ▼
//!                                                                       ReceiveFailed
//! Disconnect: Handshaking* → HandshakeStopped, Receiving* → ReceiveStopped
//! Reconnect:  *Failed / *Stopped → back into the loop with attempts = 0
//! ```
//!
//! Rows shared by every state (checked first):
//! - `SubscriptionChanged` with no channels and no groups, or `UnsubscribeAll`,
//!   go to `Unsubscribed`;
//! - `SubscriptionRestored` goes to `Receiving` at the given cursor.
//!
//! A reconnect failure increments `attempts` by one; when the policy says the
//! budget is spent the machine moves to the matching *Failed* state and emits a
//! `Disconnected` status carrying the failure.

use crate::engine::{Named, State, Transition};
use crate::error::EngineError;
use crate::models::Envelope;
use crate::subscribe::context::SubscribeContext;
use crate::subscribe::event::SubscribeEvent;
use crate::subscribe::invocation::SubscribeInvocation;

/// State of the subscribe loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SubscribeState {
    #[default]
    Unsubscribed,
    Handshaking,
    HandshakeReconnecting,
    HandshakeFailed,
    HandshakeStopped,
    Receiving,
    ReceiveReconnecting,
    ReceiveFailed,
    ReceiveStopped,
}

impl Named for SubscribeState {
    fn name(&self) -> &'static str {
        match self {
            SubscribeState::Unsubscribed => "unsubscribed",
            SubscribeState::Handshaking => "handshaking",
            SubscribeState::HandshakeReconnecting => "handshake_reconnecting",
            SubscribeState::HandshakeFailed => "handshake_failed",
            SubscribeState::HandshakeStopped => "handshake_stopped",
            SubscribeState::Receiving => "receiving",
            SubscribeState::ReceiveReconnecting => "receive_reconnecting",
            SubscribeState::ReceiveFailed => "receive_failed",
            SubscribeState::ReceiveStopped => "receive_stopped",
        }
    }
}

impl SubscribeState {
    /// `true` for states in which the client is considered connected.
    pub fn is_connected(&self) -> bool {
        matches!(
            self,
            SubscribeState::Receiving | SubscribeState::ReceiveReconnecting
        )
    }

    fn unsubscribe(&self, ctx: &SubscribeContext) -> Transition<Self> {
        let status = self
            .is_connected()
            .then(|| SubscribeInvocation::EmitStatus {
                status: ctx.disconnected_status(None),
            });
        Transition::to(SubscribeState::Unsubscribed, ctx.cleared()).with_opt(status)
    }

    /// Receiving at `ctx` (cursor already applied), reporting messages and,
    /// when this is the first success since a gap, the connection.
    fn received(ctx: SubscribeContext, messages: Vec<Envelope>) -> Transition<Self> {
        let status = (!ctx.connection_reported).then(|| SubscribeInvocation::EmitStatus {
            status: ctx.connected_status(),
        });
        let emit = (!messages.is_empty()).then_some(SubscribeInvocation::EmitMessages { messages });
        Transition::to(SubscribeState::Receiving, ctx.reported())
            .with_opt(emit)
            .with_opt(status)
    }

    /// Moves to `retry` with `attempts`, or to `failed` once the budget is spent.
    fn retry_or_give_up(
        retry: Self,
        failed: Self,
        ctx: &SubscribeContext,
        attempts: u32,
        reason: EngineError,
    ) -> Transition<Self> {
        let next = ctx.failed(attempts, reason);
        if ctx.policy.should_give_up(attempts) {
            let status = next.disconnected_status(Some(EngineError::GaveUp { attempts }));
            Transition::to(failed, next).with(SubscribeInvocation::EmitStatus { status })
        } else {
            Transition::to(retry, next)
        }
    }

    fn give_up(failed: Self, ctx: &SubscribeContext, reason: EngineError) -> Transition<Self> {
        let next = ctx.failed(ctx.attempts, reason.clone());
        let status = next.disconnected_status(Some(reason));
        Transition::to(failed, next).with(SubscribeInvocation::EmitStatus { status })
    }
}

impl State for SubscribeState {
    type Context = SubscribeContext;
    type Event = SubscribeEvent;
    type Invocation = SubscribeInvocation;

    fn on_enter(&self, ctx: &SubscribeContext) -> Option<SubscribeInvocation> {
        match self {
            SubscribeState::Handshaking => Some(SubscribeInvocation::Handshake {
                channels: ctx.channels.clone(),
                groups: ctx.groups.clone(),
            }),
            SubscribeState::HandshakeReconnecting => Some(SubscribeInvocation::HandshakeReconnect {
                channels: ctx.channels.clone(),
                groups: ctx.groups.clone(),
                attempt: ctx.attempts,
                reason: ctx.reason.clone(),
            }),
            SubscribeState::Receiving => Some(SubscribeInvocation::ReceiveMessages {
                channels: ctx.channels.clone(),
                groups: ctx.groups.clone(),
                cursor: ctx.cursor,
            }),
            SubscribeState::ReceiveReconnecting => Some(SubscribeInvocation::ReceiveReconnect {
                channels: ctx.channels.clone(),
                groups: ctx.groups.clone(),
                cursor: ctx.cursor,
                attempt: ctx.attempts,
                reason: ctx.reason.clone(),
            }),
            _ => None,
        }
    }

    fn on_exit(&self, _ctx: &SubscribeContext) -> Option<SubscribeInvocation> {
        match self {
            SubscribeState::Handshaking => Some(SubscribeInvocation::CancelHandshake),
            SubscribeState::HandshakeReconnecting => {
                Some(SubscribeInvocation::CancelHandshakeReconnect)
            }
            SubscribeState::Receiving => Some(SubscribeInvocation::CancelReceiveMessages),
            SubscribeState::ReceiveReconnecting => Some(SubscribeInvocation::CancelReceiveReconnect),
            _ => None,
        }
    }

    fn transition(
        &self,
        ctx: &SubscribeContext,
        event: SubscribeEvent,
    ) -> Option<Transition<Self>> {
        use SubscribeEvent as E;
        use SubscribeState as S;

        let next = match (*self, event) {
            (_, E::SubscriptionChanged { channels, groups })
                if channels.is_empty() && groups.is_empty() =>
            {
                self.unsubscribe(ctx)
            }
            (_, E::UnsubscribeAll) => self.unsubscribe(ctx),
            (_, E::SubscriptionRestored { channels, groups, cursor }) => {
                Transition::to(S::Receiving, ctx.restored(channels, groups, cursor))
            }

            (
                S::Unsubscribed
                | S::Handshaking
                | S::HandshakeReconnecting
                | S::HandshakeFailed
                | S::HandshakeStopped,
                E::SubscriptionChanged { channels, groups },
            ) => Transition::to(S::Handshaking, ctx.subscribed(channels, groups)),
            (
                S::Receiving | S::ReceiveReconnecting | S::ReceiveFailed | S::ReceiveStopped,
                E::SubscriptionChanged { channels, groups },
            ) => Transition::to(S::Receiving, ctx.subscribed(channels, groups)),

            (S::Handshaking, E::HandshakeSuccess { cursor })
            | (S::HandshakeReconnecting, E::HandshakeReconnectSuccess { cursor }) => {
                let next = ctx.advanced(cursor);
                let status = next.connected_status();
                Transition::to(S::Receiving, next.reported())
                    .with(SubscribeInvocation::EmitStatus { status })
            }
            (S::Handshaking, E::HandshakeFailure { reason, attempt }) => Self::retry_or_give_up(
                S::HandshakeReconnecting,
                S::HandshakeFailed,
                ctx,
                attempt.max(1),
                reason,
            ),
            (S::HandshakeReconnecting, E::HandshakeReconnectFailure { reason, .. }) => {
                Self::retry_or_give_up(
                    S::HandshakeReconnecting,
                    S::HandshakeFailed,
                    ctx,
                    ctx.attempts.saturating_add(1),
                    reason,
                )
            }
            (S::HandshakeReconnecting, E::HandshakeReconnectGiveup { reason }) => {
                Self::give_up(S::HandshakeFailed, ctx, reason)
            }
            (S::Handshaking | S::HandshakeReconnecting, E::Disconnect) => {
                Transition::to(S::HandshakeStopped, ctx.stopped())
            }
            (S::HandshakeFailed | S::HandshakeStopped, E::Reconnect { .. }) => {
                Transition::to(S::Handshaking, ctx.reset_attempts())
            }

            (S::Receiving, E::ReceiveSuccess { cursor, messages })
            | (S::ReceiveReconnecting, E::ReceiveReconnectSuccess { cursor, messages }) => {
                Self::received(ctx.advanced(cursor), messages)
            }
            (S::Receiving, E::ReceiveFailure { reason }) => Self::retry_or_give_up(
                S::ReceiveReconnecting,
                S::ReceiveFailed,
                ctx,
                1,
                reason,
            ),
            (S::ReceiveReconnecting, E::ReceiveReconnectFailure { reason, .. }) => {
                Self::retry_or_give_up(
                    S::ReceiveReconnecting,
                    S::ReceiveFailed,
                    ctx,
                    ctx.attempts.saturating_add(1),
                    reason,
                )
            }
            (S::ReceiveReconnecting, E::ReceiveReconnectGiveup { reason }) => {
                Self::give_up(S::ReceiveFailed, ctx, reason)
            }
            (S::Receiving | S::ReceiveReconnecting, E::Disconnect) => {
                let next = ctx.stopped();
                let status = next.disconnected_status(None);
                Transition::to(S::ReceiveStopped, next)
                    .with(SubscribeInvocation::EmitStatus { status })
            }
            (S::ReceiveFailed | S::ReceiveStopped, E::Reconnect { cursor }) => {
                let mut next = ctx.reset_attempts();
                if let Some(cursor) = cursor {
                    next.cursor = cursor;
                }
                Transition::to(S::Receiving, next)
            }

            _ => return None,
        };
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::{Arc, Mutex};

    use serde_json::json;

    use super::*;

    use crate::engine::StateMachine;
    use crate::error::TransportError;
    use crate::listeners::{Listener, ListenerSet};
    use crate::models::{Cursor, Status, StatusCategory};
    use crate::policies::ReconnectionPolicy;

    #[derive(Default)]
    struct StatusLog(Mutex<Vec<StatusCategory>>);

    impl Listener for StatusLog {
        fn on_status(&self, status: &Status) {
            self.0.lock().unwrap().push(status.category);
        }
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn timeout() -> EngineError {
        EngineError::Transport(TransportError::Timeout {
            timeout: std::time::Duration::from_secs(310),
        })
    }

    fn machine_in(state: SubscribeState, ctx: SubscribeContext) -> StateMachine<SubscribeState> {
        StateMachine::new(state, ctx)
    }

    fn receiving_ctx(policy: ReconnectionPolicy) -> SubscribeContext {
        SubscribeContext {
            channels: set(&["a"]),
            cursor: Cursor::new(50, 1),
            ..SubscribeContext::new(policy)
        }
    }

    fn statuses(out: &[SubscribeInvocation]) -> Vec<StatusCategory> {
        out.iter()
            .filter_map(|inv| match inv {
                SubscribeInvocation::EmitStatus { status } => Some(status.category),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn subscription_change_starts_handshake() {
        let mut m = machine_in(
            SubscribeState::Unsubscribed,
            SubscribeContext::new(ReconnectionPolicy::default()),
        );
        let out = m.trigger(SubscribeEvent::SubscriptionChanged {
            channels: set(&["a"]),
            groups: BTreeSet::new(),
        });

        assert_eq!(m.state(), SubscribeState::Handshaking);
        assert_eq!(
            out,
            vec![SubscribeInvocation::Handshake {
                channels: set(&["a"]),
                groups: BTreeSet::new(),
            }]
        );
    }

    #[test]
    fn handshake_failure_enters_reconnecting_with_one_attempt() {
        let ctx = SubscribeContext {
            channels: set(&["a"]),
            ..SubscribeContext::new(ReconnectionPolicy::default())
        };
        let mut m = machine_in(SubscribeState::Handshaking, ctx);
        let out = m.trigger(SubscribeEvent::HandshakeFailure {
            reason: timeout(),
            attempt: 1,
        });

        assert_eq!(m.state(), SubscribeState::HandshakeReconnecting);
        assert_eq!(m.context().attempts, 1);
        assert_eq!(m.context().reason, Some(timeout()));
        assert_eq!(out[0], SubscribeInvocation::CancelHandshake);
        assert!(matches!(
            out.last(),
            Some(SubscribeInvocation::HandshakeReconnect { attempt: 1, .. })
        ));
    }

    #[test]
    fn receive_reconnect_gives_up_past_budget() {
        let policy = ReconnectionPolicy::default();
        let max = policy.max_retries().unwrap_or_default();
        let ctx = SubscribeContext {
            attempts: max,
            ..receiving_ctx(policy)
        };
        let mut m = machine_in(SubscribeState::ReceiveReconnecting, ctx);
        let out = m.trigger(SubscribeEvent::ReceiveReconnectFailure {
            reason: timeout(),
            attempt: max,
        });

        assert_eq!(m.state(), SubscribeState::ReceiveFailed);
        assert_eq!(m.context().attempts, max + 1);
        assert_eq!(statuses(&out), vec![StatusCategory::Disconnected]);
        let Some(SubscribeInvocation::EmitStatus { status }) = out
            .iter()
            .find(|inv| matches!(inv, SubscribeInvocation::EmitStatus { .. }))
        else {
            panic!("expected a status");
        };
        assert_eq!(status.error, Some(EngineError::GaveUp { attempts: max + 1 }));
    }

    #[test]
    fn receive_success_emits_messages_then_connected() {
        let mut m = machine_in(
            SubscribeState::Receiving,
            receiving_ctx(ReconnectionPolicy::default()),
        );
        let m1 = Envelope::new("a", json!({"text": "hi"}));
        let out = m.trigger(SubscribeEvent::ReceiveSuccess {
            cursor: Cursor::new(100, 1),
            messages: vec![m1.clone()],
        });

        assert_eq!(m.state(), SubscribeState::Receiving);
        assert_eq!(m.context().cursor, Cursor::new(100, 1));
        assert_eq!(out.len(), 4);
        assert_eq!(out[0], SubscribeInvocation::CancelReceiveMessages);
        assert_eq!(out[1], SubscribeInvocation::EmitMessages { messages: vec![m1] });
        assert!(matches!(
            &out[2],
            SubscribeInvocation::EmitStatus { status } if status.category == StatusCategory::Connected
        ));
        assert_eq!(
            out[3],
            SubscribeInvocation::ReceiveMessages {
                channels: set(&["a"]),
                groups: BTreeSet::new(),
                cursor: Cursor::new(100, 1),
            }
        );
    }

    #[test]
    fn empty_receive_does_not_emit_messages() {
        let mut m = machine_in(
            SubscribeState::Receiving,
            receiving_ctx(ReconnectionPolicy::default()),
        );
        let out = m.trigger(SubscribeEvent::ReceiveSuccess {
            cursor: Cursor::new(60, 1),
            messages: vec![],
        });
        assert!(
            !out.iter()
                .any(|inv| matches!(inv, SubscribeInvocation::EmitMessages { .. }))
        );
    }

    #[test]
    fn older_cursor_is_not_taken() {
        let mut m = machine_in(
            SubscribeState::Receiving,
            receiving_ctx(ReconnectionPolicy::default()),
        );
        m.trigger(SubscribeEvent::ReceiveSuccess {
            cursor: Cursor::new(10, 1),
            messages: vec![],
        });
        assert_eq!(m.context().cursor, Cursor::new(50, 1));
    }

    #[test]
    fn attempts_count_one_per_reconnect_failure_and_reset_on_success() {
        let policy = ReconnectionPolicy::linear();
        let mut m = machine_in(SubscribeState::Receiving, receiving_ctx(policy));

        m.trigger(SubscribeEvent::ReceiveFailure { reason: timeout() });
        assert_eq!(m.context().attempts, 1);
        for expected in 2..=5 {
            m.trigger(SubscribeEvent::ReceiveReconnectFailure {
                reason: timeout(),
                attempt: expected - 1,
            });
            assert_eq!(m.state(), SubscribeState::ReceiveReconnecting);
            assert_eq!(m.context().attempts, expected);
        }

        m.trigger(SubscribeEvent::ReceiveReconnectSuccess {
            cursor: Cursor::new(70, 1),
            messages: vec![],
        });
        assert_eq!(m.state(), SubscribeState::Receiving);
        assert_eq!(m.context().attempts, 0);
        assert_eq!(m.context().reason, None);
    }

    #[test]
    fn give_up_happens_exactly_when_attempts_exceed_budget() {
        for max in 0..4u32 {
            let policy = ReconnectionPolicy::exponential().with_max_retries(Some(max));
            let ctx = SubscribeContext {
                channels: set(&["a"]),
                ..SubscribeContext::new(policy)
            };
            let mut m = machine_in(SubscribeState::Handshaking, ctx);
            m.trigger(SubscribeEvent::HandshakeFailure {
                reason: timeout(),
                attempt: 1,
            });
            while m.state() == SubscribeState::HandshakeReconnecting {
                m.trigger(SubscribeEvent::HandshakeReconnectFailure {
                    reason: timeout(),
                    attempt: m.context().attempts,
                });
            }
            assert_eq!(m.state(), SubscribeState::HandshakeFailed);
            assert_eq!(m.context().attempts, max + 1, "max_retries = {max}");
        }
    }

    #[test]
    fn none_policy_gives_up_on_first_failure() {
        let mut m = machine_in(
            SubscribeState::Receiving,
            receiving_ctx(ReconnectionPolicy::None),
        );
        let out = m.trigger(SubscribeEvent::ReceiveFailure { reason: timeout() });
        assert_eq!(m.state(), SubscribeState::ReceiveFailed);
        assert_eq!(statuses(&out), vec![StatusCategory::Disconnected]);
    }

    #[test]
    fn unrelated_context_fields_survive_transitions() {
        let ctx = SubscribeContext {
            groups: set(&["g"]),
            ..receiving_ctx(ReconnectionPolicy::linear())
        };
        let mut m = machine_in(SubscribeState::Receiving, ctx.clone());

        m.trigger(SubscribeEvent::ReceiveFailure { reason: timeout() });
        assert_eq!(m.context().channels, ctx.channels);
        assert_eq!(m.context().groups, ctx.groups);
        assert_eq!(m.context().cursor, ctx.cursor);
        assert_eq!(m.context().policy, ctx.policy);

        m.trigger(SubscribeEvent::Disconnect);
        assert_eq!(m.state(), SubscribeState::ReceiveStopped);
        assert_eq!(m.context().cursor, ctx.cursor);
        assert_eq!(m.context().attempts, 0);
    }

    #[test]
    fn disconnect_and_reconnect_resume_from_cursor() {
        let mut m = machine_in(
            SubscribeState::Receiving,
            receiving_ctx(ReconnectionPolicy::default()),
        );
        let out = m.trigger(SubscribeEvent::Disconnect);
        assert_eq!(statuses(&out), vec![StatusCategory::Disconnected]);
        assert_eq!(out[0], SubscribeInvocation::CancelReceiveMessages);

        let out = m.trigger(SubscribeEvent::Reconnect { cursor: None });
        assert_eq!(m.state(), SubscribeState::Receiving);
        assert!(matches!(
            out.as_slice(),
            [SubscribeInvocation::ReceiveMessages { cursor, .. }] if *cursor == Cursor::new(50, 1)
        ));

        m.trigger(SubscribeEvent::Disconnect);
        m.trigger(SubscribeEvent::Reconnect {
            cursor: Some(Cursor::new(5, 2)),
        });
        assert_eq!(m.context().cursor, Cursor::new(5, 2));
    }

    #[test]
    fn handshake_stopped_reconnects_through_handshake() {
        let ctx = SubscribeContext {
            channels: set(&["a"]),
            ..SubscribeContext::new(ReconnectionPolicy::default())
        };
        let mut m = machine_in(SubscribeState::Handshaking, ctx);
        let out = m.trigger(SubscribeEvent::Disconnect);
        assert_eq!(m.state(), SubscribeState::HandshakeStopped);
        assert_eq!(out, vec![SubscribeInvocation::CancelHandshake]);

        m.trigger(SubscribeEvent::Reconnect { cursor: None });
        assert_eq!(m.state(), SubscribeState::Handshaking);
    }

    #[test]
    fn emptying_the_set_unsubscribes() {
        let mut m = machine_in(
            SubscribeState::Receiving,
            receiving_ctx(ReconnectionPolicy::default()),
        );
        let out = m.trigger(SubscribeEvent::SubscriptionChanged {
            channels: BTreeSet::new(),
            groups: BTreeSet::new(),
        });
        assert_eq!(m.state(), SubscribeState::Unsubscribed);
        assert!(!m.context().has_subscriptions());
        assert_eq!(m.context().cursor, Cursor::default());
        assert_eq!(statuses(&out), vec![StatusCategory::Disconnected]);

        let mut m = machine_in(
            SubscribeState::Handshaking,
            receiving_ctx(ReconnectionPolicy::default()),
        );
        let out = m.trigger(SubscribeEvent::UnsubscribeAll);
        assert_eq!(m.state(), SubscribeState::Unsubscribed);
        assert_eq!(out, vec![SubscribeInvocation::CancelHandshake]);
    }

    #[test]
    fn restored_subscription_skips_handshake() {
        let mut m = machine_in(
            SubscribeState::HandshakeFailed,
            SubscribeContext::new(ReconnectionPolicy::default()),
        );
        let out = m.trigger(SubscribeEvent::SubscriptionRestored {
            channels: set(&["a", "b"]),
            groups: BTreeSet::new(),
            cursor: Cursor::new(42, 3),
        });
        assert_eq!(m.state(), SubscribeState::Receiving);
        assert_eq!(
            out,
            vec![SubscribeInvocation::ReceiveMessages {
                channels: set(&["a", "b"]),
                groups: BTreeSet::new(),
                cursor: Cursor::new(42, 3),
            }]
        );
    }

    #[test]
    fn changing_channels_while_receiving_resets_cursor() {
        let mut m = machine_in(
            SubscribeState::Receiving,
            receiving_ctx(ReconnectionPolicy::default()),
        );
        let out = m.trigger(SubscribeEvent::SubscriptionChanged {
            channels: set(&["a", "b"]),
            groups: BTreeSet::new(),
        });
        assert_eq!(m.state(), SubscribeState::Receiving);
        assert_eq!(m.context().cursor, Cursor::default());
        assert!(statuses(&out).is_empty());
    }

    #[test]
    fn unhandled_event_leaves_machine_usable() {
        let mut m = machine_in(
            SubscribeState::Unsubscribed,
            SubscribeContext::new(ReconnectionPolicy::default()),
        );
        let out = m.trigger(SubscribeEvent::HandshakeSuccess {
            cursor: Cursor::new(1, 1),
        });
        assert!(out.is_empty());
        assert_eq!(m.state(), SubscribeState::Unsubscribed);

        m.trigger(SubscribeEvent::SubscriptionChanged {
            channels: set(&["a"]),
            groups: BTreeSet::new(),
        });
        assert_eq!(m.state(), SubscribeState::Handshaking);
    }

    fn forbidden() -> EngineError {
        EngineError::Transport(TransportError::Status {
            code: 403,
            message: "forbidden".into(),
        })
    }

    fn reconnecting_ctx(attempts: u32) -> SubscribeContext {
        SubscribeContext {
            attempts,
            reason: Some(timeout()),
            ..receiving_ctx(ReconnectionPolicy::default())
        }
    }

    #[test]
    fn connected_follows_every_reconnect_success() {
        let listeners = ListenerSet::new();
        let seen = Arc::new(StatusLog::default());
        listeners.add(seen.clone());
        let mut m = machine_in(
            SubscribeState::Unsubscribed,
            SubscribeContext::new(ReconnectionPolicy::linear()),
        );

        let events = vec![
            SubscribeEvent::SubscriptionChanged {
                channels: set(&["a"]),
                groups: BTreeSet::new(),
            },
            SubscribeEvent::HandshakeSuccess {
                cursor: Cursor::new(10, 1),
            },
            SubscribeEvent::ReceiveSuccess {
                cursor: Cursor::new(11, 1),
                messages: vec![],
            },
            SubscribeEvent::ReceiveFailure { reason: timeout() },
            SubscribeEvent::ReceiveReconnectSuccess {
                cursor: Cursor::new(12, 1),
                messages: vec![],
            },
            SubscribeEvent::ReceiveSuccess {
                cursor: Cursor::new(13, 1),
                messages: vec![],
            },
        ];
        for event in events {
            for inv in m.trigger(event) {
                if let SubscribeInvocation::EmitStatus { status } = inv {
                    listeners.status(&status);
                }
            }
        }

        assert_eq!(m.state(), SubscribeState::Receiving);
        assert_eq!(
            *seen.0.lock().unwrap(),
            vec![StatusCategory::Connected, StatusCategory::Connected]
        );
    }

    #[test]
    fn first_receive_after_disconnect_reports_connected() {
        let mut m = machine_in(
            SubscribeState::Receiving,
            receiving_ctx(ReconnectionPolicy::default()).reported(),
        );
        let out = m.trigger(SubscribeEvent::ReceiveSuccess {
            cursor: Cursor::new(60, 1),
            messages: vec![],
        });
        assert!(statuses(&out).is_empty());

        m.trigger(SubscribeEvent::Disconnect);
        m.trigger(SubscribeEvent::Reconnect { cursor: None });
        let out = m.trigger(SubscribeEvent::ReceiveSuccess {
            cursor: Cursor::new(61, 1),
            messages: vec![],
        });
        assert_eq!(statuses(&out), vec![StatusCategory::Connected]);
        assert!(m.context().connection_reported);
    }

    #[test]
    fn handshake_reconnect_giveup_fails_with_reason() {
        let ctx = SubscribeContext {
            cursor: Cursor::default(),
            ..reconnecting_ctx(2)
        };
        let mut m = machine_in(SubscribeState::HandshakeReconnecting, ctx);
        let out = m.trigger(SubscribeEvent::HandshakeReconnectGiveup {
            reason: forbidden(),
        });

        assert_eq!(m.state(), SubscribeState::HandshakeFailed);
        assert_eq!(m.context().attempts, 2);
        assert_eq!(m.context().reason, Some(forbidden()));
        assert_eq!(
            out,
            vec![
                SubscribeInvocation::CancelHandshakeReconnect,
                SubscribeInvocation::EmitStatus {
                    status: Status::disconnected(set(&["a"]), BTreeSet::new(), Some(forbidden())),
                },
            ]
        );
    }

    #[test]
    fn receive_reconnect_giveup_fails_with_reason() {
        let mut m = machine_in(SubscribeState::ReceiveReconnecting, reconnecting_ctx(3));
        let out = m.trigger(SubscribeEvent::ReceiveReconnectGiveup {
            reason: forbidden(),
        });

        assert_eq!(m.state(), SubscribeState::ReceiveFailed);
        assert_eq!(m.context().attempts, 3);
        assert_eq!(m.context().cursor, Cursor::new(50, 1));
        assert_eq!(
            out,
            vec![
                SubscribeInvocation::CancelReceiveReconnect,
                SubscribeInvocation::EmitStatus {
                    status: Status::disconnected(set(&["a"]), BTreeSet::new(), Some(forbidden())),
                },
            ]
        );
    }

    #[test]
    fn disconnect_while_receive_reconnecting_stops_and_reports() {
        let mut m = machine_in(SubscribeState::ReceiveReconnecting, reconnecting_ctx(2));
        let out = m.trigger(SubscribeEvent::Disconnect);

        assert_eq!(m.state(), SubscribeState::ReceiveStopped);
        assert_eq!(m.context().attempts, 0);
        assert_eq!(m.context().reason, None);
        assert_eq!(m.context().cursor, Cursor::new(50, 1));
        assert_eq!(
            out,
            vec![
                SubscribeInvocation::CancelReceiveReconnect,
                SubscribeInvocation::EmitStatus {
                    status: Status::disconnected(set(&["a"]), BTreeSet::new(), None),
                },
            ]
        );
    }

    #[test]
    fn disconnect_while_handshake_reconnecting_stops_silently() {
        let mut m = machine_in(SubscribeState::HandshakeReconnecting, reconnecting_ctx(4));
        let out = m.trigger(SubscribeEvent::Disconnect);

        assert_eq!(m.state(), SubscribeState::HandshakeStopped);
        assert_eq!(m.context().attempts, 0);
        assert_eq!(m.context().reason, None);
        assert_eq!(out, vec![SubscribeInvocation::CancelHandshakeReconnect]);
    }

    #[test]
    fn subscription_change_after_receive_stop_or_failure_resumes_receiving() {
        for state in [SubscribeState::ReceiveFailed, SubscribeState::ReceiveStopped] {
            let mut m = machine_in(state, reconnecting_ctx(3));
            let out = m.trigger(SubscribeEvent::SubscriptionChanged {
                channels: set(&["a", "b"]),
                groups: set(&["g"]),
            });

            assert_eq!(m.state(), SubscribeState::Receiving, "from {state:?}");
            assert_eq!(m.context().attempts, 0);
            assert_eq!(m.context().reason, None);
            assert_eq!(m.context().cursor, Cursor::default());
            assert_eq!(
                out,
                vec![SubscribeInvocation::ReceiveMessages {
                    channels: set(&["a", "b"]),
                    groups: set(&["g"]),
                    cursor: Cursor::default(),
                }]
            );
        }
    }
}
