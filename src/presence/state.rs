//! # Presence heartbeat states.
//!
//! ```text
//!              Joined                 HeartbeatSuccess
//! Inactive ─────────────► Heartbeating ───────────────► Cooldown
//!                            ▲    │                        │
//!                   TimesUp  └────┼────────────────────────┘
//!                                 │ HeartbeatFailure
//!                                 ▼
//!                          Reconnecting ── success ──► Cooldown
//!                                 │ give-up
//!                                 ▼
//!                               Failed
//! Disconnect: any active state → Stopped (+ Leave unless suppressed)
//! Reconnect:  Failed / Stopped → Heartbeating
//! ```
//!
//! Joined and Left edit the heartbeated set in every state. An empty set
//! always ends in `Inactive`; `Stopped` keeps tracking the set without
//! heartbeating until `Reconnect`.

use std::collections::BTreeSet;

use crate::engine::{Named, State, Transition};
use crate::error::EngineError;
use crate::presence::context::HeartbeatContext;
use crate::presence::event::HeartbeatEvent;
use crate::presence::invocation::HeartbeatInvocation;

/// State of the presence heartbeat loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum HeartbeatState {
    #[default]
    Inactive,
    Heartbeating,
    Cooldown,
    Reconnecting,
    Failed,
    Stopped,
}

impl Named for HeartbeatState {
    fn name(&self) -> &'static str {
        match self {
            HeartbeatState::Inactive => "heartbeat_inactive",
            HeartbeatState::Heartbeating => "heartbeating",
            HeartbeatState::Cooldown => "heartbeat_cooldown",
            HeartbeatState::Reconnecting => "heartbeat_reconnecting",
            HeartbeatState::Failed => "heartbeat_failed",
            HeartbeatState::Stopped => "heartbeat_stopped",
        }
    }
}

fn leave(
    suppress: bool,
    channels: &BTreeSet<String>,
    groups: &BTreeSet<String>,
) -> Option<HeartbeatInvocation> {
    (!suppress && !(channels.is_empty() && groups.is_empty())).then(|| HeartbeatInvocation::Leave {
        channels: channels.clone(),
        groups: groups.clone(),
    })
}

/// `Heartbeating` on `ctx`, or `Inactive` when it tracks nothing.
fn active(ctx: HeartbeatContext) -> Transition<HeartbeatState> {
    if ctx.is_empty() {
        Transition::to(HeartbeatState::Inactive, ctx)
    } else {
        Transition::to(HeartbeatState::Heartbeating, ctx)
    }
}

fn retry_or_give_up(
    ctx: &HeartbeatContext,
    attempts: u32,
    reason: EngineError,
) -> Transition<HeartbeatState> {
    let next = ctx.failed(attempts, reason);
    if ctx.policy.should_give_up(attempts) {
        Transition::to(HeartbeatState::Failed, next)
    } else {
        Transition::to(HeartbeatState::Reconnecting, next)
    }
}

impl State for HeartbeatState {
    type Context = HeartbeatContext;
    type Event = HeartbeatEvent;
    type Invocation = HeartbeatInvocation;

    fn on_enter(&self, ctx: &HeartbeatContext) -> Option<HeartbeatInvocation> {
        match self {
            HeartbeatState::Heartbeating => Some(HeartbeatInvocation::Heartbeat {
                channels: ctx.channels.clone(),
                groups: ctx.groups.clone(),
            }),
            HeartbeatState::Cooldown => Some(HeartbeatInvocation::Wait),
            HeartbeatState::Reconnecting => Some(HeartbeatInvocation::DelayedHeartbeat {
                channels: ctx.channels.clone(),
                groups: ctx.groups.clone(),
                attempt: ctx.attempts,
                reason: ctx.reason.clone(),
            }),
            _ => None,
        }
    }

    fn on_exit(&self, _ctx: &HeartbeatContext) -> Option<HeartbeatInvocation> {
        match self {
            HeartbeatState::Heartbeating => Some(HeartbeatInvocation::CancelHeartbeat),
            HeartbeatState::Cooldown => Some(HeartbeatInvocation::CancelWait),
            HeartbeatState::Reconnecting => Some(HeartbeatInvocation::CancelDelayedHeartbeat),
            _ => None,
        }
    }

    fn transition(
        &self,
        ctx: &HeartbeatContext,
        event: HeartbeatEvent,
    ) -> Option<Transition<Self>> {
        use HeartbeatEvent as E;
        use HeartbeatState as S;

        let next = match (*self, event) {
            (S::Stopped, E::Joined { channels, groups }) => {
                Transition::to(S::Stopped, ctx.joined(&channels, &groups))
            }
            (_, E::Joined { channels, groups }) => active(ctx.joined(&channels, &groups)),

            (S::Inactive, E::Left { .. } | E::LeftAll { .. } | E::Disconnect { .. }) => {
                return None;
            }
            (S::Stopped, E::Left { channels, groups, .. }) => {
                let next = ctx.left(&channels, &groups);
                if next.is_empty() {
                    Transition::to(S::Inactive, next)
                } else {
                    Transition::to(S::Stopped, next)
                }
            }
            (_, E::Left {
                channels,
                groups,
                suppress_leave,
            }) => active(ctx.left(&channels, &groups))
                .with_opt(leave(suppress_leave, &channels, &groups)),
            (S::Stopped, E::LeftAll { .. }) => Transition::to(S::Inactive, ctx.cleared()),
            (_, E::LeftAll { suppress_leave }) => Transition::to(S::Inactive, ctx.cleared())
                .with_opt(leave(suppress_leave, &ctx.channels, &ctx.groups)),

            (S::Heartbeating | S::Reconnecting, E::HeartbeatSuccess) => {
                Transition::to(S::Cooldown, ctx.reset_attempts())
            }
            (S::Heartbeating, E::HeartbeatFailure { reason, attempt }) => {
                retry_or_give_up(ctx, attempt.max(1), reason)
            }
            (S::Reconnecting, E::HeartbeatFailure { reason, .. }) => {
                retry_or_give_up(ctx, ctx.attempts.saturating_add(1), reason)
            }
            (S::Reconnecting, E::HeartbeatGiveup { reason }) => {
                Transition::to(S::Failed, ctx.failed(ctx.attempts, reason))
            }
            (S::Cooldown, E::TimesUp) => Transition::to(S::Heartbeating, ctx.clone()),

            (
                S::Heartbeating | S::Cooldown | S::Reconnecting | S::Failed,
                E::Disconnect { suppress_leave },
            ) => Transition::to(S::Stopped, ctx.reset_attempts())
                .with_opt(leave(suppress_leave, &ctx.channels, &ctx.groups)),
            (S::Failed | S::Stopped, E::Reconnect) => active(ctx.reset_attempts()),

            _ => return None,
        };
        Some(next)
    }
}
