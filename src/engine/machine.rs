//! # Generic finite-state machine.
//!
//! [`StateMachine`] owns the current [`State`] and its context, and turns each
//! incoming event into an ordered list of invocations:
//!
//! ```text
//! trigger(event)
//!   ├─► current.transition(ctx, event)
//!   │     └─ None → warn!("unhandled event"), state untouched, []
//!   └─► Some(Transition { state: next, context, invocations })
//!         result = [ current.on_exit(ctx)?,        // cancel running work first
//!                    invocations…,                 // emit statuses / messages
//!                    next.on_enter(new ctx)? ]     // start new work last
//! ```
//!
//! ## Rules
//! - `trigger` is only ever called from the engine actor (single owner).
//! - Exit runs even when the next state is the same kind (re-entry).
//! - The context is replaced as a whole by the transition's context.
//! - An unhandled event never disables the machine.

use std::fmt;

use tracing::{debug, warn};

use crate::engine::Named;

/// One state of a state machine, plus its transition table.
///
/// States are plain tags; the data lives in [`State::Context`], which every
/// transition returns as a fresh value.
pub trait State: Copy + Eq + fmt::Debug + Named + Send + Sync + 'static {
    /// Data shared by all states of the machine.
    type Context: Clone + fmt::Debug + Send + Sync + 'static;
    /// Input of the machine.
    type Event: Named + Send + 'static;
    /// Output of the machine.
    type Invocation: Named + Send + 'static;

    /// Invocation issued when the machine enters this state.
    fn on_enter(&self, ctx: &Self::Context) -> Option<Self::Invocation>;

    /// Invocation issued when the machine leaves this state.
    fn on_exit(&self, ctx: &Self::Context) -> Option<Self::Invocation>;

    /// Looks up the transition for `event`; `None` if this state does not handle it.
    fn transition(&self, ctx: &Self::Context, event: Self::Event) -> Option<Transition<Self>>;
}

/// Result of a handled event: the next state, its context and extra invocations.
pub struct Transition<S: State> {
    pub state: S,
    pub context: S::Context,
    pub invocations: Vec<S::Invocation>,
}

impl<S: State> Transition<S> {
    /// Transition without extra invocations.
    pub fn to(state: S, context: S::Context) -> Self {
        Self {
            state,
            context,
            invocations: Vec::new(),
        }
    }

    /// Appends an invocation emitted between exit and enter.
    pub fn with(mut self, invocation: S::Invocation) -> Self {
        self.invocations.push(invocation);
        self
    }

    /// Appends an invocation if present.
    pub fn with_opt(mut self, invocation: Option<S::Invocation>) -> Self {
        self.invocations.extend(invocation);
        self
    }
}

/// Current state + context of one engine.
#[derive(Debug, Clone)]
pub struct StateMachine<S: State> {
    state: S,
    context: S::Context,
}

impl<S: State> StateMachine<S> {
    /// Creates a machine in `initial` state. No entry invocation is issued.
    pub fn new(initial: S, context: S::Context) -> Self {
        Self {
            state: initial,
            context,
        }
    }

    /// Returns the current state.
    #[inline]
    pub fn state(&self) -> S {
        self.state
    }

    /// Returns the current context.
    #[inline]
    pub fn context(&self) -> &S::Context {
        &self.context
    }

    /// Applies `event` and returns the ordered invocations to dispatch.
    pub fn trigger(&mut self, event: S::Event) -> Vec<S::Invocation> {
        let event_name = event.name();
        let Some(next) = self.state.transition(&self.context, event) else {
            warn!(
                state = self.state.name(),
                event = event_name,
                "unhandled event, ignoring"
            );
            return Vec::new();
        };

        let mut out = Vec::with_capacity(next.invocations.len() + 2);
        out.extend(self.state.on_exit(&self.context));
        out.extend(next.invocations);
        out.extend(next.state.on_enter(&next.context));

        debug!(
            from = self.state.name(),
            to = next.state.name(),
            event = event_name,
            invocations = out.len(),
            "transition"
        );

        self.state = next.state;
        self.context = next.context;
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum Door {
        Closed,
        Open,
    }

    impl Named for Door {
        fn name(&self) -> &'static str {
            match self {
                Door::Closed => "closed",
                Door::Open => "open",
            }
        }
    }

    #[derive(Debug)]
    enum Push {
        Open,
        Close,
        Knock,
    }

    impl Named for Push {
        fn name(&self) -> &'static str {
            match self {
                Push::Open => "open",
                Push::Close => "close",
                Push::Knock => "knock",
            }
        }
    }

    #[derive(Debug, PartialEq, Eq)]
    enum Action {
        StopDraft,
        Chime,
        StartDraft,
    }

    impl Named for Action {
        fn name(&self) -> &'static str {
            "action"
        }
    }

    impl State for Door {
        type Context = u32;
        type Event = Push;
        type Invocation = Action;

        fn on_enter(&self, _ctx: &u32) -> Option<Action> {
            matches!(self, Door::Open).then_some(Action::StartDraft)
        }

        fn on_exit(&self, _ctx: &u32) -> Option<Action> {
            matches!(self, Door::Open).then_some(Action::StopDraft)
        }

        fn transition(&self, ctx: &u32, event: Push) -> Option<Transition<Self>> {
            match (self, event) {
                (Door::Closed, Push::Open) => Some(Transition::to(Door::Open, ctx + 1)),
                (Door::Open, Push::Open) => {
                    Some(Transition::to(Door::Open, ctx + 1).with(Action::Chime))
                }
                (Door::Open, Push::Close) => Some(Transition::to(Door::Closed, *ctx)),
                _ => None,
            }
        }
    }

    #[test]
    fn orders_exit_transition_enter() {
        let mut m = StateMachine::new(Door::Closed, 0);
        assert_eq!(m.trigger(Push::Open), vec![Action::StartDraft]);
        assert_eq!(
            m.trigger(Push::Open),
            vec![Action::StopDraft, Action::Chime, Action::StartDraft]
        );
        assert_eq!(m.state(), Door::Open);
        assert_eq!(*m.context(), 2);
    }

    #[test]
    fn unhandled_event_keeps_machine_alive() {
        let mut m = StateMachine::new(Door::Closed, 7);
        assert!(m.trigger(Push::Knock).is_empty());
        assert!(m.trigger(Push::Close).is_empty());
        assert_eq!(m.state(), Door::Closed);
        assert_eq!(*m.context(), 7);

        assert_eq!(m.trigger(Push::Open), vec![Action::StartDraft]);
        assert_eq!(m.trigger(Push::Close), vec![Action::StopDraft]);
        assert_eq!(m.state(), Door::Closed);
    }
}
