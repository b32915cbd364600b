//! # Engine actor: owns one state machine and its dispatcher.
//!
//! ```text
//!  EngineHandle::send(event) ──► [events mpsc] ──┐
//!                                                ▼
//!                         ┌──────── engine loop (one tokio task) ────────┐
//!                         │  machine.trigger(event) → [invocations]       │
//!                         │  dispatcher.dispatch(each)                    │
//!                         │  snapshot.send(state, context)                │
//!                         └──────────────▲────────────────────────────────┘
//!  effect tasks ── Completion{kind,id} ──┘  (only if dispatcher.accept())
//! ```
//!
//! ## Rules
//! - The machine is touched only by the loop, so `trigger` is never concurrent.
//! - Stale completions are dropped before they reach the machine. An
//!   accepted completion without an event (unmapped panic) is logged with the
//!   current state and skipped.
//! - The loop exits when its token is cancelled or every handle is dropped;
//!   on exit all running effects are stopped and joined.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace};

use crate::engine::dispatcher::{Completion, Dispatcher, Effects, Invocation};
use crate::engine::machine::{State, StateMachine};
use crate::error::ClientError;

/// Point-in-time view of an engine, published after every processed event.
#[derive(Debug, Clone)]
pub struct Snapshot<S: State> {
    pub state: S,
    pub context: S::Context,
}

/// Owning handle to a running engine actor.
pub struct EngineHandle<S: State> {
    name: &'static str,
    events: mpsc::UnboundedSender<S::Event>,
    snapshot: watch::Receiver<Snapshot<S>>,
    token: CancellationToken,
    join: JoinHandle<()>,
}

impl<S: State> EngineHandle<S> {
    /// Spawns the engine loop for `machine`, executing invocations with `effects`.
    ///
    /// `token` stops the loop and (through child tokens) every running effect.
    pub fn spawn<H>(
        name: &'static str,
        machine: StateMachine<S>,
        effects: Arc<H>,
        token: CancellationToken,
    ) -> Self
    where
        S::Invocation: Invocation,
        H: Effects<S::Invocation, Event = S::Event>,
    {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        let (snap_tx, snap_rx) = watch::channel(Snapshot {
            state: machine.state(),
            context: machine.context().clone(),
        });
        let dispatcher = Dispatcher::new(effects, done_tx, token.child_token());

        let join = tokio::spawn(run_loop(
            name,
            machine,
            dispatcher,
            events_rx,
            done_rx,
            snap_tx,
            token.clone(),
        ));

        Self {
            name,
            events: events_tx,
            snapshot: snap_rx,
            token,
            join,
        }
    }

    /// Engine name used in logs and errors.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Queues an event for the machine.
    pub fn send(&self, event: S::Event) -> Result<(), ClientError> {
        self.events
            .send(event)
            .map_err(|_| ClientError::EngineClosed { engine: self.name })
    }

    /// Returns the latest published snapshot.
    pub fn snapshot(&self) -> Snapshot<S> {
        self.snapshot.borrow().clone()
    }

    /// Returns a receiver that observes every published snapshot.
    pub fn watch(&self) -> watch::Receiver<Snapshot<S>> {
        self.snapshot.clone()
    }

    /// Waits until the published snapshot satisfies `pred`.
    pub async fn wait_for(
        &self,
        mut pred: impl FnMut(&Snapshot<S>) -> bool,
    ) -> Result<Snapshot<S>, ClientError> {
        let mut rx = self.snapshot.clone();
        let snap = rx
            .wait_for(|s| pred(s))
            .await
            .map_err(|_| ClientError::EngineClosed { engine: self.name })?;
        Ok(snap.clone())
    }

    /// Stops the loop and waits until every effect has been stopped.
    pub async fn shutdown(self) {
        self.token.cancel();
        let _ = self.join.await;
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_loop<S, H>(
    name: &'static str,
    mut machine: StateMachine<S>,
    mut dispatcher: Dispatcher<S::Invocation, H>,
    mut events: mpsc::UnboundedReceiver<S::Event>,
    mut completions: mpsc::UnboundedReceiver<
        Completion<<S::Invocation as Invocation>::Kind, S::Event>,
    >,
    snapshot: watch::Sender<Snapshot<S>>,
    token: CancellationToken,
) where
    S: State,
    S::Invocation: Invocation,
    H: Effects<S::Invocation, Event = S::Event>,
{
    debug!(engine = name, state = ?machine.state(), "engine started");
    loop {
        let event = tokio::select! {
            _ = token.cancelled() => break,
            ev = events.recv() => match ev {
                Some(ev) => ev,
                None => break,
            },
            Some(done) = completions.recv() => {
                if !dispatcher.accept(&done) {
                    trace!(engine = name, kind = ?done.kind, id = done.id, "stale completion dropped");
                    continue;
                }
                match done.event {
                    Some(event) => event,
                    None => {
                        error!(
                            engine = name,
                            state = ?machine.state(),
                            kind = ?done.kind,
                            id = done.id,
                            "effect panicked without a failure event, slot freed"
                        );
                        continue;
                    }
                }
            }
        };

        for invocation in machine.trigger(event) {
            dispatcher.dispatch(invocation);
        }
        snapshot.send_replace(Snapshot {
            state: machine.state(),
            context: machine.context().clone(),
        });
    }

    dispatcher.shutdown().await;
    debug!(engine = name, state = ?machine.state(), "engine stopped");
}
