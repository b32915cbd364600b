//! # Effect dispatcher - registry of running effects keyed by invocation kind.
//!
//! The dispatcher receives the invocations produced by a state machine and
//! classifies each one through [`Invocation::dispatch`]:
//!
//! ```text
//! dispatch(invocation)
//!   ├─► Emit            → effects.emit(invocation)            (inline, no network)
//!   ├─► Manage(kind)    → spawn effects.run(invocation, token) and register under `kind`
//!   ├─► Cancel(kind)    → remove `kind` from the registry, stop it (idempotent)
//!   └─► Detach          → spawn effects.run(...), never registered, result only logged
//! ```
//!
//! A managed effect reports its terminal event as a [`Completion`] tagged with
//! `(kind, id)`. The engine feeds a completion to the machine only if
//! [`Dispatcher::accept`] confirms that exact effect is still registered.
//!
//! ## Rules
//! - The registry holds at most one effect per kind.
//! - The machine emits exit (cancel) invocations before enter (start) ones,
//!   so a start normally finds the slot empty; a leftover is stopped first.
//! - A stopped effect never reports: its run future is dropped at the next
//!   await point and its completion (if already queued) fails `accept`.
//! - A panicking effect still completes: the panic is logged, and the
//!   completion carries whatever [`Effects::panicked`] maps it to (possibly
//!   nothing). Either way `accept` frees the slot.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::engine::Named;
use crate::error::EngineError;

/// How the dispatcher treats an invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatch<K> {
    /// Run synchronously inline (listener delivery).
    Emit,
    /// Long-running, cancellable work registered under `K`.
    Manage(K),
    /// Stop the effect registered under `K`.
    Cancel(K),
    /// Fire-and-forget work that never reports back.
    Detach,
}

/// Invocation understood by a [`Dispatcher`].
pub trait Invocation: Named + Send + 'static {
    /// Registry key of manageable invocations.
    type Kind: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static;

    /// Classifies the invocation.
    fn dispatch(&self) -> Dispatch<Self::Kind>;
}

/// Executes invocations on behalf of a [`Dispatcher`].
///
/// One implementation per engine maps each invocation variant to its effect
/// with a plain `match`.
#[async_trait]
pub trait Effects<I: Invocation>: Send + Sync + 'static {
    /// Event reported back to the machine by managed effects.
    type Event: Send + 'static;

    /// Runs an emittable invocation inline. Must not block or fail.
    fn emit(&self, invocation: I);

    /// Runs a managed or detached invocation to completion.
    ///
    /// Implementations pass `token` to every blocking call and return `None`
    /// once they observe cancellation.
    async fn run(&self, invocation: I, token: CancellationToken) -> Option<Self::Event>;

    /// Maps a panic of the managed effect `kind` to the event the machine
    /// should see instead. The default reports nothing.
    fn panicked(&self, kind: I::Kind, reason: EngineError) -> Option<Self::Event> {
        let _ = (kind, reason);
        None
    }
}

/// Terminal outcome of one managed effect.
///
/// `event` is `None` only when the effect panicked and
/// [`Effects::panicked`] had no event for it.
#[derive(Debug)]
pub struct Completion<K, E> {
    pub kind: K,
    pub id: u64,
    pub event: Option<E>,
}

/// Handle to a running managed effect.
struct RunningEffect {
    id: u64,
    token: CancellationToken,
    join: JoinHandle<()>,
}

impl RunningEffect {
    /// Requests cooperative cancellation. Safe to call repeatedly.
    fn stop(&self) {
        self.token.cancel();
    }
}

/// Registry of running effects for one engine.
pub struct Dispatcher<I: Invocation, H: Effects<I>> {
    effects: Arc<H>,
    running: HashMap<I::Kind, RunningEffect>,
    completions: mpsc::UnboundedSender<Completion<I::Kind, H::Event>>,
    parent: CancellationToken,
    next_id: u64,
}

impl<I: Invocation, H: Effects<I>> Dispatcher<I, H> {
    /// Creates a dispatcher; effect tokens are children of `parent`.
    pub fn new(
        effects: Arc<H>,
        completions: mpsc::UnboundedSender<Completion<I::Kind, H::Event>>,
        parent: CancellationToken,
    ) -> Self {
        Self {
            effects,
            running: HashMap::new(),
            completions,
            parent,
            next_id: 0,
        }
    }

    /// Dispatches one invocation.
    pub fn dispatch(&mut self, invocation: I) {
        match invocation.dispatch() {
            Dispatch::Emit => self.effects.emit(invocation),
            Dispatch::Manage(kind) => self.start(kind, invocation),
            Dispatch::Cancel(kind) => self.cancel(kind),
            Dispatch::Detach => self.detach(invocation),
        }
    }

    /// Starts a managed effect and registers it under `kind`.
    fn start(&mut self, kind: I::Kind, invocation: I) {
        if let Some(previous) = self.running.remove(&kind) {
            warn!(?kind, id = previous.id, "effect still registered on start, stopping it");
            previous.stop();
        }

        self.next_id += 1;
        let id = self.next_id;
        let token = self.parent.child_token();
        let name = invocation.name();
        let effects = Arc::clone(&self.effects);
        let completions = self.completions.clone();
        let effect_token = token.clone();

        let join = tokio::spawn(async move {
            let run = std::panic::AssertUnwindSafe(effects.run(invocation, effect_token.clone()))
                .catch_unwind();
            let res = tokio::select! {
                biased;
                _ = effect_token.cancelled() => return,
                res = run => res,
            };

            let event = match res {
                Ok(Some(event)) => Some(event),
                Ok(None) => return,
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    error!(effect = name, ?kind, id, panic = %message, "effect panicked");
                    effects.panicked(kind, EngineError::EffectPanicked { effect: name, message })
                }
            };

            if effect_token.is_cancelled() {
                debug!(effect = name, id, "discarding result of stopped effect");
                return;
            }
            let _ = completions.send(Completion { kind, id, event });
        });

        debug!(effect = name, ?kind, id, "effect started");
        self.running.insert(kind, RunningEffect { id, token, join });
    }

    /// Stops and forgets the effect registered under `kind`, if any.
    fn cancel(&mut self, kind: I::Kind) {
        if let Some(effect) = self.running.remove(&kind) {
            debug!(?kind, id = effect.id, "effect stopped");
            effect.stop();
        }
    }

    /// Spawns a fire-and-forget effect.
    fn detach(&self, invocation: I) {
        let name = invocation.name();
        let effects = Arc::clone(&self.effects);
        let token = self.parent.child_token();
        tokio::spawn(async move {
            if effects.run(invocation, token).await.is_some() {
                debug!(effect = name, "detached effect result ignored");
            }
        });
    }

    /// Confirms a completion still belongs to the registered effect of its kind.
    ///
    /// On success the entry is removed (the effect is done). Stale completions
    /// (effect stopped or replaced meanwhile) return `false`.
    pub fn accept(&mut self, completion: &Completion<I::Kind, H::Event>) -> bool {
        let current = self
            .running
            .get(&completion.kind)
            .is_some_and(|e| e.id == completion.id && !e.token.is_cancelled());
        if current {
            self.running.remove(&completion.kind);
        }
        current
    }

    /// Returns `true` if an effect is registered under `kind`.
    pub fn is_running(&self, kind: I::Kind) -> bool {
        self.running.contains_key(&kind)
    }

    /// Returns the kinds currently registered.
    pub fn running_kinds(&self) -> Vec<I::Kind> {
        self.running.keys().copied().collect()
    }

    /// Stops every registered effect and waits for their tasks to finish.
    pub async fn shutdown(&mut self) {
        let effects: Vec<RunningEffect> = self.running.drain().map(|(_, e)| e).collect();
        for e in &effects {
            e.stop();
        }
        for e in effects {
            if let Err(je) = e.join.await {
                if je.is_panic() {
                    error!(id = e.id, "effect task panicked during shutdown");
                }
            }
        }
    }
}

/// Extracts the message of a panic payload.
fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
