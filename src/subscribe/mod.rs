//! # Subscribe engine.
//!
//! Drives the handshake / long-poll loop for the current channel and group set:
//!
//! - [`SubscribeState`]: states and the transition table
//! - [`SubscribeContext`]: channels, groups, cursor, attempts, last failure
//! - [`SubscribeEvent`] / [`SubscribeInvocation`]: machine input and output
//! - [`SubscribeEffects`]: network calls and listener delivery
//!
//! The engine runs as an [`EngineHandle<SubscribeState>`](crate::engine::EngineHandle)
//! owned by the [`SubscriptionManager`](crate::SubscriptionManager).

mod context;
mod effects;
mod event;
mod invocation;
mod state;

pub use context::SubscribeContext;
pub use effects::SubscribeEffects;
pub use event::SubscribeEvent;
pub use invocation::{SubscribeEffectKind, SubscribeInvocation};
pub use state::SubscribeState;
