//! # Presence heartbeat engine.
//!
//! Keeps this client present on its channels while the subscribe loop runs,
//! and announces leaves when channels are dropped. Enabled only when
//! [`Config::heartbeat_interval`](crate::Config::heartbeat_interval) is not zero.
//!
//! Built on the same [`engine`](crate::engine) machinery as the subscribe engine.

mod context;
mod effects;
mod event;
mod invocation;
mod state;

pub use context::HeartbeatContext;
pub use effects::PresenceEffects;
pub(crate) use effects::announce_leave;
pub use event::HeartbeatEvent;
pub use invocation::{HeartbeatEffectKind, HeartbeatInvocation};
pub use state::HeartbeatState;
