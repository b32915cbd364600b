//! # pubsub-engine
//!
//! **pubsub-engine** is the subscribe side of a publish/subscribe client:
//! a long-poll loop that follows a cursor through the message stream,
//! reconnects with backoff, and keeps presence alive with heartbeats.
//!
//! Both loops are explicit state machines. A state reacts to an event by
//! naming the next state and a list of *invocations*; the engine's dispatcher
//! turns invocations into running effects (network calls, timers, listener
//! callbacks) and feeds their results back as events.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  user ──► SubscriptionManager ─── subscribe / unsubscribe / disconnect / reconnect
//!                 │
//!        ┌────────┴─────────────────────────────┐
//!        ▼                                      ▼
//! ┌──────────────────────────┐       ┌──────────────────────────┐
//! │ subscribe engine         │       │ presence engine          │
//! │ (EngineHandle)           │       │ (optional, heartbeat)    │
//! │  StateMachine<Subscribe> │       │  StateMachine<Heartbeat> │
//! │  Dispatcher              │       │  Dispatcher              │
//! └──────┬────────────▲──────┘       └──────┬────────────▲──────┘
//!        │ invocations│ events              │            │
//!        ▼            │                     ▼            │
//! ┌──────────────────────────┐       ┌──────────────────────────┐
//! │ SubscribeEffects         │       │ PresenceEffects          │
//! │ handshake / receive /    │       │ heartbeat / wait /       │
//! │ reconnect / emit         │       │ delayed heartbeat / leave│
//! └──────┬──────────┬────────┘       └──────┬───────────────────┘
//!        │          │                       │
//!        ▼          ▼                       ▼
//!   ListenerSet   Transport (HttpTransport or any user implementation)
//!  (on_message, on_presence, on_status)
//! ```
//!
//! ### Subscribe loop
//! ```text
//! Unsubscribed ──SubscriptionChanged──► Handshaking ──HandshakeSuccess──► Receiving ◄──┐
//!                                          │                                 │        │
//!                                  HandshakeFailure                   ReceiveSuccess ─┘
//!                                          ▼                                 │
//!                               HandshakeReconnecting              ReceiveFailure
//!                                 │ attempts > budget                        ▼
//!                                 ▼                               ReceiveReconnecting
//!                              HandshakeFailed                      │ attempts > budget
//!                                                                   ▼
//!                                                                ReceiveFailed
//! ```
//!
//! ## Features
//! | Area              | Description                                                 | Key types / traits                          |
//! |-------------------|-------------------------------------------------------------|---------------------------------------------|
//! | **Client**        | Manage the subscription set and drive both engines.          | [`SubscriptionManager`], [`Subscription`]   |
//! | **Listeners**     | Receive messages, presence events and connection status.     | [`Listener`], [`ListenerSet`]               |
//! | **Policies**      | Delay and retry budget between reconnect attempts.           | [`ReconnectionPolicy`], [`JitterPolicy`]    |
//! | **Transport**     | Seam for the service calls, HTTP implementation included.    | [`Transport`], [`HttpTransport`]            |
//! | **Engine**        | Generic state machine, dispatcher and actor runtime.         | [`engine::State`], [`engine::EngineHandle`] |
//! | **Errors**        | Typed errors for transport, engines and the client surface.  | [`TransportError`], [`ClientError`]         |
//! | **Configuration** | Identity, origin, presence and retry settings.               | [`Config`]                                  |
//!
//! ## Optional features
//! - `http` (default): [`HttpTransport`] on `reqwest`.
//! - `logging`: exports a simple built-in [`LogListener`] _(demo/reference only)_.
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use pubsub_engine::{Config, Listener, Status, SubscribeState, Subscription, SubscriptionManager};
//!
//! struct Connection;
//! impl Listener for Connection {
//!     fn on_status(&self, status: &Status) {
//!         println!("{} {:?}", status.category, status.channels);
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut cfg = Config::new("sub-c-demo");
//!     cfg.heartbeat_interval = std::time::Duration::from_secs(60);
//!
//!     let listeners: Vec<Arc<dyn Listener>> = vec![Arc::new(Connection)];
//!     let manager = SubscriptionManager::builder(cfg)
//!         .with_listeners(listeners)
//!         .build()?;
//!
//!     manager.subscribe(Subscription::new().channels(["chat"]).with_presence())?;
//!     manager.wait_for(|s| s == SubscribeState::Receiving).await?;
//!
//!     manager.unsubscribe_all()?;
//!     manager.shutdown().await;
//!     Ok(())
//! }
//! ```
mod config;
mod error;
mod listeners;
mod manager;
mod models;
mod policies;

pub mod engine;
pub mod presence;
pub mod subscribe;
pub mod transport;

#[cfg(test)]
mod testing;

// ---- Public re-exports ----

pub use config::{Config, DEFAULT_ORIGIN, MIN_PRESENCE_TIMEOUT};
pub use error::{ClientError, EngineError, TransportError};
pub use listeners::{Listener, ListenerSet};
pub use manager::{ManagerBuilder, Subscription, SubscriptionManager};
pub use models::{
    Cursor, Decoded, Envelope, Message, MessageKind, PRESENCE_SUFFIX, PresenceAction,
    PresenceEvent, Status, StatusCategory,
};
pub use policies::{ExponentialDelay, JitterPolicy, LinearDelay, ReconnectionPolicy};
pub use subscribe::SubscribeState;
pub use transport::{Request, Transport};

#[cfg(feature = "http")]
pub use transport::HttpTransport;

// Optional: expose a simple built-in logging listener (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use listeners::LogListener;
