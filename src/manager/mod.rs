//! # Subscription manager: the client-facing driver of both engines.
//!
//! [`SubscriptionManager`] owns the "what am I subscribed to" set and turns
//! user calls into engine events:
//!
//! ```text
//! subscribe(sub)        ──► SubscriptionChanged / SubscriptionRestored ──► subscribe engine
//!                       └─► Joined                                     ──► presence engine
//! unsubscribe(sub)      ──► SubscriptionChanged(remaining set)
//!                       └─► Left (or a direct leave call without presence engine)
//! unsubscribe_all()     ──► UnsubscribeAll  + LeftAll
//! disconnect()          ──► Disconnect      + Disconnect
//! reconnect(cursor?)    ──► Reconnect       + Reconnect
//! ```
//!
//! The set lives behind a mutex; engines only ever see copies carried by events.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use pubsub_engine::{Config, Listener, Message, SubscribeState, Subscription, SubscriptionManager};
//!
//! struct Printer;
//! impl Listener for Printer {
//!     fn on_message(&self, m: &Message) {
//!         println!("{}: {}", m.channel, m.payload);
//!     }
//! }
//!
//! # async fn demo() -> Result<(), pubsub_engine::ClientError> {
//! let listeners: Vec<Arc<dyn Listener>> = vec![Arc::new(Printer)];
//! let manager = SubscriptionManager::builder(Config::new("sub-c-demo"))
//!     .with_listeners(listeners)
//!     .build()?;
//!
//! manager.subscribe(Subscription::new().channels(["chat"]).with_presence())?;
//! manager.wait_for(|s| s == SubscribeState::Receiving).await?;
//! manager.shutdown().await;
//! # Ok(())
//! # }
//! ```

mod builder;
mod subscription;

use std::collections::BTreeSet;
use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::engine::{EngineHandle, Snapshot};
use crate::error::ClientError;
use crate::listeners::{Listener, ListenerSet};
use crate::models::{Cursor, PRESENCE_SUFFIX};
use crate::presence::{HeartbeatEvent, HeartbeatState, announce_leave};
use crate::subscribe::{SubscribeEvent, SubscribeState};
use crate::transport::{ServiceParams, Transport};

pub use builder::ManagerBuilder;
pub use subscription::Subscription;
use subscription::without_companions;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Subscriptions {
    channels: BTreeSet<String>,
    groups: BTreeSet<String>,
}

impl Subscriptions {
    fn is_empty(&self) -> bool {
        self.channels.is_empty() && self.groups.is_empty()
    }
}

/// Removes every name in `names` and its presence companion from `set`.
/// Returns the names that were present.
fn remove_names(set: &mut BTreeSet<String>, names: &BTreeSet<String>) -> BTreeSet<String> {
    let mut removed = BTreeSet::new();
    for name in names {
        let plain = set.remove(name);
        let companion = set.remove(&format!("{name}{PRESENCE_SUFFIX}"));
        if plain || companion {
            removed.insert(name.clone());
        }
    }
    removed
}

/// Client-facing driver of the subscribe and presence engines.
pub struct SubscriptionManager {
    params: ServiceParams,
    suppress_leave: bool,
    transport: Arc<dyn Transport>,
    listeners: Arc<ListenerSet>,
    subscriptions: Mutex<Subscriptions>,
    subscribe: EngineHandle<SubscribeState>,
    presence: Option<EngineHandle<HeartbeatState>>,
    token: CancellationToken,
}

impl SubscriptionManager {
    /// Starts building a manager for `config`.
    pub fn builder(config: crate::Config) -> ManagerBuilder {
        ManagerBuilder::new(config)
    }

    /// Builds a manager on `transport` with no listeners.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: crate::Config, transport: Arc<dyn Transport>) -> Result<Self, ClientError> {
        ManagerBuilder::new(config).with_transport(transport).build()
    }

    fn set(&self) -> MutexGuard<'_, Subscriptions> {
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a listener.
    pub fn add_listener(&self, listener: Arc<dyn Listener>) {
        self.listeners.add(listener);
    }

    /// Removes a listener; `false` if it was not registered.
    pub fn remove_listener(&self, listener: &Arc<dyn Listener>) -> bool {
        self.listeners.remove(listener)
    }

    /// Adds channels and groups to the subscription set.
    ///
    /// With a cursor the loop resumes from it; otherwise a changed set
    /// restarts with a handshake. Subscribing to what is already subscribed
    /// is a no-op.
    pub fn subscribe(&self, sub: Subscription) -> Result<(), ClientError> {
        if sub.is_empty() {
            return Err(ClientError::EmptySubscription);
        }

        // Events leave while the set is locked so the engines see changes in
        // the order they were made.
        let mut set = self.set();
        let before = set.clone();
        set.channels.extend(sub.wire_channels());
        set.groups.extend(sub.wire_groups());

        match sub.cursor() {
            Some(cursor) => self.subscribe.send(SubscribeEvent::SubscriptionRestored {
                channels: set.channels.clone(),
                groups: set.groups.clone(),
                cursor,
            })?,
            None if *set != before => self.subscribe.send(SubscribeEvent::SubscriptionChanged {
                channels: set.channels.clone(),
                groups: set.groups.clone(),
            })?,
            None => {
                debug!("already subscribed, nothing to do");
                return Ok(());
            }
        }

        if let Some(presence) = &self.presence {
            presence.send(HeartbeatEvent::Joined {
                channels: without_companions(sub.channel_names()),
                groups: without_companions(sub.group_names()),
            })?;
        }
        Ok(())
    }

    /// Removes channels and groups (and their presence companions).
    ///
    /// Removing the last one stops the loop. Leaves are announced unless
    /// `suppress_leave_events` is set.
    pub fn unsubscribe(&self, sub: Subscription) -> Result<(), ClientError> {
        if sub.is_empty() {
            return Err(ClientError::EmptySubscription);
        }

        let mut set = self.set();
        let channels = remove_names(&mut set.channels, sub.channel_names());
        let groups = remove_names(&mut set.groups, sub.group_names());
        if channels.is_empty() && groups.is_empty() {
            debug!("not subscribed, nothing to do");
            return Ok(());
        }

        self.subscribe.send(SubscribeEvent::SubscriptionChanged {
            channels: set.channels.clone(),
            groups: set.groups.clone(),
        })?;
        match &self.presence {
            Some(presence) => presence.send(HeartbeatEvent::Left {
                channels,
                groups,
                suppress_leave: self.suppress_leave,
            }),
            None => {
                drop(set);
                self.leave(channels, groups);
                Ok(())
            }
        }
    }

    /// Drops every subscription.
    pub fn unsubscribe_all(&self) -> Result<(), ClientError> {
        let mut set = self.set();
        let previous = mem::take(&mut *set);

        self.subscribe.send(SubscribeEvent::UnsubscribeAll)?;
        match &self.presence {
            Some(presence) => presence.send(HeartbeatEvent::LeftAll {
                suppress_leave: self.suppress_leave,
            }),
            None => {
                drop(set);
                if !previous.is_empty() {
                    self.leave(
                        without_companions(&previous.channels),
                        without_companions(&previous.groups),
                    );
                }
                Ok(())
            }
        }
    }

    /// Stops the loop, keeping the subscription set and cursor.
    pub fn disconnect(&self) -> Result<(), ClientError> {
        self.subscribe.send(SubscribeEvent::Disconnect)?;
        if let Some(presence) = &self.presence {
            presence.send(HeartbeatEvent::Disconnect {
                suppress_leave: self.suppress_leave,
            })?;
        }
        Ok(())
    }

    /// Resumes after a disconnect or give-up, optionally from another cursor.
    pub fn reconnect(&self, cursor: Option<Cursor>) -> Result<(), ClientError> {
        self.subscribe.send(SubscribeEvent::Reconnect { cursor })?;
        if let Some(presence) = &self.presence {
            presence.send(HeartbeatEvent::Reconnect)?;
        }
        Ok(())
    }

    /// Subscribed channels, without presence companions.
    pub fn subscribed_channels(&self) -> BTreeSet<String> {
        without_companions(&self.set().channels)
    }

    /// Subscribed channel groups, without presence companions.
    pub fn subscribed_groups(&self) -> BTreeSet<String> {
        without_companions(&self.set().groups)
    }

    /// Current state of the subscribe engine.
    pub fn state(&self) -> SubscribeState {
        self.subscribe.snapshot().state
    }

    /// Latest snapshot of the subscribe engine.
    pub fn snapshot(&self) -> Snapshot<SubscribeState> {
        self.subscribe.snapshot()
    }

    /// Current state of the presence engine, `None` when heartbeats are disabled.
    pub fn presence_state(&self) -> Option<HeartbeatState> {
        self.presence.as_ref().map(|p| p.snapshot().state)
    }

    /// Waits until the subscribe engine reaches a state matching `pred`.
    pub async fn wait_for(
        &self,
        mut pred: impl FnMut(SubscribeState) -> bool,
    ) -> Result<SubscribeState, ClientError> {
        self.subscribe
            .wait_for(|snap| pred(snap.state))
            .await
            .map(|snap| snap.state)
    }

    /// Sends a leave outside of the presence engine.
    fn leave(&self, channels: BTreeSet<String>, groups: BTreeSet<String>) {
        if self.suppress_leave {
            return;
        }
        let transport = Arc::clone(&self.transport);
        let params = self.params.clone();
        let token = self.token.child_token();
        tokio::spawn(async move {
            announce_leave(transport.as_ref(), &params, &channels, &groups, token).await;
        });
    }

    /// Stops both engines and every running effect.
    pub async fn shutdown(self) {
        self.token.cancel();
        self.subscribe.shutdown().await;
        if let Some(presence) = self.presence {
            presence.shutdown().await;
        }
    }
}
