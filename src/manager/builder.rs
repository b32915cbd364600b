use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::engine::{EngineHandle, StateMachine};
use crate::error::ClientError;
use crate::listeners::{Listener, ListenerSet};
use crate::manager::SubscriptionManager;
use crate::presence::{HeartbeatContext, HeartbeatState, PresenceEffects};
use crate::subscribe::{SubscribeContext, SubscribeEffects, SubscribeState};
use crate::transport::Transport;

/// Builder for a [`SubscriptionManager`].
pub struct ManagerBuilder {
    config: Config,
    transport: Option<Arc<dyn Transport>>,
    listeners: Vec<Arc<dyn Listener>>,
}

impl ManagerBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            transport: None,
            listeners: Vec::new(),
        }
    }

    /// Sets the transport used by both engines.
    ///
    /// Without one, `build` falls back to [`HttpTransport`](crate::HttpTransport)
    /// (feature `http`).
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets the initial listeners.
    pub fn with_listeners(mut self, listeners: Vec<Arc<dyn Listener>>) -> Self {
        self.listeners = listeners;
        self
    }

    /// Validates the configuration and spawns the engines.
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> Result<SubscriptionManager, ClientError> {
        self.config.validate()?;
        let transport = match self.transport {
            Some(transport) => transport,
            None => default_transport(&self.config)?,
        };

        let listeners = Arc::new(ListenerSet::new());
        for listener in self.listeners {
            listeners.add(listener);
        }

        let token = CancellationToken::new();
        let policy = self.config.effective_policy();
        let params = self.config.service_params();

        let subscribe = EngineHandle::spawn(
            "subscribe",
            StateMachine::new(SubscribeState::Unsubscribed, SubscribeContext::new(policy)),
            Arc::new(SubscribeEffects::new(
                Arc::clone(&transport),
                Arc::clone(&listeners),
                params.clone(),
                policy,
            )),
            token.child_token(),
        );

        let presence = self.config.heartbeat_period().map(|interval| {
            EngineHandle::spawn(
                "presence",
                StateMachine::new(HeartbeatState::Inactive, HeartbeatContext::new(policy)),
                Arc::new(PresenceEffects::new(
                    Arc::clone(&transport),
                    params.clone(),
                    interval,
                    policy,
                )),
                token.child_token(),
            )
        });

        Ok(SubscriptionManager {
            params,
            suppress_leave: self.config.suppress_leave_events,
            transport,
            listeners,
            subscriptions: Default::default(),
            subscribe,
            presence,
            token,
        })
    }
}

#[cfg(feature = "http")]
fn default_transport(config: &Config) -> Result<Arc<dyn Transport>, ClientError> {
    Ok(Arc::new(crate::transport::HttpTransport::new(config)?))
}

#[cfg(not(feature = "http"))]
fn default_transport(_config: &Config) -> Result<Arc<dyn Transport>, ClientError> {
    Err(ClientError::InvalidConfig {
        reason: "no transport given and the `http` feature is disabled".into(),
    })
}
