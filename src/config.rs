//! # Client configuration.
//!
//! [`Config`] holds the identity of the client and the knobs of both engines.
//!
//! Config is used in three places:
//! 1. **Manager creation**: `SubscriptionManager::new(config, transport)` validates it;
//! 2. **Engine contexts**: [`Config::effective_policy`] is the retry budget of both engines;
//! 3. **Service calls**: [`Config::service_params`] is attached to every request.
//!
//! ## Sentinel values
//! - `heartbeat_interval = 0s` → presence heartbeat engine disabled
//! - `presence_timeout = 0s` → no `heartbeat` parameter announced
//! - `maximum_reconnection_retries = None` → policy's built-in budget
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use pubsub_engine::{Config, ReconnectionPolicy};
//!
//! let mut cfg = Config::new("sub-c-demo");
//! cfg.reconnection_policy = ReconnectionPolicy::linear();
//! cfg.maximum_reconnection_retries = Some(3);
//! cfg.heartbeat_interval = Duration::from_secs(60);
//!
//! assert!(cfg.validate().is_ok());
//! assert_eq!(cfg.effective_policy().max_retries(), Some(3));
//! assert_eq!(cfg.heartbeat_period(), Some(Duration::from_secs(60)));
//! ```

use std::time::Duration;

use serde_json::Value;

use crate::error::ClientError;
use crate::policies::ReconnectionPolicy;
use crate::transport::ServiceParams;

/// Default service origin.
pub const DEFAULT_ORIGIN: &str = "ps.pndsn.com";

/// Smallest presence timeout the service accepts.
pub const MIN_PRESENCE_TIMEOUT: Duration = Duration::from_secs(20);

/// Client configuration.
///
/// ## Field semantics
/// - `subscribe_key`: service key every call is scoped to (required)
/// - `user_id`: identity of this client (random UUID by default)
/// - `origin` / `secure`: host and scheme of [`HttpTransport`](crate::HttpTransport)
/// - `reconnection_policy` + `maximum_reconnection_retries`: retry budget
/// - `presence_timeout` / `heartbeat_interval`: presence knobs (`0s` = off)
///
/// All fields are public. Prefer the helper accessors over checking sentinels.
#[derive(Clone, Debug)]
pub struct Config {
    pub subscribe_key: String,

    /// Identity announced as `uuid` on every call.
    pub user_id: String,

    /// Service host, without scheme.
    pub origin: String,

    /// `https` when `true`, `http` otherwise.
    pub secure: bool,

    /// Server-side filter applied to the message stream.
    pub filter_expression: Option<String>,

    /// How long the service keeps this client present without a heartbeat.
    ///
    /// - `Duration::ZERO` = service default, parameter omitted
    /// - otherwise at least [`MIN_PRESENCE_TIMEOUT`]
    pub presence_timeout: Duration,

    /// Period of explicit presence heartbeats.
    ///
    /// - `Duration::ZERO` = presence heartbeat engine disabled; leaves are sent
    ///   directly on unsubscribe
    /// - `> 0` = heartbeat every interval while subscribed
    pub heartbeat_interval: Duration,

    /// Presence state per channel, announced with subscribe and heartbeat calls.
    pub presence_state: Option<Value>,

    /// Do not announce leaves on unsubscribe / disconnect.
    pub suppress_leave_events: bool,

    /// Delay strategy between reconnect attempts.
    pub reconnection_policy: ReconnectionPolicy,

    /// Overrides the policy's built-in retry budget when set.
    pub maximum_reconnection_retries: Option<u32>,

    /// Client-side deadline of one subscribe long-poll.
    pub subscribe_request_timeout: Duration,

    /// Client-side deadline of every other call.
    pub non_subscribe_request_timeout: Duration,
}

impl Config {
    /// Default configuration for `subscribe_key`.
    pub fn new(subscribe_key: impl Into<String>) -> Self {
        Self {
            subscribe_key: subscribe_key.into(),
            ..Self::default()
        }
    }

    /// Reconnection policy with `maximum_reconnection_retries` applied.
    #[inline]
    pub fn effective_policy(&self) -> ReconnectionPolicy {
        self.reconnection_policy
            .with_max_retries(self.maximum_reconnection_retries)
    }

    /// Heartbeat period as an `Option`.
    ///
    /// - `None` → presence heartbeat engine disabled
    /// - `Some(d)` → heartbeat every `d`
    #[inline]
    pub fn heartbeat_period(&self) -> Option<Duration> {
        if self.heartbeat_interval == Duration::ZERO {
            None
        } else {
            Some(self.heartbeat_interval)
        }
    }

    /// Presence timeout in whole seconds, `None` when not announced.
    #[inline]
    pub fn presence_timeout_secs(&self) -> Option<u64> {
        if self.presence_timeout == Duration::ZERO {
            None
        } else {
            Some(self.presence_timeout.as_secs())
        }
    }

    /// `scheme://origin`.
    pub fn base_url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{scheme}://{}", self.origin)
    }

    /// Values attached to every service call.
    pub fn service_params(&self) -> ServiceParams {
        ServiceParams {
            subscribe_key: self.subscribe_key.clone(),
            user_id: self.user_id.clone(),
            filter_expression: self.filter_expression.clone(),
            presence_timeout: self.presence_timeout_secs(),
            state: self.presence_state.clone(),
        }
    }

    /// Checks the values the client cannot run without.
    pub fn validate(&self) -> Result<(), ClientError> {
        let invalid = |reason: &str| {
            Err(ClientError::InvalidConfig {
                reason: reason.to_string(),
            })
        };

        if self.subscribe_key.trim().is_empty() {
            return invalid("subscribe_key is empty");
        }
        if self.user_id.trim().is_empty() {
            return invalid("user_id is empty");
        }
        if self.origin.trim().is_empty() {
            return invalid("origin is empty");
        }
        if self.presence_timeout != Duration::ZERO && self.presence_timeout < MIN_PRESENCE_TIMEOUT {
            return invalid("presence_timeout is below 20s");
        }
        if let Some(period) = self.heartbeat_period() {
            if self.presence_timeout != Duration::ZERO && period >= self.presence_timeout {
                return invalid("heartbeat_interval must be shorter than presence_timeout");
            }
        }
        if self.subscribe_request_timeout == Duration::ZERO
            || self.non_subscribe_request_timeout == Duration::ZERO
        {
            return invalid("request timeouts must be positive");
        }
        Ok(())
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - empty `subscribe_key` (must be set), random `user_id`
    /// - `origin = ps.pndsn.com`, `secure = true`
    /// - `presence_timeout = 300s`, `heartbeat_interval = 0s` (disabled)
    /// - exponential reconnection with its built-in budget
    /// - `subscribe_request_timeout = 310s`, `non_subscribe_request_timeout = 10s`
    fn default() -> Self {
        Self {
            subscribe_key: String::new(),
            user_id: uuid::Uuid::new_v4().to_string(),
            origin: DEFAULT_ORIGIN.to_string(),
            secure: true,
            filter_expression: None,
            presence_timeout: Duration::from_secs(300),
            heartbeat_interval: Duration::ZERO,
            presence_state: None,
            suppress_leave_events: false,
            reconnection_policy: ReconnectionPolicy::default(),
            maximum_reconnection_retries: None,
            subscribe_request_timeout: Duration::from_secs(310),
            non_subscribe_request_timeout: Duration::from_secs(10),
        }
    }
}
