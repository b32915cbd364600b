//! Error types used by the engines, the transport seam and the client surface.
//!
//! This module defines three error enums:
//!
//! - [`TransportError`]: failures reported by a [`Transport`](crate::Transport) call.
//! - [`EngineError`]: the failure cause the engines keep in their context
//!   (`reason`) and attach to reconnect / give-up events.
//! - [`ClientError`]: errors returned by the public
//!   [`SubscriptionManager`](crate::SubscriptionManager) API.
//!
//! All types provide `as_label` (stable snake_case for logs) and
//! [`TransportError::is_retryable`] style helpers.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by a transport call.
///
/// Transports must distinguish a timeout from a hard failure and from a payload
/// that could not be decoded. Cancellation is reported separately so effects can
/// drop the result silently.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request did not complete within its deadline.
    #[error("request timed out after {timeout:?}")]
    Timeout {
        /// The deadline that was exceeded.
        timeout: Duration,
    },

    /// The service answered with a non-success status code.
    #[error("service returned status {code}: {message}")]
    Status {
        /// HTTP status code.
        code: u16,
        /// Body or reason phrase.
        message: String,
    },

    /// Connection-level failure (DNS, TLS, reset, ...).
    #[error("network failure: {message}")]
    Network {
        /// The underlying error message.
        message: String,
    },

    /// The response could not be decoded into the expected shape.
    #[error("malformed response: {message}")]
    Malformed {
        /// What was wrong with the payload.
        message: String,
    },

    /// The request was cancelled through its token before it completed.
    #[error("request cancelled")]
    Cancelled,
}

impl TransportError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use pubsub_engine::TransportError;
    ///
    /// let err = TransportError::Malformed { message: "missing `t`".into() };
    /// assert_eq!(err.as_label(), "transport_malformed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TransportError::Timeout { .. } => "transport_timeout",
            TransportError::Status { .. } => "transport_status",
            TransportError::Network { .. } => "transport_network",
            TransportError::Malformed { .. } => "transport_malformed",
            TransportError::Cancelled => "transport_cancelled",
        }
    }

    /// Shorthand for a [`TransportError::Malformed`] error.
    pub fn malformed(message: impl Into<String>) -> Self {
        TransportError::Malformed {
            message: message.into(),
        }
    }

    /// Indicates whether the engine should keep retrying after this error.
    ///
    /// Malformed and empty responses are treated like transient failures.
    /// Client errors (`4xx` other than `408` and `429`) are not retryable:
    /// repeating the same request gives the same answer.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Cancelled => false,
            TransportError::Status { code, .. } => {
                !(400..500).contains(code) || matches!(code, 408 | 429)
            }
            TransportError::Timeout { .. }
            | TransportError::Network { .. }
            | TransportError::Malformed { .. } => true,
        }
    }
}

/// # Failure cause kept by the engines.
///
/// Stored as the context `reason` and carried by failure / give-up events.
/// Cheap to clone so it can travel inside events and statuses.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A transport call failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The reconnection budget was exhausted.
    #[error("gave up after {attempts} reconnection attempts")]
    GaveUp {
        /// Attempt counter at the moment of give-up.
        attempts: u32,
    },

    /// An effect panicked instead of reporting an outcome.
    #[error("effect `{effect}` panicked: {message}")]
    EffectPanicked {
        /// Name of the invocation that was running.
        effect: &'static str,
        /// Panic payload, when it was a string.
        message: String,
    },
}

impl EngineError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            EngineError::Transport(e) => e.as_label(),
            EngineError::GaveUp { .. } => "engine_gave_up",
            EngineError::EffectPanicked { .. } => "engine_effect_panicked",
        }
    }
}

/// # Errors returned by the public client surface.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ClientError {
    /// The configuration cannot be used to build a client.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// What is wrong with it.
        reason: String,
    },

    /// A subscribe / unsubscribe call named no channel and no group.
    #[error("no channels or channel groups given")]
    EmptySubscription,

    /// The engine actor is gone (the manager was shut down).
    #[error("engine `{engine}` is closed")]
    EngineClosed {
        /// Engine name (`subscribe` / `presence`).
        engine: &'static str,
    },
}

impl ClientError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use pubsub_engine::ClientError;
    ///
    /// let err = ClientError::EngineClosed { engine: "subscribe" };
    /// assert_eq!(err.as_label(), "client_engine_closed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ClientError::InvalidConfig { .. } => "client_invalid_config",
            ClientError::EmptySubscription => "client_empty_subscription",
            ClientError::EngineClosed { .. } => "client_engine_closed",
        }
    }
}
