//! # Transport seam.
//!
//! Engines never talk to the network directly. Every effect builds a
//! [`Request`] with the helpers in [`endpoints`] and hands it to a
//! [`Transport`] together with its cancellation token.
//!
//! ```text
//! effect ──► endpoints::subscribe_request(..) ──► Transport::issue(req, token) ──► serde_json::Value
//!                                                                     │
//!            endpoints::decode_subscribe(value) ◄─────────────────────┘
//! ```
//!
//! The crate ships [`HttpTransport`] (feature `http`); tests plug in an
//! in-memory implementation.

pub mod endpoints;
#[cfg(feature = "http")]
mod http;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::TransportError;

pub use endpoints::{ServiceParams, SubscribeResponse};
#[cfg(feature = "http")]
pub use http::HttpTransport;

/// HTTP method of a [`Request`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Which service call a [`Request`] performs (transports pick timeouts from it).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Long-poll subscribe (handshake or receive).
    Subscribe,
    /// Presence leave announcement.
    Leave,
    /// Presence heartbeat.
    Heartbeat,
}

/// Transport-neutral description of one service call.
#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    pub operation: Operation,
    pub method: Method,
    /// Unencoded path segments, joined with `/` by the transport.
    pub path: Vec<String>,
    /// Unencoded query pairs, in insertion order.
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl Request {
    pub(crate) fn get(operation: Operation, path: Vec<String>) -> Self {
        Self {
            operation,
            method: Method::Get,
            path,
            query: Vec::new(),
            body: None,
        }
    }

    pub(crate) fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    pub(crate) fn query_opt(self, key: &str, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// Path as `/a/b/c`.
    pub fn path_string(&self) -> String {
        let mut out = String::new();
        for segment in &self.path {
            out.push('/');
            out.push_str(segment);
        }
        out
    }

    /// First value of query parameter `key`.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Performs service calls for the engines.
///
/// Implementations must honour `token`: once it is cancelled the call should
/// return [`TransportError::Cancelled`] as soon as possible.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn issue(&self, request: Request, token: CancellationToken)
    -> Result<Value, TransportError>;
}
