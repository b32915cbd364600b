//! # Subscribe engine context.
//!
//! [`SubscribeContext`] is the data shared by every subscribe state. It is
//! owned by the state machine and never mutated in place: each transition
//! derives a new value with one of the helpers below, copying every field it
//! does not mean to change.
//!
//! | helper            | channels/groups | cursor            | attempts | reason | reported |
//! |-------------------|-----------------|-------------------|----------|--------|----------|
//! | `subscribed`      | replaced        | `{0,0}`           | 0        | none   | no       |
//! | `restored`        | replaced        | given             | 0        | none   | no       |
//! | `advanced`        | kept            | given (monotonic) | 0        | none   | kept     |
//! | `failed`          | kept            | kept              | given    | given  | no       |
//! | `reset_attempts`  | kept            | kept              | 0        | none   | kept     |
//! | `stopped`         | kept            | kept              | 0        | none   | no       |
//! | `cleared`         | emptied         | `{0,0}`           | 0        | none   | no       |
//!
//! `connection_reported` remembers that `Connected` went out for the current
//! connection; anything that interrupts the connection clears it, so the next
//! success reports `Connected` again.

use std::collections::BTreeSet;

use tracing::warn;

use crate::error::EngineError;
use crate::models::{Cursor, Status};
use crate::policies::ReconnectionPolicy;

/// Data shared by all subscribe states.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscribeContext {
    pub channels: BTreeSet<String>,
    pub groups: BTreeSet<String>,
    pub cursor: Cursor,
    /// Consecutive failed attempts of the current connection phase.
    pub attempts: u32,
    /// Last failure cause.
    pub reason: Option<EngineError>,
    /// `Connected` was already emitted since the last gap.
    pub connection_reported: bool,
    /// Retry budget consulted on every failure (fixed for the machine's lifetime).
    pub policy: ReconnectionPolicy,
}

impl SubscribeContext {
    /// Empty context: no subscriptions, `{0,0}` cursor, `attempts = 0`.
    pub fn new(policy: ReconnectionPolicy) -> Self {
        Self {
            channels: BTreeSet::new(),
            groups: BTreeSet::new(),
            cursor: Cursor::default(),
            attempts: 0,
            reason: None,
            connection_reported: false,
            policy,
        }
    }

    /// `true` if there is at least one channel or group.
    pub fn has_subscriptions(&self) -> bool {
        !self.channels.is_empty() || !self.groups.is_empty()
    }

    pub(crate) fn subscribed(&self, channels: BTreeSet<String>, groups: BTreeSet<String>) -> Self {
        Self {
            channels,
            groups,
            cursor: Cursor::default(),
            attempts: 0,
            reason: None,
            connection_reported: false,
            policy: self.policy,
        }
    }

    pub(crate) fn restored(
        &self,
        channels: BTreeSet<String>,
        groups: BTreeSet<String>,
        cursor: Cursor,
    ) -> Self {
        Self {
            cursor,
            ..self.subscribed(channels, groups)
        }
    }

    /// Moves the cursor forward; a response older than the current cursor
    /// for the same subscription set keeps the current one.
    pub(crate) fn advanced(&self, cursor: Cursor) -> Self {
        let cursor = if cursor.timetoken < self.cursor.timetoken {
            warn!(
                current = %self.cursor,
                received = %cursor,
                "received cursor older than current one, keeping current"
            );
            self.cursor
        } else {
            cursor
        };
        Self {
            cursor,
            ..self.reset_attempts()
        }
    }

    pub(crate) fn failed(&self, attempts: u32, reason: EngineError) -> Self {
        Self {
            attempts,
            reason: Some(reason),
            connection_reported: false,
            ..self.clone()
        }
    }

    pub(crate) fn reset_attempts(&self) -> Self {
        Self {
            attempts: 0,
            reason: None,
            ..self.clone()
        }
    }

    pub(crate) fn stopped(&self) -> Self {
        Self {
            connection_reported: false,
            ..self.reset_attempts()
        }
    }

    /// Marks `Connected` as emitted for the current connection.
    pub(crate) fn reported(self) -> Self {
        Self {
            connection_reported: true,
            ..self
        }
    }

    pub(crate) fn cleared(&self) -> Self {
        Self::new(self.policy)
    }

    pub(crate) fn connected_status(&self) -> Status {
        Status::connected(self.channels.clone(), self.groups.clone())
    }

    pub(crate) fn disconnected_status(&self, error: Option<EngineError>) -> Status {
        Status::disconnected(self.channels.clone(), self.groups.clone(), error)
    }
}
