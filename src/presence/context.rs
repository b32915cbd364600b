//! Presence engine context: channels and groups being heartbeated plus the
//! failure bookkeeping of the reconnect loop.

use std::collections::BTreeSet;

use crate::error::EngineError;
use crate::policies::ReconnectionPolicy;

/// Data shared by all heartbeat states.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeartbeatContext {
    pub channels: BTreeSet<String>,
    pub groups: BTreeSet<String>,
    pub attempts: u32,
    pub reason: Option<EngineError>,
    pub policy: ReconnectionPolicy,
}

impl HeartbeatContext {
    pub fn new(policy: ReconnectionPolicy) -> Self {
        Self {
            channels: BTreeSet::new(),
            groups: BTreeSet::new(),
            attempts: 0,
            reason: None,
            policy,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty() && self.groups.is_empty()
    }

    pub(crate) fn joined(&self, channels: &BTreeSet<String>, groups: &BTreeSet<String>) -> Self {
        Self {
            channels: self.channels.union(channels).cloned().collect(),
            groups: self.groups.union(groups).cloned().collect(),
            attempts: 0,
            reason: None,
            policy: self.policy,
        }
    }

    pub(crate) fn left(&self, channels: &BTreeSet<String>, groups: &BTreeSet<String>) -> Self {
        Self {
            channels: self.channels.difference(channels).cloned().collect(),
            groups: self.groups.difference(groups).cloned().collect(),
            attempts: 0,
            reason: None,
            policy: self.policy,
        }
    }

    pub(crate) fn failed(&self, attempts: u32, reason: EngineError) -> Self {
        Self {
            attempts,
            reason: Some(reason),
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

    pub(crate) fn cleared(&self) -> Self {
        Self::new(self.policy)
    }
}
