//! # Subscription request.
//!
//! [`Subscription`] names the channels and groups of one subscribe or
//! unsubscribe call.
//!
//! # Example
//! ```
//! use pubsub_engine::{Cursor, Subscription};
//!
//! let sub = Subscription::new()
//!     .channels(["chat", "alerts"])
//!     .groups(["rooms"])
//!     .with_presence()
//!     .from_cursor(Cursor::new(17_000_000_000_000_000, 4));
//!
//! assert_eq!(sub.channel_names().len(), 2);
//! assert!(sub.presence());
//! ```

use std::collections::BTreeSet;

use crate::models::{Cursor, PRESENCE_SUFFIX};

/// Channels and groups to subscribe to (or unsubscribe from).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Subscription {
    channels: BTreeSet<String>,
    groups: BTreeSet<String>,
    with_presence: bool,
    cursor: Option<Cursor>,
}

impl Subscription {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds channels.
    pub fn channels<I, S>(mut self, channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.channels.extend(channels.into_iter().map(Into::into));
        self
    }

    /// Adds channel groups.
    pub fn groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups.extend(groups.into_iter().map(Into::into));
        self
    }

    /// Also receive presence events of these channels and groups.
    pub fn with_presence(mut self) -> Self {
        self.with_presence = true;
        self
    }

    /// Continue from `cursor` instead of handshaking (catch-up).
    pub fn from_cursor(mut self, cursor: Cursor) -> Self {
        self.cursor = Some(cursor);
        self
    }

    pub fn channel_names(&self) -> &BTreeSet<String> {
        &self.channels
    }

    pub fn group_names(&self) -> &BTreeSet<String> {
        &self.groups
    }

    pub fn presence(&self) -> bool {
        self.with_presence
    }

    pub fn cursor(&self) -> Option<Cursor> {
        self.cursor
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.channels.is_empty() && self.groups.is_empty()
    }

    /// Channels as sent to the subscribe call (with presence companions).
    pub(crate) fn wire_channels(&self) -> BTreeSet<String> {
        with_companions(&self.channels, self.with_presence)
    }

    /// Groups as sent to the subscribe call (with presence companions).
    pub(crate) fn wire_groups(&self) -> BTreeSet<String> {
        with_companions(&self.groups, self.with_presence)
    }
}

fn with_companions(names: &BTreeSet<String>, presence: bool) -> BTreeSet<String> {
    let mut out = names.clone();
    if presence {
        out.extend(
            names
                .iter()
                .filter(|n| !n.ends_with(PRESENCE_SUFFIX))
                .map(|n| format!("{n}{PRESENCE_SUFFIX}")),
        );
    }
    out
}

/// Drops presence companions from `names`.
pub(crate) fn without_companions(names: &BTreeSet<String>) -> BTreeSet<String> {
    names
        .iter()
        .filter(|n| !n.ends_with(PRESENCE_SUFFIX))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presence_adds_companions() {
        let sub = Subscription::new().channels(["a"]).groups(["g"]).with_presence();
        assert_eq!(
            sub.wire_channels(),
            ["a".to_string(), "a-pnpres".to_string()].into()
        );
        assert_eq!(
            sub.wire_groups(),
            ["g".to_string(), "g-pnpres".to_string()].into()
        );
        assert_eq!(without_companions(&sub.wire_channels()), ["a".to_string()].into());
    }

    #[test]
    fn plain_subscription_is_sent_as_is() {
        let sub = Subscription::new().channels(["a", "b", "a"]);
        assert_eq!(sub.wire_channels().len(), 2);
        assert!(sub.wire_groups().is_empty());
        assert!(!sub.is_empty());
        assert!(Subscription::new().is_empty());
    }
}
