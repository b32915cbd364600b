//! # Subscribe envelopes and their decoded forms.
//!
//! The long-poll response carries a list of raw [`Envelope`]s. The engines move
//! envelopes around untouched; only the `EmitMessages` effect decodes them into
//! a [`Message`] (regular traffic, signals, ...) or a [`PresenceEvent`] (traffic
//! on the `<channel>-pnpres` companion channel).
//!
//! ```text
//! Envelope{c: "chat",        e: None | 0..4} ──► Decoded::Message(Message)
//! Envelope{c: "chat-pnpres", d: {action,..}} ──► Decoded::Presence(PresenceEvent)
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::cursor::Cursor;

/// Suffix of presence companion channels.
pub const PRESENCE_SUFFIX: &str = "-pnpres";

/// One raw entry of the subscribe response `m` array.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Channel the payload was published to.
    #[serde(rename = "c")]
    pub channel: String,
    /// Subscription that matched (channel group or wildcard), if any.
    #[serde(rename = "b", default, skip_serializing_if = "Option::is_none")]
    pub subscription: Option<String>,
    /// Published payload.
    #[serde(rename = "d", default)]
    pub payload: Value,
    /// Publish cursor of this entry.
    #[serde(rename = "p", default, skip_serializing_if = "Option::is_none")]
    pub publish: Option<Cursor>,
    /// Publisher id.
    #[serde(rename = "i", default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    /// User metadata attached at publish time.
    #[serde(rename = "u", default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
    /// Wire message type (`0`/absent = message, `1` signal, `2` object, `3` action, `4` file).
    #[serde(rename = "e", default, skip_serializing_if = "Option::is_none")]
    pub message_type: Option<u8>,
    /// Service flags.
    #[serde(rename = "f", default)]
    pub flags: u32,
}

impl Envelope {
    /// Creates a plain message envelope (handy for tests and transports).
    pub fn new(channel: impl Into<String>, payload: Value) -> Self {
        Self {
            channel: channel.into(),
            subscription: None,
            payload,
            publish: None,
            publisher: None,
            meta: None,
            message_type: None,
            flags: 0,
        }
    }

    /// `true` when this envelope travelled on a presence companion channel.
    pub fn is_presence(&self) -> bool {
        self.channel.ends_with(PRESENCE_SUFFIX)
    }

    /// Decodes the envelope for listener delivery.
    pub fn decode(&self) -> Result<Decoded, serde_json::Error> {
        if self.is_presence() {
            let payload: PresencePayload = serde_json::from_value(self.payload.clone())?;
            let channel = self
                .channel
                .strip_suffix(PRESENCE_SUFFIX)
                .unwrap_or(&self.channel)
                .to_string();
            return Ok(Decoded::Presence(PresenceEvent {
                channel,
                subscription: self.subscription.clone(),
                action: payload.action,
                uuid: payload.uuid,
                occupancy: payload.occupancy,
                timestamp: payload.timestamp,
                state: payload.data,
                join: payload.join,
                leave: payload.leave,
                timeout: payload.timeout,
                timetoken: self.publish.map(|p| p.timetoken),
            }));
        }

        Ok(Decoded::Message(Message {
            channel: self.channel.clone(),
            subscription: self.subscription.clone(),
            kind: MessageKind::from_wire(self.message_type),
            payload: self.payload.clone(),
            publisher: self.publisher.clone(),
            meta: self.meta.clone(),
            timetoken: self.publish.map(|p| p.timetoken),
        }))
    }
}

/// Result of [`Envelope::decode`].
#[derive(Clone, Debug, PartialEq)]
pub enum Decoded {
    /// Regular traffic (messages, signals, objects, actions, files).
    Message(Message),
    /// Presence traffic.
    Presence(PresenceEvent),
}

/// Classification of regular traffic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageKind {
    Message,
    Signal,
    Object,
    MessageAction,
    File,
}

impl MessageKind {
    fn from_wire(e: Option<u8>) -> Self {
        match e {
            Some(1) => MessageKind::Signal,
            Some(2) => MessageKind::Object,
            Some(3) => MessageKind::MessageAction,
            Some(4) => MessageKind::File,
            _ => MessageKind::Message,
        }
    }
}

/// A decoded message handed to [`Listener::on_message`](crate::Listener::on_message).
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    pub channel: String,
    pub subscription: Option<String>,
    pub kind: MessageKind,
    pub payload: Value,
    pub publisher: Option<String>,
    pub meta: Option<Value>,
    pub timetoken: Option<u64>,
}

/// Presence action reported on a `-pnpres` channel.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PresenceAction {
    Join,
    Leave,
    Timeout,
    StateChange,
    Interval,
}

/// A decoded presence event handed to [`Listener::on_presence`](crate::Listener::on_presence).
#[derive(Clone, Debug, PartialEq)]
pub struct PresenceEvent {
    /// Channel the presence change happened on (without the `-pnpres` suffix).
    pub channel: String,
    pub subscription: Option<String>,
    pub action: PresenceAction,
    pub uuid: Option<String>,
    pub occupancy: Option<u64>,
    pub timestamp: Option<u64>,
    pub state: Option<Value>,
    /// `interval` events list the ids that joined / left / timed out since the last one.
    pub join: Vec<String>,
    pub leave: Vec<String>,
    pub timeout: Vec<String>,
    pub timetoken: Option<u64>,
}

#[derive(Deserialize)]
struct PresencePayload {
    action: PresenceAction,
    #[serde(default)]
    uuid: Option<String>,
    #[serde(default)]
    occupancy: Option<u64>,
    #[serde(default)]
    timestamp: Option<u64>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    join: Vec<String>,
    #[serde(default)]
    leave: Vec<String>,
    #[serde(default)]
    timeout: Vec<String>,
}
