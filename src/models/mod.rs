//! Data exchanged between the engines, the transport and the listeners.
//!
//! - [`Cursor`] `{timetoken, region}` read position
//! - [`Envelope`] raw subscribe entry; decodes into [`Message`] / [`PresenceEvent`]
//! - [`Status`] connection status for listeners

mod cursor;
mod message;
mod status;

pub use cursor::Cursor;
pub use message::{
    Decoded, Envelope, Message, MessageKind, PRESENCE_SUFFIX, PresenceAction, PresenceEvent,
};
pub use status::{Status, StatusCategory};
