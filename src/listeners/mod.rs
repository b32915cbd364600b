//! # Listeners: where decoded traffic and statuses end up.
//!
//! ```text
//! EmitMessages ─► ListenerSet::deliver(envelopes) ─► decode ─┬─► Listener::on_message
//!                                                           └─► Listener::on_presence
//! EmitStatus   ─► ListenerSet::status(&Status) ─────────────────► Listener::on_status
//! ```
//!
//! ## Implementing a listener
//! ```
//! use pubsub_engine::{Listener, Message, Status};
//!
//! struct Printer;
//!
//! impl Listener for Printer {
//!     fn on_message(&self, message: &Message) {
//!         println!("{}: {}", message.channel, message.payload);
//!     }
//!
//!     fn on_status(&self, status: &Status) {
//!         println!("status: {}", status.category);
//!     }
//! }
//! ```

mod listener;
#[cfg(feature = "logging")]
mod log;
mod set;

pub use listener::Listener;
#[cfg(feature = "logging")]
pub use log::LogListener;
pub use set::ListenerSet;
