//! Reconnection policies.
//!
//! This module groups the knobs that control **how long** the engines wait
//! between reconnect attempts and **when** they stop trying.
//!
//! ## Contents
//! - [`ReconnectionPolicy`] none / linear / exponential + retry budget
//! - [`LinearDelay`], [`ExponentialDelay`] the delay calculators
//! - [`JitterPolicy`] randomization to avoid synchronized reconnects
//!
//! ## Quick wiring
//! ```text
//! Config { reconnection_policy, maximum_reconnection_retries }
//!      └─► Config::effective_policy()
//!           ├─► subscribe / presence states: should_give_up(attempts)
//!           └─► reconnect effects: sleep(delay(attempt))
//! ```

mod backoff;
mod jitter;
mod reconnect;

pub use backoff::{ExponentialDelay, LinearDelay};
pub use jitter::JitterPolicy;
pub use reconnect::ReconnectionPolicy;
