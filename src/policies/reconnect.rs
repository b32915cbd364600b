//! # Reconnection policy used by both engines.
//!
//! [`ReconnectionPolicy`] answers two questions for a reconnect attempt:
//! - how long to wait before it ([`ReconnectionPolicy::delay`]);
//! - whether the budget is exhausted ([`ReconnectionPolicy::should_give_up`]).
//!
//! Give-up is decided by the owning *state* when a failure is processed
//! (`attempt > max_retries`), never by the reconnect effect itself.
//!
//! ```text
//! None         → give up on the first failure
//! Linear       → LinearDelay::delay(n),      budget LinearDelay::max_retries
//! Exponential  → ExponentialDelay::delay(n), budget ExponentialDelay::max_retries
//! with_max_retries(Some(n)) overrides the built-in budget
//! ```

use std::time::Duration;

use crate::policies::backoff::{ExponentialDelay, LinearDelay};

/// Strategy for reconnect delays and retry budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconnectionPolicy {
    /// Never reconnect; the first failure is a give-up.
    None,
    /// Constant delay between attempts.
    Linear(LinearDelay),
    /// Exponentially growing delay between attempts.
    Exponential(ExponentialDelay),
}

impl Default for ReconnectionPolicy {
    /// Returns [`ReconnectionPolicy::Exponential`] with default parameters.
    fn default() -> Self {
        ReconnectionPolicy::Exponential(ExponentialDelay::default())
    }
}

impl ReconnectionPolicy {
    /// Linear policy with the default 2s interval.
    pub fn linear() -> Self {
        ReconnectionPolicy::Linear(LinearDelay::default())
    }

    /// Exponential policy with default parameters.
    pub fn exponential() -> Self {
        ReconnectionPolicy::Exponential(ExponentialDelay::default())
    }

    /// Returns a copy whose retry budget is replaced by `max_retries`.
    ///
    /// `None` keeps the built-in budget. Has no effect on [`ReconnectionPolicy::None`].
    pub fn with_max_retries(self, max_retries: Option<u32>) -> Self {
        let Some(max) = max_retries else {
            return self;
        };
        match self {
            ReconnectionPolicy::None => ReconnectionPolicy::None,
            ReconnectionPolicy::Linear(l) => ReconnectionPolicy::Linear(LinearDelay {
                max_retries: Some(max),
                ..l
            }),
            ReconnectionPolicy::Exponential(e) => {
                ReconnectionPolicy::Exponential(ExponentialDelay {
                    max_retries: Some(max),
                    ..e
                })
            }
        }
    }

    /// Returns the retry budget (`None` = unlimited).
    pub fn max_retries(&self) -> Option<u32> {
        match self {
            ReconnectionPolicy::None => Some(0),
            ReconnectionPolicy::Linear(l) => l.max_retries,
            ReconnectionPolicy::Exponential(e) => e.max_retries,
        }
    }

    /// Returns the delay before reconnect attempt `attempt`.
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            ReconnectionPolicy::None => Duration::ZERO,
            ReconnectionPolicy::Linear(l) => l.delay(attempt),
            ReconnectionPolicy::Exponential(e) => e.delay(attempt),
        }
    }

    /// `true` when `attempt` exceeds the retry budget.
    #[inline]
    pub fn should_give_up(&self, attempt: u32) -> bool {
        self.max_retries().is_some_and(|max| attempt > max)
    }
}
