//! # Reconnection delay calculators.
//!
//! Two pure calculators map a reconnect attempt number (1-based) to a delay:
//! - [`LinearDelay`] always waits the same interval;
//! - [`ExponentialDelay`] waits `2^attempt − 1` seconds, clamped to a cap.
//!
//! Each carries its own default retry budget (`max_retries`); the owning
//! [`ReconnectionPolicy`](crate::ReconnectionPolicy) may override it.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use pubsub_engine::{ExponentialDelay, LinearDelay};
//!
//! let linear = LinearDelay::default();
//! assert_eq!(linear.delay(7), Duration::from_secs(2));
//!
//! let exp = ExponentialDelay::default();
//! assert_eq!(exp.delay(1), Duration::from_secs(1));
//! assert_eq!(exp.delay(3), Duration::from_secs(7));
//! assert_eq!(exp.delay(10), Duration::from_secs(32));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Constant-interval reconnection delay.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinearDelay {
    /// Delay between two attempts.
    pub interval: Duration,
    /// Built-in retry budget (`None` = unlimited).
    pub max_retries: Option<u32>,
}

impl Default for LinearDelay {
    /// `interval = 2s`, unlimited retries.
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_retries: None,
        }
    }
}

impl LinearDelay {
    /// Returns the delay before reconnect attempt `attempt`.
    #[inline]
    pub fn delay(&self, _attempt: u32) -> Duration {
        self.interval
    }
}

/// Exponential reconnection delay: `min(2^attempt − 1, cap)` seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExponentialDelay {
    /// Upper bound of a single delay.
    pub cap: Duration,
    /// Built-in retry budget (`None` = unlimited).
    pub max_retries: Option<u32>,
    /// Restart the exponent every [`ExponentialDelay::LEGACY_PERIOD`] attempts
    /// (older clients used `2^(n − 5⌊(n−1)/5⌋) − 1`).
    pub legacy_period: bool,
    /// Randomization applied to the computed delay.
    pub jitter: JitterPolicy,
}

impl Default for ExponentialDelay {
    /// `cap = 32s`, six retries, no period reset, no jitter.
    fn default() -> Self {
        Self {
            cap: Duration::from_secs(32),
            max_retries: Some(6),
            legacy_period: false,
            jitter: JitterPolicy::None,
        }
    }
}

impl ExponentialDelay {
    /// Number of attempts after which the legacy formula starts over.
    pub const LEGACY_PERIOD: u32 = 5;

    /// Returns the delay before reconnect attempt `attempt` (`0` is treated as `1`).
    pub fn delay(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        let exponent = if self.legacy_period {
            attempt - Self::LEGACY_PERIOD * ((attempt - 1) / Self::LEGACY_PERIOD)
        } else {
            attempt
        };

        let base = match 1u64.checked_shl(exponent) {
            Some(pow) => Duration::from_secs(pow - 1).min(self.cap),
            None => self.cap,
        };
        self.jitter.apply(base)
    }
}
