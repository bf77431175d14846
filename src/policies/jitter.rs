//! # Jitter for retry delays.
//!
//! Several hosts going offline together would otherwise retry their failing
//! sources in lockstep. [`JitterPolicy`] spreads a computed delay over a range:
//!
//! | policy  | delay drawn from        |
//! |---------|-------------------------|
//! | `None`  | exactly `d`             |
//! | `Full`  | `[0, d]`                |
//! | `Equal` | `[d/2, d]`              |
//!
//! Polls keep `None` so their timing stays exact under a paused clock; the
//! fill retry defaults to `Equal`.

use std::time::Duration;

use rand::Rng;

/// How a computed delay is randomized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JitterPolicy {
    #[default]
    None,
    /// Anywhere between zero and the delay.
    Full,
    /// At least half the delay.
    Equal,
}

impl JitterPolicy {
    /// Randomizes `delay`. Never returns more than `delay`.
    pub fn apply(self, delay: Duration) -> Duration {
        let ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        let floor = match self {
            JitterPolicy::None => return delay,
            _ if ms == 0 => return delay,
            JitterPolicy::Full => 0,
            JitterPolicy::Equal => ms / 2,
        };
        Duration::from_millis(rand::rng().random_range(floor..=ms))
    }
}
