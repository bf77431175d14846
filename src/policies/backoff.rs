//! # Delay schedules.
//!
//! [`BackoffPolicy`] maps a retry number to a delay:
//!
//! ```text
//! delay(n) = jitter( min(first × factor^n, max) )
//! ```
//!
//! Two shapes are used by the runtime:
//! - constant (`factor = 1`, no jitter): the Ad-step pool poll and the network
//!   wait, 500ms apart;
//! - growing (`factor = 2`, equal jitter): the pause between fill cycles in
//!   which every source failed, 1s doubling up to 60s.
//!
//! The base depends only on `n`, so jitter never compounds.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use adflow::{BackoffPolicy, JitterPolicy};
//!
//! let retry = BackoffPolicy {
//!     jitter: JitterPolicy::None,
//!     ..BackoffPolicy::fill_retry()
//! };
//! assert_eq!(retry.next(0), Duration::from_secs(1));
//! assert_eq!(retry.next(3), Duration::from_secs(8));
//! assert_eq!(retry.next(20), Duration::from_secs(60));
//!
//! let poll = BackoffPolicy::constant(Duration::from_millis(500));
//! assert_eq!(poll.next(7), Duration::from_millis(500));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Delay schedule indexed by retry number.
#[derive(Clone, Copy, Debug)]
pub struct BackoffPolicy {
    /// Delay for retry `0`.
    pub first: Duration,
    /// Cap applied before jitter.
    pub max: Duration,
    /// Growth per retry; `1.0` keeps the delay constant.
    pub factor: f64,
    pub jitter: JitterPolicy,
}

impl BackoffPolicy {
    /// Same `interval` for every retry, no jitter.
    pub fn constant(interval: Duration) -> Self {
        Self {
            first: interval,
            max: interval,
            factor: 1.0,
            jitter: JitterPolicy::None,
        }
    }

    /// Pause between failed fill cycles: 1s doubling to 60s, equal jitter.
    pub fn fill_retry() -> Self {
        Self {
            first: Duration::from_secs(1),
            max: Duration::from_secs(60),
            factor: 2.0,
            jitter: JitterPolicy::Equal,
        }
    }

    /// Delay before retry `n` (0-indexed).
    pub fn next(&self, n: u32) -> Duration {
        self.jitter.apply(self.base(n))
    }

    /// Delay before retry `n` without jitter; an upper bound of [`next`](Self::next).
    pub(crate) fn base(&self, n: u32) -> Duration {
        let exp = i32::try_from(n).unwrap_or(i32::MAX);
        let secs = self.first.as_secs_f64() * self.factor.powi(exp);
        if secs.is_finite() && (0.0..=self.max.as_secs_f64()).contains(&secs) {
            Duration::from_secs_f64(secs)
        } else {
            self.max
        }
    }
}

impl Default for BackoffPolicy {
    /// Constant 500ms.
    fn default() -> Self {
        Self::constant(Duration::from_millis(500))
    }
}
