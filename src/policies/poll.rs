//! # Bounded polling.
//!
//! [`PollPolicy`] pairs a [`BackoffPolicy`] with a maximum number of checks.
//! It drives the network wait before launch, the pool poll of an Ad step and
//! the pauses between fill cycles in which every source failed.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use adflow::PollPolicy;
//!
//! let poll = PollPolicy::constant(Duration::from_millis(500), 120);
//! assert_eq!(poll.delay(0), Duration::from_millis(500));
//! assert!(!poll.exhausted(119));
//! assert!(poll.exhausted(120));
//! assert_eq!(poll.budget(), Duration::from_secs(60));
//! ```

use std::time::Duration;

use crate::policies::backoff::BackoffPolicy;

/// Delay schedule plus a check budget.
#[derive(Clone, Copy, Debug)]
pub struct PollPolicy {
    /// Delay between checks.
    pub backoff: BackoffPolicy,
    /// Maximum number of delayed checks (`0` = give up after the first miss).
    pub max_checks: u32,
}

impl PollPolicy {
    /// Constant `interval` between checks, at most `max_checks` times.
    pub fn constant(interval: Duration, max_checks: u32) -> Self {
        Self {
            backoff: BackoffPolicy::constant(interval),
            max_checks,
        }
    }

    /// Growing, jittered pauses between failed fill cycles; 8 of them
    /// (about 3 minutes at most) before filling stalls.
    pub fn fill_retry() -> Self {
        Self {
            backoff: BackoffPolicy::fill_retry(),
            max_checks: 8,
        }
    }

    /// Delay before delayed check number `check` (0-indexed).
    #[inline]
    pub fn delay(&self, check: u32) -> Duration {
        self.backoff.next(check)
    }

    /// True once `checks` delayed checks have been spent.
    #[inline]
    pub fn exhausted(&self, checks: u32) -> bool {
        checks >= self.max_checks
    }

    /// Upper bound of the total wait.
    pub fn budget(&self) -> Duration {
        (0..self.max_checks).map(|n| self.backoff.base(n)).sum()
    }
}

impl Default for PollPolicy {
    /// 500ms × 120 checks.
    fn default() -> Self {
        Self::constant(Duration::from_millis(500), 120)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_budget_is_one_minute() {
        let p = PollPolicy::default();
        assert_eq!(p.max_checks, 120);
        assert_eq!(p.budget(), Duration::from_secs(60));
    }

    #[test]
    fn fill_retry_budget_is_bounded() {
        let p = PollPolicy::fill_retry();
        // 1 + 2 + 4 + 8 + 16 + 32 + 60 + 60
        assert_eq!(p.budget(), Duration::from_secs(183));
        assert!(p.exhausted(8));
    }

    #[test]
    fn zero_checks_is_exhausted_immediately() {
        let p = PollPolicy::constant(Duration::from_millis(10), 0);
        assert!(p.exhausted(0));
        assert_eq!(p.budget(), Duration::ZERO);
    }
}
