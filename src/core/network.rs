//! # Network gate.
//!
//! Before a launch continues, the runtime can wait for the host's network to
//! become usable. The wait is bounded: at most `max_checks` probes (at least
//! one), the first immediately and each later one after the next delay of the
//! [`PollPolicy`]. When the budget runs out the launch proceeds on the
//! degraded path.
//!
//! The default budget is 120 probes 500ms apart.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time;

use crate::events::{Bus, Event, EventKind};
use crate::policies::PollPolicy;

/// Host-provided connectivity check.
#[async_trait]
pub trait NetworkProbe: Send + Sync + 'static {
    /// Returns `true` when the network is usable.
    async fn check(&self) -> bool;
}

/// Outcome of the bounded network wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStatus {
    /// No probe configured; the wait was skipped.
    Skipped,
    /// A probe succeeded after `checks` probes.
    Available { checks: u32 },
    /// Every probe failed.
    TimedOut { checks: u32 },
}

/// Probes until available or until `policy` is exhausted.
///
/// A probe that exceeds `probe_timeout` counts as unavailable.
pub(crate) async fn wait_for_network(
    probe: &dyn NetworkProbe,
    policy: &PollPolicy,
    probe_timeout: Option<Duration>,
    bus: &Bus,
) -> NetworkStatus {
    let budget = policy.max_checks.max(1);
    let mut checks = 0;
    loop {
        checks += 1;
        if probe_once(probe, probe_timeout).await {
            return available(bus, checks);
        }
        if checks >= budget {
            break;
        }
        time::sleep(policy.delay(checks - 1)).await;
    }

    bus.publish(Event::new(EventKind::NetworkTimedOut).with_count(checks as usize));
    NetworkStatus::TimedOut { checks }
}

async fn probe_once(probe: &dyn NetworkProbe, timeout: Option<Duration>) -> bool {
    match timeout {
        Some(dur) => time::timeout(dur, probe.check()).await.unwrap_or(false),
        None => probe.check().await,
    }
}

fn available(bus: &Bus, checks: u32) -> NetworkStatus {
    bus.publish(Event::new(EventKind::NetworkAvailable).with_count(checks as usize));
    NetworkStatus::Available { checks }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct UpAfter {
        calls: AtomicU32,
        up_at: u32,
    }

    #[async_trait]
    impl NetworkProbe for UpAfter {
        async fn check(&self) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst) + 1 >= self.up_at
        }
    }

    struct Hangs;

    #[async_trait]
    impl NetworkProbe for Hangs {
        async fn check(&self) -> bool {
            futures::future::pending::<()>().await;
            true
        }
    }

    #[tokio::test(start_paused = true)]
    async fn immediate_success_needs_one_probe() {
        let probe = UpAfter {
            calls: AtomicU32::new(0),
            up_at: 1,
        };
        let bus = Bus::new(8);
        let status = wait_for_network(&probe, &PollPolicy::default(), None, &bus).await;
        assert_eq!(status, NetworkStatus::Available { checks: 1 });
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_a_later_probe() {
        let probe = UpAfter {
            calls: AtomicU32::new(0),
            up_at: 4,
        };
        let bus = Bus::new(8);
        let start = time::Instant::now();
        let status = wait_for_network(&probe, &PollPolicy::default(), None, &bus).await;
        assert_eq!(status, NetworkStatus::Available { checks: 4 });
        assert_eq!(start.elapsed(), Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn default_budget_checks_exactly_max_checks_times() {
        let probe = UpAfter {
            calls: AtomicU32::new(0),
            up_at: u32::MAX,
        };
        let bus = Bus::new(8);
        let start = time::Instant::now();
        let status = wait_for_network(&probe, &PollPolicy::default(), None, &bus).await;
        assert_eq!(status, NetworkStatus::TimedOut { checks: 120 });
        assert_eq!(probe.calls.load(Ordering::SeqCst), 120);
        assert_eq!(start.elapsed(), Duration::from_millis(500 * 119));
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_wait_gives_up() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let policy = PollPolicy::constant(Duration::from_millis(500), 3);
        let start = time::Instant::now();
        let status = wait_for_network(&Hangs, &policy, Some(Duration::from_secs(3)), &bus).await;
        assert_eq!(start.elapsed(), Duration::from_secs(10));
        assert_eq!(status, NetworkStatus::TimedOut { checks: 3 });
        assert_eq!(rx.recv().await.unwrap().kind, EventKind::NetworkTimedOut);
    }
}
