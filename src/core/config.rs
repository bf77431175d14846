//! # Runtime configuration.
//!
//! [`RuntimeConfig`] holds every timing knob of the runtime. The content
//! document ([`FlowConfig`](crate::FlowConfig)) arrives later, at launch.
//!
//! ## Sentinel values
//! - `load_timeout = 0s` → no per-load timeout
//! - `probe_timeout = 0s` → no per-probe timeout
//! - `bus_capacity = 0` → clamped to 1

use std::time::Duration;

use crate::policies::PollPolicy;

/// Runtime configuration.
///
/// All fields are public. Prefer the helper accessors over sprinkling sentinel
/// checks (`0`) across the code.
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    /// Capacity of the event bus ring buffer (min 1).
    pub bus_capacity: usize,

    /// Delay between launching an enabled document and loader initialization.
    pub init_delay: Duration,

    /// Delay between successful initialization and the first fill.
    pub fill_delay: Duration,

    /// Per-load timeout; expiry counts as a load failure.
    pub load_timeout: Duration,

    /// Pool poll while an Ad step waits for content.
    ///
    /// When exhausted the Ad step is abandoned and the flow advances.
    pub ad_poll: PollPolicy,

    /// Network wait before launch (only with a network probe).
    ///
    /// When exhausted the launch proceeds anyway.
    pub network_poll: PollPolicy,

    /// Timeout of a single network probe.
    pub probe_timeout: Duration,

    /// Pauses between fill cycles in which every source failed.
    ///
    /// When exhausted filling stalls until the next item request.
    pub fill_retry: PollPolicy,
}

impl RuntimeConfig {
    /// Per-load timeout as an `Option`.
    #[inline]
    pub fn load_timeout(&self) -> Option<Duration> {
        non_zero(self.load_timeout)
    }

    /// Per-probe timeout as an `Option`.
    #[inline]
    pub fn probe_timeout(&self) -> Option<Duration> {
        non_zero(self.probe_timeout)
    }

    /// Bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for RuntimeConfig {
    /// Default configuration:
    ///
    /// - `bus_capacity = 1024`
    /// - `init_delay = 2s`, `fill_delay = 2s`
    /// - `load_timeout = 30s`
    /// - `ad_poll = network_poll = 500ms × 120`
    /// - `probe_timeout = 3s`
    /// - `fill_retry = 1s doubling to 60s, equal jitter, 8 pauses`
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            init_delay: Duration::from_secs(2),
            fill_delay: Duration::from_secs(2),
            load_timeout: Duration::from_secs(30),
            ad_poll: PollPolicy::default(),
            network_poll: PollPolicy::default(),
            probe_timeout: Duration::from_secs(3),
            fill_retry: PollPolicy::fill_retry(),
        }
    }
}

#[inline]
fn non_zero(d: Duration) -> Option<Duration> {
    if d == Duration::ZERO { None } else { Some(d) }
}
