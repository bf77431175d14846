//! Delay policies.
//!
//! ## Contents
//! - [`BackoffPolicy`] how delays evolve (first / factor / max + jitter)
//! - [`JitterPolicy`]  randomization applied to each delay
//! - [`PollPolicy`]    backoff plus a bounded number of checks
//!
//! ## Quick wiring
//! ```text
//! RuntimeConfig { network_poll, ad_poll, fill_retry: PollPolicy }
//!      ├─► core::network::wait_for_network  (probe until available or exhausted)
//!      ├─► flow::FlowEngine                 (pool poll inside an Ad step)
//!      └─► supply::SupplyScheduler          (pause after a fully failed cycle)
//! ```
//!
//! ## Defaults
//! - `PollPolicy::default()` → constant 500ms, 120 checks.
//! - `PollPolicy::fill_retry()` → 1s doubling to 60s, equal jitter, 8 pauses.
//! - `JitterPolicy::None` by default.

mod backoff;
mod jitter;
mod poll;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
pub use poll::PollPolicy;
