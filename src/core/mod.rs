//! # Core runtime.
//!
//! - [`RuntimeConfig`] timing knobs
//! - [`Runtime`] / [`RuntimeBuilder`] wiring of capabilities and subscribers
//! - [`RuntimeHandle`] host-facing API of the running actor
//! - [`NetworkProbe`] optional connectivity gate before launch
//!
//! Internals: the mailbox (single logical context), the load runner and the
//! bounded network wait.

mod builder;
mod config;
pub(crate) mod mailbox;
mod network;
pub(crate) mod runner;
mod runtime;

pub use builder::RuntimeBuilder;
pub use config::RuntimeConfig;
pub use network::{NetworkProbe, NetworkStatus};
pub use runtime::{LaunchState, Runtime, RuntimeHandle, Snapshot};
