//! # Built-in subscribers
//!
//! - [`LogWriter`]: renders events through `tracing`.
//! - [`AnalyticsBridge`]: forwards events to an [`AnalyticsSink`] under stable names.

mod analytics;
#[cfg(feature = "logging")]
mod log;

pub use analytics::{AnalyticsBridge, AnalyticsSink};
#[cfg(feature = "logging")]
pub use log::LogWriter;
