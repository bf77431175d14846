//! # Event subscribers.
//!
//! [`Subscribe`] is the observer extension point; [`SubscriberSet`] fans events
//! out to every registered subscriber.
//!
//! ## Architecture
//! ```text
//! Runtime actor ── publish(Event) ──► Bus ──► listener ──► SubscriberSet
//!                                                              │
//!                                            ┌─────────────────┼──────────────┐
//!                                            ▼                 ▼              ▼
//!                                        LogWriter      AnalyticsBridge     custom
//! ```

mod embedded;
mod subscriber;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
pub use embedded::{AnalyticsBridge, AnalyticsSink};
pub use subscriber::Subscribe;
pub use subscriber_set::SubscriberSet;
