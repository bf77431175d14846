//! # Event subscriber trait.
//!
//! [`Subscribe`] is the extension point for reacting to runtime events
//! (logging, analytics, host-side bookkeeping).
//!
//! Each subscriber gets:
//! - **Dedicated worker task**
//! - **Per-subscriber bounded queue** (capacity via [`Subscribe::queue_capacity`])
//! - **Panic isolation** (panics are reported as `EventKind::SubscriberPanicked`)
//!
//! ## Architecture
//! ```text
//! SubscriberSet ──► [bounded queue] ──► worker task ──► subscriber.on_event()
//!                                    └─► panic caught → EventKind::SubscriberPanicked
//! ```
//!
//! ## Rules
//! - A slow subscriber only affects its own queue.
//! - Queue overflow drops the event **for this subscriber only** and publishes
//!   `EventKind::SubscriberOverflow`.
//! - Events are processed sequentially (FIFO) per subscriber.
//! - Subscribers never block the runtime actor.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use adflow::{Event, EventKind, Subscribe};
//!
//! struct FillWatcher;
//!
//! #[async_trait]
//! impl Subscribe for FillWatcher {
//!     async fn on_event(&self, ev: &Event) {
//!         if matches!(ev.kind, EventKind::PoolFull) {
//!             // pool reached its target size
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "fill-watcher" }
//!     fn queue_capacity(&self) -> usize { 64 }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Event subscriber.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor.
/// - Handle errors internally; do not panic.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event.
    ///
    /// Called from a dedicated worker task, in FIFO order per subscriber.
    async fn on_event(&self, event: &Event);

    /// Subscriber name used in overflow/panic events.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred queue capacity (clamped to at least 1). Default: 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
