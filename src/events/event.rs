//! # Runtime events emitted by the scheduler, the flow engine and the runtime.
//!
//! The [`EventKind`] enum classifies event types across five groups:
//! - **Launch events**: launch guard, network wait, loader initialization
//! - **Supply events**: fill loop, loads, type switches, pool consumption
//! - **Flow events**: steps, prompts, presentations, evaluate gate
//! - **Lifecycle events**: host backgrounding/foregrounding
//! - **Subscriber events**: overflow and panic reports
//!
//! The [`Event`] struct carries optional metadata (content type, source id,
//! step index, counters, reason, key/value params).
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use adflow::{ContentType, Event, EventKind};
//!
//! let ev = Event::new(EventKind::LoadFailed)
//!     .with_content(ContentType::Reward)
//!     .with_source("r1")
//!     .with_reason("no fill");
//!
//! assert_eq!(ev.kind, EventKind::LoadFailed);
//! assert_eq!(ev.source.as_deref(), Some("r1"));
//! assert_eq!(ev.reason.as_deref(), Some("no fill"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::supply::ContentType;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `source`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `source`: subscriber name
    /// - `reason`: "full" or "closed"
    SubscriberOverflow,

    // === Launch events ===
    /// First launch accepted.
    LaunchStarted,

    /// Launch called again while launching or launched; ignored.
    LaunchIgnored,

    /// Network probe succeeded.
    ///
    /// Sets:
    /// - `count`: number of checks performed
    NetworkAvailable,

    /// Network wait exhausted its budget; launch proceeds anyway.
    ///
    /// Sets:
    /// - `count`: number of checks performed
    NetworkTimedOut,

    /// Loader initialization started.
    InitStarted,

    /// Loader initialization succeeded.
    InitSucceeded,

    /// Loader initialization failed; supply stays idle.
    ///
    /// Sets:
    /// - `reason`: loader error
    InitFailed,

    /// Supply disabled by configuration; loader never initialized.
    SupplyDisabled,

    // === Supply events ===
    /// Fill loop started (cursor reset).
    ///
    /// Sets:
    /// - `pool_len`, `total`: pool size and target size
    FillStarted,

    /// Fill loop resumed after the pool dropped below target.
    FillResumed,

    /// Pool reached its target size; fill loop stopped.
    ///
    /// Sets:
    /// - `pool_len`
    PoolFull,

    /// Fill loop stopped: no source configured for any type, or every
    /// retry pause was spent without a successful load.
    ///
    /// Sets (when retries ran out):
    /// - `count`: pauses spent
    /// - `reason`
    FillStalled,

    /// A full cycle of sources failed; the next load waits.
    ///
    /// Sets:
    /// - `count`: pause number (1-based), `total`: pauses allowed
    /// - `delay_ms`: the pause
    FillBackoff,

    /// Load issued for a source unit.
    ///
    /// Sets:
    /// - `content`, `source`
    /// - `count`: index within the type list
    LoadStarted,

    /// Load resolved to a handle; item appended to the pool.
    ///
    /// Sets:
    /// - `content`, `source`, `pool_len`
    LoadSucceeded,

    /// Load failed.
    ///
    /// Sets:
    /// - `content`, `source`, `reason`
    /// - `count`: consecutive failures for the type after this one
    LoadFailed,

    /// Load completion arrived for a ticket that no longer exists.
    ///
    /// Sets:
    /// - `count`: the stale ticket
    /// - `reason`: load error, if the late load failed
    StaleLoadDiscarded,

    /// Cursor switched to another content type.
    ///
    /// Sets:
    /// - `content`: new type
    /// - `reason`: previous type label
    TypeSwitched,

    /// Item removed from the pool by a consumer.
    ///
    /// Sets:
    /// - `content`, `source`, `pool_len`
    ItemConsumed,

    /// Consumer asked for an item while the pool was empty.
    PoolEmpty,

    /// Pool and in-flight bookkeeping cleared.
    PoolCleared,

    // === Flow events ===
    /// Flow started.
    ///
    /// Sets:
    /// - `total`: number of steps
    FlowStarted,

    /// Flow start requested while running or completed; ignored.
    FlowStartIgnored,

    /// Step became current.
    ///
    /// Sets:
    /// - `step`, `reason`: step label
    StepStarted,

    /// Placeholder or unknown step skipped.
    ///
    /// Sets:
    /// - `step`, `reason`: step label
    StepSkipped,

    /// Step finished; cursor advanced.
    ///
    /// Sets:
    /// - `step`, param `step`
    StepCompleted,

    /// Every step executed.
    FlowCompleted,

    /// Prompt shown to the user.
    ///
    /// Sets:
    /// - `step`, params `title`, `message`, `prompt`
    PromptShown,

    /// Prompt answered.
    ///
    /// Sets:
    /// - `step`, params `title`, `message`, `button`, `choice`, `prompt`
    PromptAnswered,

    /// External link opened.
    ///
    /// Sets:
    /// - `step`, `reason`: url
    LinkOpened,

    /// Evaluate gate opened; waiting for background → foreground.
    EvaluateGateOpened,

    /// Evaluate result surface shown while backgrounded.
    ///
    /// Sets:
    /// - `step`, params `result`, `image`
    EvaluateResultShown,

    /// Ad step requests its next item.
    ///
    /// Sets:
    /// - `step`, `count`: shown so far, `total`: required
    AdRequested,

    /// Pool empty during an ad step; polling again.
    ///
    /// Sets:
    /// - `step`, `count`: poll check number, `delay_ms`
    AdWaiting,

    /// Ad step poll budget exhausted; step abandoned.
    ///
    /// Sets:
    /// - `step`, `count`: shown so far, `total`: required
    AdWaitExhausted,

    /// Presenter displayed content.
    ///
    /// Sets:
    /// - `step`, `content` (also for the three kinds below)
    AdShown,

    /// User clicked presented content.
    AdClicked,

    /// Presentation closed.
    AdClosed,

    /// Presentation failed (treated like a close).
    ///
    /// Sets:
    /// - `reason`
    AdFailed,

    // === Lifecycle events ===
    /// Host application entered background.
    EnteredBackground,

    /// Host application entered foreground.
    EnteredForeground,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Content type involved, if any.
    pub content: Option<ContentType>,
    /// Source id (or subscriber name for subscriber events).
    pub source: Option<Arc<str>>,
    /// Flow step index.
    pub step: Option<u32>,
    /// Generic counter (attempt, check number, shown so far).
    pub count: Option<u32>,
    /// Generic upper bound paired with `count`.
    pub total: Option<u32>,
    /// Pool occupancy after the transition.
    pub pool_len: Option<u32>,
    /// Delay in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Human-readable reason.
    pub reason: Option<Arc<str>>,
    /// Free-form key/value parameters (analytics payload).
    pub params: Vec<(&'static str, Arc<str>)>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            content: None,
            source: None,
            step: None,
            count: None,
            total: None,
            pool_len: None,
            delay_ms: None,
            reason: None,
            params: Vec::new(),
        }
    }

    /// Attaches a content type.
    #[inline]
    pub fn with_content(mut self, kind: ContentType) -> Self {
        self.content = Some(kind);
        self
    }

    /// Attaches a source id.
    #[inline]
    pub fn with_source(mut self, source: impl Into<Arc<str>>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Attaches a step index.
    #[inline]
    pub fn with_step(mut self, step: usize) -> Self {
        self.step = Some(clamp_u32(step));
        self
    }

    /// Attaches a counter.
    #[inline]
    pub fn with_count(mut self, n: usize) -> Self {
        self.count = Some(clamp_u32(n));
        self
    }

    /// Attaches an upper bound.
    #[inline]
    pub fn with_total(mut self, n: usize) -> Self {
        self.total = Some(clamp_u32(n));
        self
    }

    /// Attaches the pool occupancy.
    #[inline]
    pub fn with_pool_len(mut self, n: usize) -> Self {
        self.pool_len = Some(clamp_u32(n));
        self
    }

    /// Attaches a delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Appends a key/value parameter.
    #[inline]
    pub fn with_param(mut self, key: &'static str, value: impl Into<Arc<str>>) -> Self {
        self.params.push((key, value.into()));
        self
    }

    /// Looks up a parameter by key.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_ref())
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_source(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_source(subscriber)
            .with_reason(info)
    }
}

#[inline]
fn clamp_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
