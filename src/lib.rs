//! # adflow
//!
//! **adflow** is a demand-driven content supply scheduler paired with a
//! sequential interstitial flow engine.
//!
//! The scheduler keeps a bounded pool of preloaded content items filled from
//! a rotating list of source units, one load at a time. The flow engine walks
//! a configured list of steps (messages, store-review prompts, ad
//! presentations) and pulls items from the pool when a step needs them. The
//! host application plugs in its loader, presenter, prompter and analytics
//! through capability traits.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   host ──► RuntimeHandle ──(Message)──► mailbox (unbounded mpsc)
//!                                               │
//!                                               ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  RuntimeActor (single tokio task, owns all mutable state)         │
//! │  - SupplyScheduler (pool, cursor, in-flight load ticket)          │
//! │  - FlowEngine      (steps, cursor, pending prompt/presentation)   │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        │ dispatch         │ dispatch         │ post_after    │
//!        ▼                  ▼                  ▼               │
//!   Loader::load()   Prompter::prompt()   PollTick/Init     Publishes
//!   Presenter stream       │              (delayed)         events
//!        │                  │                  │               │
//!        └──── completion Message (with ticket) ┘               │
//!                        back into the mailbox                 ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │               (capacity: RuntimeConfig::bus_capacity)             │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │  subscriber_listener   │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                         ┌─────────┼─────────┐
//!                         ▼         ▼         ▼
//!                     LogWriter AnalyticsBridge custom
//! ```
//!
//! ### Supply lifecycle
//! ```text
//! start_filling ──► pump
//!   ├─ load in flight          ─► wait
//!   ├─ pool full               ─► PoolFull, stop
//!   ├─ no sources at all       ─► FillStalled, stop
//!   └─ Loader::load(unit)      ─► LoadFinished{ticket}
//!        ├─ stale ticket       ─► StaleLoadDiscarded
//!        ├─ Ok  ─► push, LoadSucceeded, next unit of the same type
//!        └─ Err ─► LoadFailed, next unit; after L failures switch type
//!             └─ every source failed in a row ─► FillBackoff ─► FillRetry (delayed) ─► pump
//!                                                └─ pauses spent ─► FillStalled, stop
//!
//! request_item ──► pop ─► ItemConsumed | PoolEmpty
//!                   └─ below target and not filling (also after a stall) ─► FillResumed ─► pump
//! ```
//!
//! ### Flow lifecycle
//! ```text
//! start(steps) ─► step 0
//!   ├─ Message  ─► prompt ─► any button ─► next
//!   ├─ Evaluate ─► prompt ─► confirm ─► open link ─► background ─► foreground ─► next
//!   ├─ Ad(n)    ─► request item (bounded poll) ─► present ─► post-ad prompt
//!   │               └─ repeat until shown n times ─► next
//!   └─ other    ─► StepSkipped ─► next
//! last step done ─► FlowCompleted
//! ```
//!
//! ## Features
//! | Area             | Description                                          | Key types / traits                              |
//! |------------------|------------------------------------------------------|-------------------------------------------------|
//! | **Runtime**      | Launch, lifecycle forwarding, snapshots, shutdown.   | [`Runtime`], [`RuntimeHandle`], [`RuntimeConfig`] |
//! | **Supply**       | Rotating source units and a bounded content pool.    | [`Loader`], [`ContentUnitRegistry`], [`Pool`]   |
//! | **Flow**         | Sequential interstitial steps.                       | [`FlowStep`], [`Presenter`], [`Prompter`]       |
//! | **Document**     | Remote configuration decoding.                       | [`FlowConfig`]                                  |
//! | **Subscriber API** | Hook into runtime events (logging, analytics).     | [`Subscribe`], [`AnalyticsSink`]                |
//! | **Policies**     | Poll and backoff timing.                             | [`PollPolicy`], [`BackoffPolicy`]               |
//! | **Errors**       | Typed errors for decoding, loading and the handle.   | [`ConfigError`], [`LoadError`], [`RuntimeError`] |
//!
//! ## Optional features
//! - `logging` (default): exports [`LogWriter`], a subscriber that renders
//!   events through `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use async_trait::async_trait;
//! use adflow::{
//!     ContentHandle, FlowConfig, LoadError, Loader, Runtime, RuntimeConfig, SourceUnit,
//! };
//!
//! struct Preloaded;
//!
//! #[async_trait]
//! impl Loader for Preloaded {
//!     async fn load(&self, unit: SourceUnit) -> Result<ContentHandle, LoadError> {
//!         Ok(ContentHandle::new(unit.source_id.clone()))
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut cfg = RuntimeConfig::default();
//!     cfg.init_delay = Duration::ZERO;
//!     cfg.fill_delay = Duration::ZERO;
//!
//!     let rt = Runtime::builder(cfg)
//!         .with_loader(Arc::new(Preloaded))
//!         .build();
//!
//!     let doc = FlowConfig::from_json(
//!         r#"{"appId":"app","rewardSlotId":["r1"],"interstitialSlotId":[],
//!             "splashSlotId":[],"isEnable":true,"cacheLength":1,"flows":[]}"#,
//!     )?;
//!     rt.launch(doc)?;
//!
//!     let snap = rt.snapshot().await?;
//!     assert_eq!(snap.flow.step_count, 0);
//!
//!     rt.shutdown();
//!     Ok(())
//! }
//! ```
mod core;
mod document;
mod error;
mod events;
mod flow;
mod policies;
mod subscribers;
mod supply;

// ---- Public re-exports ----

pub use core::{
    LaunchState, NetworkProbe, NetworkStatus, Runtime, RuntimeBuilder, RuntimeConfig,
    RuntimeHandle, Snapshot,
};
pub use document::FlowConfig;
pub use error::{ConfigError, LoadError, RuntimeError};
pub use events::{Bus, Event, EventKind};
pub use flow::{
    AdPhase, AdStep, AdStepState, DialogText, EvaluateGate, EvaluateResult, EvaluateStep,
    FlowCursor, FlowSnapshot, FlowStep, JumpStep, LifecycleEvent, PresentEvent, Presenter, Prompt,
    PromptKind, PromptResponse, Prompter, RunState, StepState,
};
pub use policies::{BackoffPolicy, JitterPolicy, PollPolicy};
pub use subscribers::{AnalyticsBridge, AnalyticsSink, Subscribe, SubscriberSet};
pub use supply::{
    CachedItem, ContentHandle, ContentType, ContentUnitRegistry, CursorMove, Loader, Pool,
    SchedulerCursor, SourceUnit, SupplySnapshot,
};

// Optional: built-in subscriber rendering events through `tracing`.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
