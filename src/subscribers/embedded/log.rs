//! # LogWriter: events rendered through `tracing`.
//!
//! Each event becomes one `tracing` record under the `adflow` target. Failures
//! and degraded paths log at `warn`, state transitions at `info`, polling noise
//! at `debug`.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! INFO adflow: [load-ok] content=reward source="r2" pool=1
//! WARN adflow: [load-failed] content=reward source="r1" failures=1 err="no fill"
//! DEBUG adflow: [ad-waiting] step=1 check=3 delay_ms=500
//! INFO adflow: [flow-completed]
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Subscriber that forwards events to `tracing`.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let content = e.content.map(|c| c.as_label()).unwrap_or("-");
        let source = e.source.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");

        match e.kind {
            EventKind::SubscriberPanicked => {
                tracing::error!(target: "adflow", subscriber = source, info = reason, "[subscriber-panicked]");
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(target: "adflow", subscriber = source, reason, "[subscriber-overflow]");
            }
            EventKind::LoadFailed => {
                tracing::warn!(
                    target: "adflow",
                    content,
                    source,
                    failures = ?e.count,
                    err = reason,
                    "[load-failed]"
                );
            }
            EventKind::InitFailed
            | EventKind::NetworkTimedOut
            | EventKind::FillStalled
            | EventKind::AdWaitExhausted
            | EventKind::AdFailed => {
                tracing::warn!(
                    target: "adflow",
                    kind = ?e.kind,
                    step = ?e.step,
                    count = ?e.count,
                    reason,
                    "[degraded]"
                );
            }
            EventKind::LoadSucceeded => {
                tracing::info!(target: "adflow", content, source, pool = ?e.pool_len, "[load-ok]");
            }
            EventKind::ItemConsumed | EventKind::PoolFull | EventKind::PoolCleared => {
                tracing::info!(target: "adflow", kind = ?e.kind, content, source, pool = ?e.pool_len, "[pool]");
            }
            EventKind::AdWaiting | EventKind::LoadStarted | EventKind::StaleLoadDiscarded => {
                tracing::debug!(
                    target: "adflow",
                    kind = ?e.kind,
                    content,
                    source,
                    step = ?e.step,
                    check = ?e.count,
                    delay_ms = ?e.delay_ms,
                    "[poll]"
                );
            }
            EventKind::FillBackoff => {
                tracing::warn!(
                    target: "adflow",
                    pause = ?e.count,
                    of = ?e.total,
                    delay_ms = ?e.delay_ms,
                    "[fill-backoff]"
                );
            }
            EventKind::FlowCompleted => {
                tracing::info!(target: "adflow", "[flow-completed]");
            }
            _ => {
                tracing::info!(
                    target: "adflow",
                    kind = ?e.kind,
                    content,
                    step = ?e.step,
                    count = ?e.count,
                    total = ?e.total,
                    reason,
                    "[event]"
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
