//! # AnalyticsBridge: events mapped to named analytics events.
//!
//! The runtime never talks to an analytics backend directly. The bridge
//! subscribes to the bus and forwards a subset of events to an
//! [`AnalyticsSink`] under stable names:
//!
//! | event                  | name                                   |
//! |------------------------|----------------------------------------|
//! | `LoadSucceeded`        | `<Type>.LoadSucceed`                   |
//! | `LoadFailed`           | `<Type>.LoadFail`                      |
//! | `ItemConsumed`         | `GetAd.<type>`                         |
//! | `AdShown` / `AdClicked`/ `AdClosed` / `AdFailed` | `<Type>.Show` / `.Click` / `.Close` / `.Fail` |
//! | `PromptShown`          | `alertMessage.Show`                    |
//! | `PromptAnswered`       | `alertMessage` or `alertMessage.Ad.<choice>` |
//! | `EvaluateResultShown`  | `EvaluateResult:<result>`              |
//! | `StepCompleted`        | `Flow.StepCompleted`                   |
//! | `FlowCompleted`        | `Flow.Completed`                       |
//!
//! Delivery is best-effort: the sink is fire-and-forget.

use std::sync::Arc;

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Named-event analytics backend.
pub trait AnalyticsSink: Send + Sync + 'static {
    /// Called once per launch with the document's analytics key.
    fn initialize(&self, _key: Option<&str>) {}

    /// Records one named event.
    fn track(&self, name: &str, params: &[(&'static str, Arc<str>)]);
}

/// Subscriber forwarding events to an [`AnalyticsSink`].
pub struct AnalyticsBridge {
    sink: Arc<dyn AnalyticsSink>,
}

impl AnalyticsBridge {
    pub fn new(sink: Arc<dyn AnalyticsSink>) -> Self {
        Self { sink }
    }

    /// Analytics name for `ev`, or `None` when the event is not tracked.
    pub fn event_name(ev: &Event) -> Option<String> {
        let typed = |suffix: &str| {
            ev.content
                .map(|c| format!("{}.{suffix}", c.analytics_prefix()))
        };

        match ev.kind {
            EventKind::LoadSucceeded => typed("LoadSucceed"),
            EventKind::LoadFailed => typed("LoadFail"),
            EventKind::ItemConsumed => ev.content.map(|c| format!("GetAd.{}", c.as_label())),
            EventKind::AdShown => typed("Show"),
            EventKind::AdClicked => typed("Click"),
            EventKind::AdClosed => typed("Close"),
            EventKind::AdFailed => typed("Fail"),
            EventKind::PromptShown => Some("alertMessage.Show".to_string()),
            EventKind::PromptAnswered => match (ev.param("prompt"), ev.param("choice")) {
                (Some("post_ad"), Some(choice)) => Some(format!("alertMessage.Ad.{choice}")),
                _ => Some("alertMessage".to_string()),
            },
            EventKind::EvaluateResultShown => ev.param("result").map(|n| format!("EvaluateResult:{n}")),
            EventKind::StepCompleted => Some("Flow.StepCompleted".to_string()),
            EventKind::FlowCompleted => Some("Flow.Completed".to_string()),
            _ => None,
        }
    }
}

#[async_trait]
impl Subscribe for AnalyticsBridge {
    async fn on_event(&self, ev: &Event) {
        if let Some(name) = Self::event_name(ev) {
            self.sink.track(&name, &ev.params);
        }
    }

    fn name(&self) -> &'static str {
        "AnalyticsBridge"
    }
}
