//! # Configuration document.
//!
//! [`FlowConfig`] is the decoded form of the remote configuration the host
//! fetches. Only the fields the runtime consumes are modelled.
//!
//! ## Degrade by omission
//! ```text
//! flows: [ {type:"M", data:ok}, {type:"A", data:broken}, {type:"X", data:..} ]
//!                 │                        │                      │
//!                 ▼                        ▼                      ▼
//!         FlowStep::Message          omitted (warn)        FlowStep::Unknown
//! ```
//! A broken step never fails the whole document.
//!
//! ## Example
//! ```rust
//! use adflow::{FlowConfig, FlowStep};
//!
//! let doc = r#"{
//!     "appId": "app",
//!     "rewardSlotId": ["r1", "r2"],
//!     "interstitialSlotId": [],
//!     "splashSlotId": [],
//!     "isEnable": true,
//!     "cacheLength": 1,
//!     "flows": [
//!         {"type": "M", "data": "{\"title\":\"t\",\"message\":\"m\",\"cancel\":\"c\",\"confirm\":\"ok\"}"},
//!         {"type": "A", "data": "not json"}
//!     ]
//! }"#;
//!
//! let cfg = FlowConfig::from_json(doc).unwrap();
//! assert_eq!(cfg.steps.len(), 1);
//! assert!(matches!(cfg.steps[0], FlowStep::Message(_)));
//! ```

use serde::Deserialize;
use serde_json::Value;

use crate::error::ConfigError;
use crate::flow::FlowStep;
use crate::supply::ContentType;

/// Raw document shape.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDocument {
    #[serde(default)]
    um_key: Option<String>,
    #[serde(default)]
    b_id: Option<String>,
    app_id: String,
    reward_slot_id: Vec<String>,
    interstitial_slot_id: Vec<String>,
    splash_slot_id: Vec<String>,
    is_enable: bool,
    cache_length: usize,
    #[serde(default)]
    flows: Vec<RawFlowItem>,
}

#[derive(Deserialize)]
struct RawFlowItem {
    #[serde(rename = "type")]
    tag: String,
    #[serde(default)]
    data: Value,
}

/// Decoded configuration document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowConfig {
    /// Analytics key handed to the analytics sink on launch.
    pub analytics_key: Option<String>,
    /// Bundle identifier override (consumed by the host, not the runtime).
    pub bundle_id: Option<String>,
    /// Loader application id.
    pub app_id: String,
    /// Reward source ids, in rotation order.
    pub reward_sources: Vec<String>,
    /// Interstitial source ids, in rotation order.
    pub interstitial_sources: Vec<String>,
    /// Splash source ids, in rotation order.
    pub splash_sources: Vec<String>,
    /// Whether content supply is enabled at all.
    pub enabled: bool,
    /// Target pool size.
    pub target_size: usize,
    /// Flow steps that decoded successfully.
    pub steps: Vec<FlowStep>,
}

impl FlowConfig {
    /// Decodes a JSON document.
    ///
    /// Document-level problems return [`ConfigError`]; step-level problems
    /// drop the step and emit a `tracing` warning.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let doc: RawDocument = serde_json::from_str(raw)?;
        if doc.app_id.trim().is_empty() {
            return Err(ConfigError::InvalidField {
                field: "appId",
                reason: "must not be empty".into(),
            });
        }

        let steps = doc
            .flows
            .iter()
            .enumerate()
            .filter_map(|(idx, item)| match FlowStep::decode(&item.tag, &item.data) {
                Ok(step) => Some(step),
                Err(e) => {
                    tracing::warn!(index = idx, tag = %item.tag, error = %e, "flow step omitted");
                    None
                }
            })
            .collect();

        Ok(Self {
            analytics_key: doc.um_key,
            bundle_id: doc.b_id,
            app_id: doc.app_id,
            reward_sources: doc.reward_slot_id,
            interstitial_sources: doc.interstitial_slot_id,
            splash_sources: doc.splash_slot_id,
            enabled: doc.is_enable,
            target_size: doc.cache_length,
            steps,
        })
    }

    /// Returns the configured source ids for a content type.
    pub fn sources(&self, kind: ContentType) -> &[String] {
        match kind {
            ContentType::Reward => &self.reward_sources,
            ContentType::Interstitial => &self.interstitial_sources,
            ContentType::Splash => &self.splash_sources,
        }
    }
}
