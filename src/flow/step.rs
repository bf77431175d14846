//! # Flow steps.
//!
//! [`FlowStep`] is a closed tagged union with one variant per configuration tag:
//!
//! | tag | variant                  | behaviour                                        |
//! |-----|--------------------------|--------------------------------------------------|
//! | `E` | [`FlowStep::Evaluate`]   | one-button prompt, link open, lifecycle gated    |
//! | `M` | [`FlowStep::Message`]    | two-button prompt, always advances               |
//! | `A` | [`FlowStep::Ad`]         | presents pooled content `repeat_count` times     |
//! | `T` | [`FlowStep::Task`]       | placeholder, advances immediately                |
//! | `J` | [`FlowStep::Jump`]       | placeholder, advances immediately                |
//! | *   | [`FlowStep::Unknown`]    | always skipped                                   |
//!
//! Steps are immutable once decoded.

use serde::Deserialize;
use serde_json::Value;

/// Title/message/button texts of a two-button prompt.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DialogText {
    pub title: String,
    pub message: String,
    /// Label of the dismissive button.
    #[serde(rename = "cancel")]
    pub cancel_label: String,
    /// Label of the affirmative button.
    #[serde(rename = "confirm")]
    pub confirm_label: String,
}

/// Payload of an Evaluate (`E`) step.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EvaluateStep {
    /// Link opened when the prompt is confirmed.
    pub url: String,
    pub message: String,
    #[serde(rename = "button")]
    pub button_label: String,
    /// Result code reported to analytics when the result surface is shown.
    pub result: i64,
    /// Optional result image surfaced when the host goes to background.
    #[serde(default)]
    pub image: Option<String>,
    /// Optional link attached to the result image.
    #[serde(default)]
    pub link: Option<String>,
}

impl EvaluateStep {
    /// Returns the supplementary result surface, if one is configured.
    pub fn result_surface(&self) -> Option<EvaluateResult> {
        self.image.as_ref().map(|image| EvaluateResult {
            image: image.clone(),
            link: self.link.clone().filter(|l| !l.is_empty()),
            result: self.result,
        })
    }
}

/// Supplementary content shown while an Evaluate gate is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluateResult {
    /// Image location.
    pub image: String,
    /// Link opened when the image is tapped (`None` if absent or empty).
    pub link: Option<String>,
    /// Configured result code.
    pub result: i64,
}

/// Payload of an Ad (`A`) step.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AdStep {
    /// How many items to present.
    #[serde(rename = "times")]
    pub repeat_count: u32,
    /// Prompts drawn (uniformly at random) after every presentation.
    #[serde(rename = "message", default)]
    pub post_ad_prompts: Vec<DialogText>,
}

/// Payload of a Jump (`J`) step. Decoded but not acted upon.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JumpStep {
    pub link: String,
    #[serde(rename = "isLock")]
    pub is_lock: bool,
    pub title: String,
    pub message: String,
    pub button: String,
}

/// One step of a configured flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowStep {
    Evaluate(EvaluateStep),
    Message(DialogText),
    Ad(AdStep),
    Task,
    Jump(JumpStep),
    /// Unrecognized tag, kept so the flow length matches the document.
    Unknown(String),
}

impl FlowStep {
    /// Decodes a step from its tag and payload.
    ///
    /// `data` may be a JSON object or a string holding a JSON object.
    /// Unknown tags never fail; a known tag with a mismatching payload does.
    pub fn decode(tag: &str, data: &Value) -> Result<FlowStep, serde_json::Error> {
        if !matches!(tag, "E" | "M" | "A" | "T" | "J") {
            return Ok(FlowStep::Unknown(tag.to_string()));
        }

        let owned;
        let payload = match data {
            Value::String(raw) => {
                owned = serde_json::from_str::<Value>(raw)?;
                &owned
            }
            other => other,
        };

        let step = match tag {
            "E" => FlowStep::Evaluate(EvaluateStep::deserialize(payload)?),
            "M" => FlowStep::Message(DialogText::deserialize(payload)?),
            "A" => FlowStep::Ad(AdStep::deserialize(payload)?),
            "T" => {
                serde_json::Map::<String, Value>::deserialize(payload)?;
                FlowStep::Task
            }
            _ => FlowStep::Jump(JumpStep::deserialize(payload)?),
        };
        Ok(step)
    }

    /// Returns a short stable label (snake_case).
    pub fn as_label(&self) -> &'static str {
        match self {
            FlowStep::Evaluate(_) => "evaluate",
            FlowStep::Message(_) => "message",
            FlowStep::Ad(_) => "ad",
            FlowStep::Task => "task",
            FlowStep::Jump(_) => "jump",
            FlowStep::Unknown(_) => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_message_from_string_payload() {
        let data = Value::String(
            r#"{"title":"t","message":"m","cancel":"no","confirm":"yes"}"#.to_string(),
        );
        let step = FlowStep::decode("M", &data).unwrap();
        assert_eq!(
            step,
            FlowStep::Message(DialogText {
                title: "t".into(),
                message: "m".into(),
                cancel_label: "no".into(),
                confirm_label: "yes".into(),
            })
        );
    }

    #[test]
    fn decodes_ad_with_prompts() {
        let data = json!({
            "times": 2,
            "message": [{"title":"a","message":"b","cancel":"c","confirm":"d"}]
        });
        match FlowStep::decode("A", &data).unwrap() {
            FlowStep::Ad(ad) => {
                assert_eq!(ad.repeat_count, 2);
                assert_eq!(ad.post_ad_prompts.len(), 1);
            }
            other => panic!("unexpected step {other:?}"),
        }
    }

    #[test]
    fn mismatching_payload_is_an_error() {
        let data = json!({"title": "only a title"});
        assert!(FlowStep::decode("M", &data).is_err());
        assert!(FlowStep::decode("T", &json!([1, 2])).is_err());
    }

    #[test]
    fn unknown_tag_decodes_to_unknown() {
        let step = FlowStep::decode("Z", &json!(null)).unwrap();
        assert_eq!(step, FlowStep::Unknown("Z".into()));
    }

    #[test]
    fn empty_result_link_is_dropped() {
        let step = EvaluateStep {
            url: "u".into(),
            message: "m".into(),
            button_label: "b".into(),
            result: 3,
            image: Some("img".into()),
            link: Some(String::new()),
        };
        let surface = step.result_surface().unwrap();
        assert_eq!(surface.link, None);
        assert_eq!(surface.result, 3);
    }
}
