//! # Prompt capability.
//!
//! The flow engine never renders anything. It hands a [`Prompt`] to the host's
//! [`Prompter`] and waits for the [`PromptResponse`]; link opening and the
//! evaluate result surface go through the same capability.

use async_trait::async_trait;

use crate::flow::step::{DialogText, EvaluateResult};

/// Which step produced the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// Single-button prompt of an Evaluate step.
    Evaluate,
    /// Two-button prompt of a Message step.
    Message,
    /// Two-button prompt shown after each Ad presentation.
    PostAd,
}

impl PromptKind {
    pub fn as_label(self) -> &'static str {
        match self {
            PromptKind::Evaluate => "evaluate",
            PromptKind::Message => "message",
            PromptKind::PostAd => "post_ad",
        }
    }
}

/// A prompt to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub kind: PromptKind,
    pub title: String,
    pub message: String,
    /// `None` for single-button prompts.
    pub cancel_label: Option<String>,
    pub confirm_label: String,
}

impl Prompt {
    /// Single-button prompt.
    pub fn single(kind: PromptKind, message: &str, confirm_label: &str) -> Self {
        Self {
            kind,
            title: String::new(),
            message: message.to_string(),
            cancel_label: None,
            confirm_label: confirm_label.to_string(),
        }
    }

    /// Two-button prompt built from dialog texts.
    pub fn dialog(kind: PromptKind, text: &DialogText) -> Self {
        Self {
            kind,
            title: text.title.clone(),
            message: text.message.clone(),
            cancel_label: Some(text.cancel_label.clone()),
            confirm_label: text.confirm_label.clone(),
        }
    }

    /// Label of the button matching `response`.
    pub fn button_label(&self, response: PromptResponse) -> &str {
        match response {
            PromptResponse::Cancel => self.cancel_label.as_deref().unwrap_or(&self.confirm_label),
            PromptResponse::Confirm => &self.confirm_label,
        }
    }
}

/// Button the user pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptResponse {
    Cancel,
    Confirm,
}

impl PromptResponse {
    pub fn as_label(self) -> &'static str {
        match self {
            PromptResponse::Cancel => "cancel",
            PromptResponse::Confirm => "confirm",
        }
    }
}

/// Host-side prompt surface.
#[async_trait]
pub trait Prompter: Send + Sync + 'static {
    /// Shows `prompt` and resolves with the pressed button.
    async fn prompt(&self, prompt: Prompt) -> PromptResponse;

    /// Opens an external link (the host is expected to background).
    fn open_link(&self, url: &str);

    /// Shows the evaluate result surface. Default: nothing to show.
    fn show_result(&self, _result: &EvaluateResult) {}
}
