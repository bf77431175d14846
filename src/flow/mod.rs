//! Flow engine: steps, cursor and host capabilities.
//!
//! ## Contents
//! - [`FlowStep`] and payloads decoded from the configuration document
//! - [`FlowCursor`], [`RunState`], [`StepState`] engine position and sub-states
//! - [`Prompter`], [`Presenter`], [`LifecycleEvent`] host-side boundaries
//! - `FlowEngine` (crate-internal) the sequential state machine

mod cursor;
mod engine;
mod lifecycle;
mod presenter;
mod prompt;
mod step;

pub use cursor::{AdPhase, AdStepState, EvaluateGate, FlowCursor, RunState, StepState};
pub use engine::FlowSnapshot;
pub(crate) use engine::FlowEngine;
pub use lifecycle::LifecycleEvent;
pub use presenter::{PresentEvent, Presenter};
pub use prompt::{Prompt, PromptKind, PromptResponse, Prompter};
pub use step::{AdStep, DialogText, EvaluateResult, EvaluateStep, FlowStep, JumpStep};
