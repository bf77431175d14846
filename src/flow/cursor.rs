//! # Flow cursor and per-step sub-states.
//!
//! [`FlowCursor`] is `(step_index, run_state, sub_state)`:
//! - `step_index` only increases;
//! - `run_state` goes `Idle → Running → Completed`, never backward;
//! - the sub-state exists only for the current step and is dropped on advance.

/// Run state of a flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Completed,
}

/// Lifecycle gate of an Evaluate step.
///
/// Opens on confirm. While open, a background transition stores a token and a
/// later foreground transition with a stored token closes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EvaluateGate {
    open: bool,
    token: Option<u64>,
}

impl EvaluateGate {
    /// True while waiting for the lifecycle round-trip.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Token stored by the last background transition.
    #[inline]
    pub fn token(&self) -> Option<u64> {
        self.token
    }

    pub(crate) fn open(&mut self) {
        self.open = true;
        self.token = None;
    }

    /// Records a background transition. Returns `false` if the gate is closed.
    pub(crate) fn on_background(&mut self, token: u64) -> bool {
        if !self.open {
            return false;
        }
        self.token = Some(token);
        true
    }

    /// Records a foreground transition. Returns `true` when the round-trip
    /// completed and the step may advance.
    pub(crate) fn on_foreground(&mut self) -> bool {
        if self.open && self.token.is_some() {
            self.open = false;
            self.token = None;
            return true;
        }
        false
    }
}

/// What an Ad step is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdPhase {
    /// Pool was empty; a poll tick is pending.
    Waiting,
    /// An item is being presented.
    Presenting,
    /// The post-ad prompt is shown.
    Prompting,
}

/// Sub-state of an Ad step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdStepState {
    pub times_required: u32,
    pub times_shown: u32,
    pub phase: AdPhase,
    /// Ticket of the pending poll tick or presentation.
    pub pending: Option<u64>,
    /// Delayed polls spent on the current item slot.
    pub poll_checks: u32,
}

impl AdStepState {
    pub(crate) fn new(times_required: u32) -> Self {
        Self {
            times_required,
            times_shown: 0,
            phase: AdPhase::Waiting,
            pending: None,
            poll_checks: 0,
        }
    }

    /// True while more presentations are owed.
    #[inline]
    pub fn wants_more(&self) -> bool {
        self.times_shown < self.times_required
    }
}

/// Sub-state of the current step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepState {
    #[default]
    None,
    /// Prompt of a Message step is shown.
    Prompt,
    Evaluate(EvaluateGate),
    Ad(AdStepState),
}

/// Position of the flow engine in its step list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowCursor {
    step_index: usize,
    run_state: RunState,
    sub: StepState,
}

impl FlowCursor {
    #[inline]
    pub fn step_index(&self) -> usize {
        self.step_index
    }

    #[inline]
    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    #[inline]
    pub fn sub_state(&self) -> &StepState {
        &self.sub
    }

    pub(crate) fn sub_state_mut(&mut self) -> &mut StepState {
        &mut self.sub
    }

    pub(crate) fn set_sub_state(&mut self, sub: StepState) {
        self.sub = sub;
    }

    /// `Idle → Running` at step 0. Returns `false` in any other state.
    pub(crate) fn start(&mut self) -> bool {
        if self.run_state != RunState::Idle {
            return false;
        }
        self.run_state = RunState::Running;
        self.step_index = 0;
        self.sub = StepState::None;
        true
    }

    /// Moves to the next step and drops the sub-state.
    pub(crate) fn advance(&mut self) {
        if self.run_state == RunState::Running {
            self.step_index += 1;
            self.sub = StepState::None;
        }
    }

    /// `Running → Completed`.
    pub(crate) fn complete(&mut self) {
        if self.run_state == RunState::Running {
            self.run_state = RunState::Completed;
            self.sub = StepState::None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_only_from_idle() {
        let mut c = FlowCursor::default();
        assert!(c.start());
        assert!(!c.start());
        c.complete();
        assert!(!c.start());
        assert_eq!(c.run_state(), RunState::Completed);
    }

    #[test]
    fn advance_drops_sub_state_and_is_inert_after_completion() {
        let mut c = FlowCursor::default();
        c.start();
        c.set_sub_state(StepState::Prompt);
        c.advance();
        assert_eq!(c.step_index(), 1);
        assert_eq!(c.sub_state(), &StepState::None);

        c.complete();
        c.advance();
        assert_eq!(c.step_index(), 1);
    }

    #[test]
    fn gate_needs_background_before_foreground() {
        let mut g = EvaluateGate::default();
        assert!(!g.on_background(1));

        g.open();
        assert!(!g.on_foreground());
        assert!(g.is_open());

        assert!(g.on_background(2));
        assert_eq!(g.token(), Some(2));
        assert!(g.on_foreground());
        assert!(!g.is_open());
    }

    #[test]
    fn ad_state_counts_owed_presentations() {
        let mut s = AdStepState::new(2);
        assert!(s.wants_more());
        s.times_shown = 2;
        assert!(!s.wants_more());
    }
}
