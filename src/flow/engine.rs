//! # Flow engine.
//!
//! Sequential state machine over the configured [`FlowStep`]s. The engine runs
//! inside the runtime actor; prompts and presentations run on their own tasks
//! and report back through the mailbox with a correlation ticket.
//!
//! ## Step behaviour
//! ```text
//! Evaluate   prompt(single) ─confirm─► open link, gate open
//!            background (gate open) ─► token stored, result surface shown
//!            foreground (token set)  ─► advance
//! Message    prompt(dialog) ─any button─► advance
//! Ad(n)      loop n times:
//!              request item ─empty─► poll tick (bounded) ─exhausted─► advance
//!                           └─item─► present ─closed/failed─► post-ad prompt
//!                                                              └─► next item or advance
//! Task/Jump/Unknown, Ad(0)  advance immediately
//! ```
//!
//! An Evaluate step whose host never backgrounds stalls the flow there.

use std::sync::Arc;

use futures::StreamExt;
use rand::seq::IndexedRandom;

use crate::core::mailbox::{Mailbox, Message, Tickets};
use crate::events::{Bus, Event, EventKind};
use crate::flow::cursor::{AdPhase, AdStepState, EvaluateGate, FlowCursor, RunState, StepState};
use crate::flow::lifecycle::LifecycleEvent;
use crate::flow::presenter::{PresentEvent, Presenter};
use crate::flow::prompt::{Prompt, PromptKind, PromptResponse, Prompter};
use crate::flow::step::FlowStep;
use crate::policies::PollPolicy;
use crate::supply::{CachedItem, ContentType, ItemSource};

/// Point-in-time view of the flow engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowSnapshot {
    pub step_index: usize,
    pub run_state: RunState,
    pub step_count: usize,
    /// Sub-state of the current step.
    pub current: StepState,
}

struct PendingPrompt {
    ticket: u64,
    prompt: Prompt,
}

pub(crate) struct FlowEngine {
    steps: Vec<FlowStep>,
    cursor: FlowCursor,
    prompter: Arc<dyn Prompter>,
    presenter: Arc<dyn Presenter>,
    mailbox: Mailbox,
    bus: Bus,
    ad_poll: PollPolicy,
    tickets: Tickets,
    pending_prompt: Option<PendingPrompt>,
    presenting: Option<ContentType>,
}

impl FlowEngine {
    pub(crate) fn new(
        prompter: Arc<dyn Prompter>,
        presenter: Arc<dyn Presenter>,
        ad_poll: PollPolicy,
        mailbox: Mailbox,
        bus: Bus,
    ) -> Self {
        Self {
            steps: Vec::new(),
            cursor: FlowCursor::default(),
            prompter,
            presenter,
            mailbox,
            bus,
            ad_poll,
            tickets: Tickets::default(),
            pending_prompt: None,
            presenting: None,
        }
    }

    /// Starts the flow at step 0. Returns `false` if it already ran.
    pub(crate) fn start(&mut self, steps: Vec<FlowStep>, supply: &mut dyn ItemSource) -> bool {
        if !self.cursor.start() {
            self.bus.publish(Event::new(EventKind::FlowStartIgnored));
            return false;
        }
        self.steps = steps;
        self.bus
            .publish(Event::new(EventKind::FlowStarted).with_total(self.steps.len()));
        self.execute_current(supply);
        true
    }

    /// Applies the answer to the prompt currently shown.
    pub(crate) fn handle_user_response(
        &mut self,
        response: PromptResponse,
        supply: &mut dyn ItemSource,
    ) {
        let Some(pending) = self.pending_prompt.take() else {
            return;
        };
        let step = self.cursor.step_index();
        let prompt = &pending.prompt;
        self.bus.publish(
            Event::new(EventKind::PromptAnswered)
                .with_step(step)
                .with_param("title", prompt.title.as_str())
                .with_param("message", prompt.message.as_str())
                .with_param("button", prompt.button_label(response))
                .with_param("choice", response.as_label())
                .with_param("prompt", prompt.kind.as_label()),
        );

        match *self.cursor.sub_state() {
            StepState::Evaluate(_) => self.open_evaluate_gate(step),
            StepState::Prompt => self.advance(supply),
            StepState::Ad(state) if state.phase == AdPhase::Prompting => {
                self.after_post_ad(supply)
            }
            _ => {}
        }
    }

    /// Reacts to a host lifecycle transition. Only an open Evaluate gate
    /// cares; every other state ignores it.
    pub(crate) fn handle_lifecycle_transition(
        &mut self,
        event: LifecycleEvent,
        supply: &mut dyn ItemSource,
    ) {
        let step = self.cursor.step_index();
        match event {
            LifecycleEvent::EnteredBackground => {
                let token = self.tickets.issue();
                let Some(gate) = self.gate_mut() else {
                    return;
                };
                if !gate.on_background(token) {
                    return;
                }
                if let Some(FlowStep::Evaluate(e)) = self.steps.get(step)
                    && let Some(result) = e.result_surface()
                {
                    self.prompter.show_result(&result);
                    self.bus.publish(
                        Event::new(EventKind::EvaluateResultShown)
                            .with_step(step)
                            .with_param("result", result.result.to_string())
                            .with_param("image", result.image.as_str()),
                    );
                }
            }
            LifecycleEvent::EnteredForeground => {
                if self.gate_mut().is_some_and(|g| g.on_foreground()) {
                    self.advance(supply);
                }
            }
        }
    }

    /// Prompt completion from the mailbox; stale tickets are ignored.
    pub(crate) fn on_prompt_answered(
        &mut self,
        ticket: u64,
        response: PromptResponse,
        supply: &mut dyn ItemSource,
    ) {
        if self.pending_prompt.as_ref().is_some_and(|p| p.ticket == ticket) {
            self.handle_user_response(response, supply);
        }
    }

    /// Presentation event from the mailbox; stale tickets are ignored.
    pub(crate) fn on_presentation_event(
        &mut self,
        ticket: u64,
        event: PresentEvent,
        supply: &mut dyn ItemSource,
    ) {
        let step = self.cursor.step_index();
        match self.ad_state_mut() {
            Some(s) if s.phase == AdPhase::Presenting && s.pending == Some(ticket) => {}
            _ => return,
        }

        let kind = match &event {
            PresentEvent::Shown => EventKind::AdShown,
            PresentEvent::Clicked => EventKind::AdClicked,
            PresentEvent::Closed => EventKind::AdClosed,
            PresentEvent::Failed(_) => EventKind::AdFailed,
        };
        let mut ev = Event::new(kind).with_step(step);
        if let Some(content) = self.presenting {
            ev = ev.with_content(content);
        }
        if let PresentEvent::Failed(reason) = &event {
            ev = ev.with_reason(reason.as_str());
        }
        self.bus.publish(ev);

        if !event.is_terminal() {
            return;
        }
        self.presenting = None;
        if let Some(s) = self.ad_state_mut() {
            s.pending = None;
        }
        self.show_post_ad_prompt(supply);
    }

    /// Pool poll tick from the mailbox; stale tickets are ignored.
    pub(crate) fn on_pool_poll(&mut self, ticket: u64, supply: &mut dyn ItemSource) {
        match self.ad_state_mut() {
            Some(s) if s.phase == AdPhase::Waiting && s.pending == Some(ticket) => {
                s.pending = None;
            }
            _ => return,
        }
        self.try_present(supply);
    }

    pub(crate) fn snapshot(&self) -> FlowSnapshot {
        FlowSnapshot {
            step_index: self.cursor.step_index(),
            run_state: self.cursor.run_state(),
            step_count: self.steps.len(),
            current: *self.cursor.sub_state(),
        }
    }

    fn execute_current(&mut self, supply: &mut dyn ItemSource) {
        loop {
            let idx = self.cursor.step_index();
            let Some(step) = self.steps.get(idx).cloned() else {
                self.cursor.complete();
                self.bus
                    .publish(Event::new(EventKind::FlowCompleted).with_total(self.steps.len()));
                return;
            };
            self.bus.publish(
                Event::new(EventKind::StepStarted)
                    .with_step(idx)
                    .with_reason(step.as_label()),
            );

            match step {
                FlowStep::Evaluate(e) => {
                    self.cursor
                        .set_sub_state(StepState::Evaluate(EvaluateGate::default()));
                    self.show_prompt(Prompt::single(
                        PromptKind::Evaluate,
                        &e.message,
                        &e.button_label,
                    ));
                    return;
                }
                FlowStep::Message(text) => {
                    self.cursor.set_sub_state(StepState::Prompt);
                    self.show_prompt(Prompt::dialog(PromptKind::Message, &text));
                    return;
                }
                FlowStep::Ad(ad) if ad.repeat_count > 0 => {
                    self.cursor
                        .set_sub_state(StepState::Ad(AdStepState::new(ad.repeat_count)));
                    self.request_next_ad(supply);
                    return;
                }
                other => {
                    self.bus.publish(
                        Event::new(EventKind::StepSkipped)
                            .with_step(idx)
                            .with_reason(other.as_label()),
                    );
                    self.finish_step();
                }
            }
        }
    }

    fn finish_step(&mut self) {
        self.bus.publish(
            Event::new(EventKind::StepCompleted)
                .with_step(self.cursor.step_index())
                .with_param("step", self.cursor.step_index().to_string()),
        );
        self.pending_prompt = None;
        self.presenting = None;
        self.cursor.advance();
    }

    fn advance(&mut self, supply: &mut dyn ItemSource) {
        self.finish_step();
        self.execute_current(supply);
    }

    fn show_prompt(&mut self, prompt: Prompt) {
        let ticket = self.tickets.issue();
        self.bus.publish(
            Event::new(EventKind::PromptShown)
                .with_step(self.cursor.step_index())
                .with_param("title", prompt.title.as_str())
                .with_param("message", prompt.message.as_str())
                .with_param("prompt", prompt.kind.as_label()),
        );

        let prompter = Arc::clone(&self.prompter);
        let request = prompt.clone();
        self.mailbox.dispatch(async move {
            let response = prompter.prompt(request).await;
            Message::PromptAnswered { ticket, response }
        });
        self.pending_prompt = Some(PendingPrompt { ticket, prompt });
    }

    fn open_evaluate_gate(&mut self, step: usize) {
        if let Some(gate) = self.gate_mut() {
            gate.open();
        }
        if let Some(FlowStep::Evaluate(e)) = self.steps.get(step) {
            self.prompter.open_link(&e.url);
            self.bus.publish(
                Event::new(EventKind::LinkOpened)
                    .with_step(step)
                    .with_reason(e.url.as_str()),
            );
        }
        self.bus
            .publish(Event::new(EventKind::EvaluateGateOpened).with_step(step));
    }

    fn request_next_ad(&mut self, supply: &mut dyn ItemSource) {
        let step = self.cursor.step_index();
        let Some(state) = self.ad_state_mut() else {
            return;
        };
        state.times_shown += 1;
        state.poll_checks = 0;
        let (shown, required) = (state.times_shown, state.times_required);
        self.bus.publish(
            Event::new(EventKind::AdRequested)
                .with_step(step)
                .with_count(shown as usize)
                .with_total(required as usize),
        );
        self.try_present(supply);
    }

    fn try_present(&mut self, supply: &mut dyn ItemSource) {
        match supply.request_item() {
            Some(item) => self.present(item),
            None => self.wait_for_item(supply),
        }
    }

    fn wait_for_item(&mut self, supply: &mut dyn ItemSource) {
        let step = self.cursor.step_index();
        let policy = self.ad_poll;
        let ticket = self.tickets.issue();
        let Some(state) = self.ad_state_mut() else {
            return;
        };

        if policy.exhausted(state.poll_checks) {
            let (shown, required) = (state.times_shown, state.times_required);
            self.bus.publish(
                Event::new(EventKind::AdWaitExhausted)
                    .with_step(step)
                    .with_count(shown as usize)
                    .with_total(required as usize),
            );
            self.advance(supply);
            return;
        }

        let delay = policy.delay(state.poll_checks);
        state.poll_checks += 1;
        state.phase = AdPhase::Waiting;
        state.pending = Some(ticket);
        let check = state.poll_checks;
        self.bus.publish(
            Event::new(EventKind::AdWaiting)
                .with_step(step)
                .with_count(check as usize)
                .with_delay(delay),
        );
        self.mailbox.post_after(delay, Message::PollTick { ticket });
    }

    fn present(&mut self, item: CachedItem) {
        let ticket = self.tickets.issue();
        if let Some(state) = self.ad_state_mut() {
            state.phase = AdPhase::Presenting;
            state.pending = Some(ticket);
        }
        self.presenting = Some(item.kind());

        let mut stream = self.presenter.present(item);
        let mailbox = self.mailbox.clone();
        tokio::spawn(async move {
            while let Some(event) = stream.next().await {
                let terminal = event.is_terminal();
                if !mailbox.post(Message::Presentation { ticket, event }) || terminal {
                    return;
                }
            }
            mailbox.post(Message::Presentation {
                ticket,
                event: PresentEvent::Failed("presentation ended without close".to_string()),
            });
        });
    }

    fn show_post_ad_prompt(&mut self, supply: &mut dyn ItemSource) {
        let text = match self.steps.get(self.cursor.step_index()) {
            Some(FlowStep::Ad(ad)) => ad.post_ad_prompts.choose(&mut rand::rng()).cloned(),
            _ => None,
        };
        match text {
            Some(text) => {
                if let Some(state) = self.ad_state_mut() {
                    state.phase = AdPhase::Prompting;
                }
                self.show_prompt(Prompt::dialog(PromptKind::PostAd, &text));
            }
            None => self.after_post_ad(supply),
        }
    }

    fn after_post_ad(&mut self, supply: &mut dyn ItemSource) {
        match self.ad_state_mut().map(|s| s.wants_more()) {
            Some(true) => self.request_next_ad(supply),
            Some(false) => self.advance(supply),
            None => {}
        }
    }

    fn ad_state_mut(&mut self) -> Option<&mut AdStepState> {
        match self.cursor.sub_state_mut() {
            StepState::Ad(state) => Some(state),
            _ => None,
        }
    }

    fn gate_mut(&mut self) -> Option<&mut EvaluateGate> {
        match self.cursor.sub_state_mut() {
            StepState::Evaluate(gate) => Some(gate),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::step::{AdStep, DialogText, EvaluateResult, EvaluateStep};
    use crate::supply::{ContentHandle, SourceUnit};
    use async_trait::async_trait;
    use futures::stream::{self, BoxStream};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio::time;

    #[derive(Default)]
    struct Shelf {
        items: VecDeque<CachedItem>,
        requests: usize,
    }

    impl Shelf {
        fn with(n: usize) -> Self {
            let items = (0..n)
                .map(|i| {
                    CachedItem::new(
                        SourceUnit::new(ContentType::Reward, format!("r{i}")),
                        ContentHandle::new(i),
                    )
                })
                .collect();
            Self { items, requests: 0 }
        }
    }

    impl ItemSource for Shelf {
        fn request_item(&mut self) -> Option<CachedItem> {
            self.requests += 1;
            self.items.pop_front()
        }
    }

    struct Host {
        answer: PromptResponse,
        prompts: Mutex<Vec<Prompt>>,
        links: Mutex<Vec<String>>,
        results: Mutex<Vec<EvaluateResult>>,
    }

    impl Host {
        fn answering(answer: PromptResponse) -> Arc<Self> {
            Arc::new(Self {
                answer,
                prompts: Mutex::default(),
                links: Mutex::default(),
                results: Mutex::default(),
            })
        }

        fn prompt_kinds(&self) -> Vec<PromptKind> {
            self.prompts.lock().unwrap().iter().map(|p| p.kind).collect()
        }
    }

    #[async_trait]
    impl Prompter for Host {
        async fn prompt(&self, prompt: Prompt) -> PromptResponse {
            self.prompts.lock().unwrap().push(prompt);
            self.answer
        }

        fn open_link(&self, url: &str) {
            self.links.lock().unwrap().push(url.to_string());
        }

        fn show_result(&self, result: &EvaluateResult) {
            self.results.lock().unwrap().push(result.clone());
        }
    }

    struct Screen {
        script: Vec<PresentEvent>,
        calls: Mutex<usize>,
    }

    impl Screen {
        fn emitting(script: Vec<PresentEvent>) -> Arc<Self> {
            Arc::new(Self {
                script,
                calls: Mutex::new(0),
            })
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    impl Presenter for Screen {
        fn present(&self, _item: CachedItem) -> BoxStream<'static, PresentEvent> {
            *self.calls.lock().unwrap() += 1;
            stream::iter(self.script.clone()).boxed()
        }
    }

    fn engine(
        host: Arc<Host>,
        screen: Arc<Screen>,
        ad_poll: PollPolicy,
    ) -> (FlowEngine, UnboundedReceiver<Message>, Bus) {
        let (mailbox, rx) = Mailbox::channel();
        let bus = Bus::new(512);
        (
            FlowEngine::new(host, screen, ad_poll, mailbox, bus.clone()),
            rx,
            bus,
        )
    }

    /// Applies flow completions until nothing arrives for a second.
    async fn drive(e: &mut FlowEngine, rx: &mut UnboundedReceiver<Message>, supply: &mut dyn ItemSource) {
        while let Ok(Some(msg)) = time::timeout(Duration::from_secs(1), rx.recv()).await {
            match msg {
                Message::PromptAnswered { ticket, response } => {
                    e.on_prompt_answered(ticket, response, supply)
                }
                Message::Presentation { ticket, event } => {
                    e.on_presentation_event(ticket, event, supply)
                }
                Message::PollTick { ticket } => e.on_pool_poll(ticket, supply),
                _ => {}
            }
        }
    }

    fn dialog(title: &str) -> DialogText {
        DialogText {
            title: title.into(),
            message: "m".into(),
            cancel_label: "no".into(),
            confirm_label: "yes".into(),
        }
    }

    fn evaluate(image: Option<&str>) -> FlowStep {
        FlowStep::Evaluate(EvaluateStep {
            url: "https://example.invalid/rate".into(),
            message: "rate us".into(),
            button_label: "ok".into(),
            result: 5,
            image: image.map(str::to_string),
            link: None,
        })
    }

    fn closes() -> Vec<PresentEvent> {
        vec![PresentEvent::Shown, PresentEvent::Closed]
    }

    #[tokio::test(start_paused = true)]
    async fn message_then_two_ads_completes() {
        let host = Host::answering(PromptResponse::Confirm);
        let screen = Screen::emitting(closes());
        let (mut e, mut rx, _bus) = engine(Arc::clone(&host), Arc::clone(&screen), PollPolicy::default());
        let mut shelf = Shelf::with(2);

        let steps = vec![
            FlowStep::Message(dialog("hello")),
            FlowStep::Ad(AdStep {
                repeat_count: 2,
                post_ad_prompts: vec![dialog("again?")],
            }),
        ];
        assert!(e.start(steps, &mut shelf));
        assert_eq!(e.cursor.step_index(), 0);

        drive(&mut e, &mut rx, &mut shelf).await;

        assert_eq!(e.cursor.step_index(), 2);
        assert_eq!(e.cursor.run_state(), RunState::Completed);
        assert_eq!(screen.calls(), 2);
        assert_eq!(
            host.prompt_kinds(),
            vec![PromptKind::Message, PromptKind::PostAd, PromptKind::PostAd]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn message_advances_on_either_button() {
        for answer in [PromptResponse::Cancel, PromptResponse::Confirm] {
            let host = Host::answering(answer);
            let (mut e, mut rx, _bus) = engine(host, Screen::emitting(closes()), PollPolicy::default());
            let mut shelf = Shelf::default();

            e.start(vec![FlowStep::Message(dialog("a")), FlowStep::Task], &mut shelf);
            drive(&mut e, &mut rx, &mut shelf).await;

            assert_eq!(e.cursor.step_index(), 2);
            assert_eq!(e.cursor.run_state(), RunState::Completed);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn foreground_without_background_does_not_advance_evaluate() {
        let host = Host::answering(PromptResponse::Confirm);
        let (mut e, mut rx, _bus) = engine(Arc::clone(&host), Screen::emitting(closes()), PollPolicy::default());
        let mut shelf = Shelf::default();

        e.start(vec![evaluate(None)], &mut shelf);
        drive(&mut e, &mut rx, &mut shelf).await;
        assert_eq!(host.links.lock().unwrap().len(), 1);

        e.handle_lifecycle_transition(LifecycleEvent::EnteredForeground, &mut shelf);
        assert_eq!(e.cursor.step_index(), 0);
        assert!(matches!(e.cursor.sub_state(), StepState::Evaluate(g) if g.is_open()));

        e.handle_lifecycle_transition(LifecycleEvent::EnteredBackground, &mut shelf);
        assert_eq!(e.cursor.step_index(), 0);
        e.handle_lifecycle_transition(LifecycleEvent::EnteredForeground, &mut shelf);

        assert_eq!(e.cursor.step_index(), 1);
        assert_eq!(e.cursor.run_state(), RunState::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn lifecycle_before_confirm_is_ignored() {
        let host = Host::answering(PromptResponse::Confirm);
        let (mut e, _rx, _bus) = engine(host, Screen::emitting(closes()), PollPolicy::default());
        let mut shelf = Shelf::default();

        e.start(vec![evaluate(None)], &mut shelf);
        e.handle_lifecycle_transition(LifecycleEvent::EnteredBackground, &mut shelf);
        e.handle_lifecycle_transition(LifecycleEvent::EnteredForeground, &mut shelf);

        assert_eq!(e.cursor.step_index(), 0);
        assert_eq!(e.cursor.run_state(), RunState::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn background_surfaces_the_evaluate_result() {
        let host = Host::answering(PromptResponse::Confirm);
        let (mut e, mut rx, bus) = engine(Arc::clone(&host), Screen::emitting(closes()), PollPolicy::default());
        let mut events = bus.subscribe();
        let mut shelf = Shelf::default();

        e.start(vec![evaluate(Some("thanks.png"))], &mut shelf);
        drive(&mut e, &mut rx, &mut shelf).await;
        e.handle_lifecycle_transition(LifecycleEvent::EnteredBackground, &mut shelf);

        let results = host.results.lock().unwrap().clone();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].image, "thanks.png");
        assert_eq!(results[0].result, 5);

        let shown = std::iter::from_fn(|| events.try_recv().ok())
            .find(|ev| ev.kind == EventKind::EvaluateResultShown)
            .expect("result event");
        assert_eq!(shown.param("result"), Some("5"));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_presentations_still_count() {
        let host = Host::answering(PromptResponse::Cancel);
        let screen = Screen::emitting(vec![PresentEvent::Failed("render".into())]);
        let (mut e, mut rx, _bus) = engine(host, Arc::clone(&screen), PollPolicy::default());
        let mut shelf = Shelf::with(3);

        e.start(
            vec![FlowStep::Ad(AdStep {
                repeat_count: 3,
                post_ad_prompts: vec![dialog("x")],
            })],
            &mut shelf,
        );
        drive(&mut e, &mut rx, &mut shelf).await;

        assert_eq!(screen.calls(), 3);
        assert_eq!(e.cursor.run_state(), RunState::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn stream_ending_without_close_counts_as_failure() {
        let host = Host::answering(PromptResponse::Confirm);
        let screen = Screen::emitting(vec![PresentEvent::Shown]);
        let (mut e, mut rx, bus) = engine(host, Arc::clone(&screen), PollPolicy::default());
        let mut events = bus.subscribe();
        let mut shelf = Shelf::with(1);

        e.start(
            vec![FlowStep::Ad(AdStep {
                repeat_count: 1,
                post_ad_prompts: vec![],
            })],
            &mut shelf,
        );
        drive(&mut e, &mut rx, &mut shelf).await;

        assert_eq!(e.cursor.run_state(), RunState::Completed);
        assert!(std::iter::from_fn(|| events.try_recv().ok()).any(|ev| ev.kind == EventKind::AdFailed));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_pool_abandons_the_ad_step_after_the_poll_budget() {
        let host = Host::answering(PromptResponse::Confirm);
        let screen = Screen::emitting(closes());
        let poll = PollPolicy::constant(Duration::from_millis(500), 3);
        let (mut e, mut rx, bus) = engine(host, Arc::clone(&screen), poll);
        let mut events = bus.subscribe();
        let mut shelf = Shelf::default();

        e.start(
            vec![
                FlowStep::Ad(AdStep {
                    repeat_count: 2,
                    post_ad_prompts: vec![],
                }),
                FlowStep::Task,
            ],
            &mut shelf,
        );
        drive(&mut e, &mut rx, &mut shelf).await;

        assert_eq!(screen.calls(), 0);
        assert_eq!(shelf.requests, 4);
        assert_eq!(e.cursor.step_index(), 2);
        assert_eq!(e.cursor.run_state(), RunState::Completed);
        let kinds: Vec<_> = std::iter::from_fn(|| events.try_recv().ok()).map(|ev| ev.kind).collect();
        assert_eq!(kinds.iter().filter(|k| **k == EventKind::AdWaiting).count(), 3);
        assert!(kinds.contains(&EventKind::AdWaitExhausted));
    }

    #[tokio::test(start_paused = true)]
    async fn placeholders_and_zero_repeat_ads_are_skipped() {
        let host = Host::answering(PromptResponse::Confirm);
        let screen = Screen::emitting(closes());
        let (mut e, _rx, _bus) = engine(Arc::clone(&host), Arc::clone(&screen), PollPolicy::default());
        let mut shelf = Shelf::with(1);

        e.start(
            vec![
                FlowStep::Task,
                FlowStep::Unknown("Q".into()),
                FlowStep::Ad(AdStep {
                    repeat_count: 0,
                    post_ad_prompts: vec![],
                }),
            ],
            &mut shelf,
        );

        assert_eq!(e.cursor.step_index(), 3);
        assert_eq!(e.cursor.run_state(), RunState::Completed);
        assert_eq!(screen.calls(), 0);
        assert_eq!(shelf.requests, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_is_ignored() {
        let host = Host::answering(PromptResponse::Confirm);
        let (mut e, _rx, _bus) = engine(host, Screen::emitting(closes()), PollPolicy::default());
        let mut shelf = Shelf::default();

        assert!(e.start(vec![FlowStep::Message(dialog("a"))], &mut shelf));
        assert!(!e.start(vec![FlowStep::Task], &mut shelf));
        assert_eq!(e.snapshot().step_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_prompt_answer_is_ignored() {
        let host = Host::answering(PromptResponse::Confirm);
        let (mut e, _rx, _bus) = engine(host, Screen::emitting(closes()), PollPolicy::default());
        let mut shelf = Shelf::default();

        e.start(vec![FlowStep::Message(dialog("a"))], &mut shelf);
        e.on_prompt_answered(9_999, PromptResponse::Confirm, &mut shelf);

        assert_eq!(e.cursor.step_index(), 0);
    }
}
