//! # Runtime actor and handle.
//!
//! The runtime is one tokio task that owns the [`SupplyScheduler`] and the
//! [`FlowEngine`] and drains the mailbox. It is the single logical context
//! of the crate: nothing else mutates scheduler or engine state.
//!
//! ## Launch sequence
//! ```text
//! launch(doc)
//!   ├─ not Idle ───────────────► LaunchIgnored
//!   └─ Idle → Launching
//!        ├─ probe? wait_for_network (bounded) ─► NetworkReady
//!        └─ NetworkReady: Launching → Launched
//!             ├─ analytics.initialize(umKey)
//!             ├─ flow.start(steps)                  (does not wait for the pool)
//!             └─ enabled? ─ after init_delay ─► InitLoader (guarded)
//!                               ├─ Ok  ─ after fill_delay ─► StartFilling
//!                               └─ Err ─► InitFailed (supply stays idle)
//! ```
//!
//! ## Shutdown
//! `RuntimeHandle::shutdown()` cancels the runtime token: the actor stops,
//! the subscriber listener drains its queues and exits. Handle calls made
//! afterwards return [`RuntimeError::Closed`].

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::core::builder::RuntimeBuilder;
use crate::core::config::RuntimeConfig;
use crate::core::mailbox::{Mailbox, Message};
use crate::core::network::{NetworkProbe, NetworkStatus, wait_for_network};
use crate::document::FlowConfig;
use crate::error::{LoadError, RuntimeError};
use crate::events::{Bus, Event, EventKind};
use crate::flow::{FlowEngine, FlowSnapshot, LifecycleEvent};
use crate::subscribers::{AnalyticsSink, SubscriberSet};
use crate::supply::{
    CachedItem, ContentUnitRegistry, ItemSource, Loader, NoSupply, SupplyScheduler, SupplySnapshot,
};

/// Entry point of the crate.
pub struct Runtime;

impl Runtime {
    /// Starts building a runtime.
    pub fn builder(cfg: RuntimeConfig) -> RuntimeBuilder {
        RuntimeBuilder::new(cfg)
    }
}

/// Launch progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LaunchState {
    #[default]
    Idle,
    /// Waiting for the network gate.
    Launching,
    Launched,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InitState {
    Idle,
    Running,
    Ready,
}

/// Point-in-time view of the whole runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub launch: LaunchState,
    /// True once the loader initialized successfully.
    pub loader_ready: bool,
    /// `None` before launch.
    pub supply: Option<SupplySnapshot>,
    pub flow: FlowSnapshot,
}

pub(crate) struct RuntimeActor {
    cfg: RuntimeConfig,
    bus: Bus,
    mailbox: Mailbox,
    loader: Arc<dyn Loader>,
    probe: Option<Arc<dyn NetworkProbe>>,
    analytics: Option<Arc<dyn AnalyticsSink>>,
    launch: LaunchState,
    init: InitState,
    supply: Option<SupplyScheduler>,
    flow: FlowEngine,
}

impl RuntimeActor {
    pub(crate) fn new(
        cfg: RuntimeConfig,
        bus: Bus,
        mailbox: Mailbox,
        loader: Arc<dyn Loader>,
        probe: Option<Arc<dyn NetworkProbe>>,
        analytics: Option<Arc<dyn AnalyticsSink>>,
        flow: FlowEngine,
    ) -> Self {
        Self {
            cfg,
            bus,
            mailbox,
            loader,
            probe,
            analytics,
            launch: LaunchState::Idle,
            init: InitState::Idle,
            supply: None,
            flow,
        }
    }

    /// Drains the mailbox until the token is cancelled.
    pub(crate) async fn run(
        mut self,
        mut rx: mpsc::UnboundedReceiver<Message>,
        token: CancellationToken,
    ) {
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                msg = rx.recv() => match msg {
                    Some(msg) => self.handle(msg),
                    None => break,
                },
            }
        }
        tracing::debug!(target: "adflow", "runtime actor stopped");
    }

    fn handle(&mut self, msg: Message) {
        match msg {
            Message::Launch(doc) => self.on_launch(*doc),
            Message::NetworkReady { doc, status } => self.on_network_ready(*doc, status),
            Message::Lifecycle(ev) => {
                let kind = match ev {
                    LifecycleEvent::EnteredBackground => EventKind::EnteredBackground,
                    LifecycleEvent::EnteredForeground => EventKind::EnteredForeground,
                };
                self.bus.publish(Event::new(kind));
                self.with_flow(|flow, supply| flow.handle_lifecycle_transition(ev, supply));
            }
            Message::RequestItem(reply) => {
                let item: Option<CachedItem> = self.supply.as_mut().and_then(|s| s.request_item());
                let _ = reply.send(item);
            }
            Message::ClearPool => {
                if let Some(supply) = self.supply.as_mut() {
                    supply.clear();
                }
            }
            Message::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
            Message::InitLoader => self.on_init_loader(),
            Message::InitFinished(result) => self.on_init_finished(result),
            Message::StartFilling => {
                if let Some(supply) = self.supply.as_mut() {
                    supply.start_filling();
                }
            }
            Message::LoadFinished { ticket, result } => {
                if let Some(supply) = self.supply.as_mut() {
                    supply.on_load_finished(ticket, result);
                }
            }
            Message::PromptAnswered { ticket, response } => {
                self.with_flow(|flow, supply| flow.on_prompt_answered(ticket, response, supply));
            }
            Message::Presentation { ticket, event } => {
                self.with_flow(|flow, supply| flow.on_presentation_event(ticket, event, supply));
            }
            Message::PollTick { ticket } => {
                self.with_flow(|flow, supply| flow.on_pool_poll(ticket, supply));
            }
            Message::FillRetry { ticket } => {
                if let Some(supply) = self.supply.as_mut() {
                    supply.on_fill_retry(ticket);
                }
            }
        }
    }

    fn on_launch(&mut self, doc: FlowConfig) {
        if self.launch != LaunchState::Idle {
            self.bus.publish(Event::new(EventKind::LaunchIgnored));
            return;
        }
        self.launch = LaunchState::Launching;
        self.bus.publish(
            Event::new(EventKind::LaunchStarted)
                .with_total(doc.steps.len())
                .with_reason(doc.app_id.as_str()),
        );

        match self.probe.clone() {
            Some(probe) => {
                let policy = self.cfg.network_poll;
                let timeout = self.cfg.probe_timeout();
                let bus = self.bus.clone();
                self.mailbox.dispatch(async move {
                    let status = wait_for_network(probe.as_ref(), &policy, timeout, &bus).await;
                    Message::NetworkReady {
                        doc: Box::new(doc),
                        status,
                    }
                });
            }
            None => self.on_network_ready(doc, NetworkStatus::Skipped),
        }
    }

    fn on_network_ready(&mut self, doc: FlowConfig, status: NetworkStatus) {
        if self.launch != LaunchState::Launching {
            return;
        }
        self.launch = LaunchState::Launched;
        tracing::debug!(target: "adflow", ?status, enabled = doc.enabled, "launch continues");

        if let Some(analytics) = &self.analytics {
            analytics.initialize(doc.analytics_key.as_deref());
        }

        let registry = Arc::new(ContentUnitRegistry::from_config(&doc));
        self.supply = Some(SupplyScheduler::new(
            registry,
            Arc::clone(&self.loader),
            self.cfg.load_timeout(),
            self.cfg.fill_retry,
            self.mailbox.clone(),
            self.bus.clone(),
        ));

        let enabled = doc.enabled;
        let steps = doc.steps;
        self.with_flow(|flow, supply| {
            flow.start(steps, supply);
        });

        if enabled {
            self.mailbox.post_after(self.cfg.init_delay, Message::InitLoader);
        } else {
            self.bus.publish(Event::new(EventKind::SupplyDisabled));
        }
    }

    fn on_init_loader(&mut self) {
        if self.init != InitState::Idle {
            return;
        }
        self.init = InitState::Running;
        self.bus.publish(Event::new(EventKind::InitStarted));

        let loader = Arc::clone(&self.loader);
        self.mailbox
            .dispatch(async move { Message::InitFinished(loader.initialize().await) });
    }

    fn on_init_finished(&mut self, result: Result<(), LoadError>) {
        match result {
            Ok(()) => {
                self.init = InitState::Ready;
                self.bus.publish(Event::new(EventKind::InitSucceeded));
                self.mailbox
                    .post_after(self.cfg.fill_delay, Message::StartFilling);
            }
            Err(e) => {
                self.init = InitState::Idle;
                self.bus.publish(
                    Event::new(EventKind::InitFailed)
                        .with_reason(e.to_string())
                        .with_param("error", e.as_label()),
                );
            }
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            launch: self.launch,
            loader_ready: self.init == InitState::Ready,
            supply: self.supply.as_ref().map(SupplyScheduler::snapshot),
            flow: self.flow.snapshot(),
        }
    }

    fn with_flow(&mut self, f: impl FnOnce(&mut FlowEngine, &mut dyn ItemSource)) {
        match self.supply.as_mut() {
            Some(supply) => f(&mut self.flow, supply),
            None => f(&mut self.flow, &mut NoSupply),
        }
    }
}

/// Forwards bus events to the subscriber set until cancelled.
pub(crate) async fn subscriber_listener(
    mut rx: broadcast::Receiver<Event>,
    set: SubscriberSet,
    token: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            ev = rx.recv() => match ev {
                Ok(ev) => set.emit_arc(Arc::new(ev)),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(target: "adflow", skipped, "subscriber listener lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }
    set.shutdown().await;
}

/// Cloneable handle to a running runtime.
#[derive(Clone)]
pub struct RuntimeHandle {
    mailbox: Mailbox,
    bus: Bus,
    token: CancellationToken,
}

impl RuntimeHandle {
    pub(crate) fn new(mailbox: Mailbox, bus: Bus, token: CancellationToken) -> Self {
        Self {
            mailbox,
            bus,
            token,
        }
    }

    /// Launches a decoded document. Only the first launch has an effect.
    pub fn launch(&self, doc: FlowConfig) -> Result<(), RuntimeError> {
        self.send(Message::Launch(Box::new(doc)))
    }

    /// Forwards a host lifecycle transition.
    pub fn lifecycle(&self, event: LifecycleEvent) -> Result<(), RuntimeError> {
        self.send(Message::Lifecycle(event))
    }

    /// Takes the oldest pooled item, if any. Refills below target.
    pub async fn request_item(&self) -> Result<Option<CachedItem>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(Message::RequestItem(tx))?;
        rx.await.map_err(|_| RuntimeError::Closed)
    }

    /// Empties the pool and forgets the in-flight load.
    pub fn clear_pool(&self) -> Result<(), RuntimeError> {
        self.send(Message::ClearPool)
    }

    /// Returns a consistent view of scheduler and engine state.
    pub async fn snapshot(&self) -> Result<Snapshot, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(Message::Snapshot(tx))?;
        rx.await.map_err(|_| RuntimeError::Closed)
    }

    /// Receiver observing every subsequent runtime event.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Stops the runtime actor and the subscriber listener.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    /// True once `shutdown` was called.
    pub fn is_shut_down(&self) -> bool {
        self.token.is_cancelled()
    }

    fn send(&self, msg: Message) -> Result<(), RuntimeError> {
        if self.token.is_cancelled() || !self.mailbox.post(msg) {
            return Err(RuntimeError::Closed);
        }
        Ok(())
    }
}
