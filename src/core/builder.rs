use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::{self, BoxStream};
use tokio_util::sync::CancellationToken;

use super::config::RuntimeConfig;
use super::mailbox::Mailbox;
use super::network::NetworkProbe;
use super::runtime::{RuntimeActor, RuntimeHandle, subscriber_listener};
use crate::error::LoadError;
use crate::events::Bus;
use crate::flow::{FlowEngine, PresentEvent, Presenter, Prompt, PromptResponse, Prompter};
use crate::subscribers::{AnalyticsBridge, AnalyticsSink, Subscribe, SubscriberSet};
use crate::supply::{CachedItem, ContentHandle, Loader, SourceUnit};

/// Builder for a runtime with its host capabilities.
///
/// Capabilities left unset fall back to inert defaults: loads fail with
/// [`LoadError::NotInitialized`], presentations fail immediately, prompts
/// resolve to confirm and links are not opened.
pub struct RuntimeBuilder {
    cfg: RuntimeConfig,
    loader: Option<Arc<dyn Loader>>,
    presenter: Option<Arc<dyn Presenter>>,
    prompter: Option<Arc<dyn Prompter>>,
    probe: Option<Arc<dyn NetworkProbe>>,
    analytics: Option<Arc<dyn AnalyticsSink>>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl RuntimeBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: RuntimeConfig) -> Self {
        Self {
            cfg,
            loader: None,
            presenter: None,
            prompter: None,
            probe: None,
            analytics: None,
            subscribers: Vec::new(),
        }
    }

    /// Sets the content loader.
    pub fn with_loader(mut self, loader: Arc<dyn Loader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Sets the content presenter.
    pub fn with_presenter(mut self, presenter: Arc<dyn Presenter>) -> Self {
        self.presenter = Some(presenter);
        self
    }

    /// Sets the prompt surface.
    pub fn with_prompter(mut self, prompter: Arc<dyn Prompter>) -> Self {
        self.prompter = Some(prompter);
        self
    }

    /// Enables the bounded network wait before launch.
    pub fn with_network_probe(mut self, probe: Arc<dyn NetworkProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Forwards events to `sink` through an [`AnalyticsBridge`] and
    /// initializes it with the document's analytics key on launch.
    pub fn with_analytics(mut self, sink: Arc<dyn AnalyticsSink>) -> Self {
        self.subscribers
            .push(Arc::new(AnalyticsBridge::new(Arc::clone(&sink))));
        self.analytics = Some(sink);
        self
    }

    /// Adds event subscribers.
    ///
    /// Subscribers receive runtime events through dedicated workers with
    /// bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers.extend(subscribers);
        self
    }

    /// Spawns the runtime actor and the subscriber listener.
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> RuntimeHandle {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let token = CancellationToken::new();
        let (mailbox, rx) = Mailbox::channel();

        if !self.subscribers.is_empty() {
            let set = SubscriberSet::new(self.subscribers, bus.clone());
            tokio::spawn(subscriber_listener(bus.subscribe(), set, token.clone()));
        }

        let flow = FlowEngine::new(
            self.prompter.unwrap_or_else(|| Arc::new(Inert)),
            self.presenter.unwrap_or_else(|| Arc::new(Inert)),
            self.cfg.ad_poll,
            mailbox.clone(),
            bus.clone(),
        );
        let actor = RuntimeActor::new(
            self.cfg,
            bus.clone(),
            mailbox.clone(),
            self.loader.unwrap_or_else(|| Arc::new(Inert)),
            self.probe,
            self.analytics,
            flow,
        );
        tokio::spawn(actor.run(rx, token.clone()));

        RuntimeHandle::new(mailbox, bus, token)
    }
}

/// Stand-in for capabilities the host did not provide.
struct Inert;

#[async_trait]
impl Loader for Inert {
    async fn initialize(&self) -> Result<(), LoadError> {
        Err(LoadError::NotInitialized)
    }

    async fn load(&self, _unit: SourceUnit) -> Result<ContentHandle, LoadError> {
        Err(LoadError::NotInitialized)
    }
}

impl Presenter for Inert {
    fn present(&self, _item: CachedItem) -> BoxStream<'static, PresentEvent> {
        stream::once(async { PresentEvent::Failed("no presenter configured".to_string()) }).boxed()
    }
}

#[async_trait]
impl Prompter for Inert {
    async fn prompt(&self, _prompt: Prompt) -> PromptResponse {
        PromptResponse::Confirm
    }

    fn open_link(&self, url: &str) {
        tracing::debug!(target: "adflow", url, "no prompter configured; link not opened");
    }
}
