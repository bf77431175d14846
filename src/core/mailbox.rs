//! # Runtime mailbox.
//!
//! The runtime actor is the single logical context that owns the scheduler
//! and the flow engine. Everything that completes elsewhere (loads, prompts,
//! presentations, timers, handle calls) comes back as a [`Message`] through
//! this unbounded channel and is applied serially.
//!
//! ```text
//! RuntimeHandle ──┐
//! dispatch(fut) ──┼──► mpsc::UnboundedSender<Message> ──► runtime actor loop
//! post_after() ───┘
//! ```
//!
//! Posting never blocks. A post after the actor stopped is silently dropped.

use std::future::Future;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use crate::core::network::NetworkStatus;
use crate::core::runtime::Snapshot;
use crate::document::FlowConfig;
use crate::error::LoadError;
use crate::flow::{LifecycleEvent, PresentEvent, PromptResponse};
use crate::supply::{CachedItem, ContentHandle};

/// Work item applied by the runtime actor.
pub(crate) enum Message {
    // handle requests
    Launch(Box<FlowConfig>),
    Lifecycle(LifecycleEvent),
    RequestItem(oneshot::Sender<Option<CachedItem>>),
    ClearPool,
    Snapshot(oneshot::Sender<Snapshot>),

    // launch sequence
    NetworkReady {
        doc: Box<FlowConfig>,
        status: NetworkStatus,
    },
    InitLoader,
    InitFinished(Result<(), LoadError>),
    StartFilling,

    // completions carrying a correlation ticket
    LoadFinished {
        ticket: u64,
        result: Result<ContentHandle, LoadError>,
    },
    PromptAnswered {
        ticket: u64,
        response: PromptResponse,
    },
    Presentation {
        ticket: u64,
        event: PresentEvent,
    },
    PollTick {
        ticket: u64,
    },
    FillRetry {
        ticket: u64,
    },
}

/// Cloneable sender side of the runtime mailbox.
#[derive(Clone)]
pub(crate) struct Mailbox {
    tx: mpsc::UnboundedSender<Message>,
}

impl Mailbox {
    /// Creates a mailbox and its receiving end.
    pub(crate) fn channel() -> (Self, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Posts a message. Returns `false` if the actor is gone.
    pub(crate) fn post(&self, msg: Message) -> bool {
        self.tx.send(msg).is_ok()
    }

    /// Posts `msg` after `delay`.
    pub(crate) fn post_after(&self, delay: Duration, msg: Message) {
        let mailbox = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            mailbox.post(msg);
        });
    }

    /// Runs `fut` on its own task and posts the message it resolves to.
    pub(crate) fn dispatch<F>(&self, fut: F)
    where
        F: Future<Output = Message> + Send + 'static,
    {
        let mailbox = self.clone();
        tokio::spawn(async move {
            let msg = fut.await;
            mailbox.post(msg);
        });
    }
}

/// Monotonic correlation ticket source.
#[derive(Debug, Default)]
pub(crate) struct Tickets {
    next: u64,
}

impl Tickets {
    pub(crate) fn issue(&mut self) -> u64 {
        self.next += 1;
        self.next
    }
}
