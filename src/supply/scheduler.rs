//! # Supply scheduler.
//!
//! Keeps the pool topped up to its target size by walking the per-type source
//! lists with the round-robin cursor. Strictly serial: at most one load is in
//! flight, and its completion comes back through the runtime mailbox as
//! `Message::LoadFinished { ticket, .. }`.
//!
//! ## Fill loop
//! ```text
//! pump():
//!   load in flight         → wait for it
//!   retry pause pending    → wait for FillRetry
//!   pool full              → stop (PoolFull)
//!   no source at all       → stop (FillStalled)
//!   index out of bounds    → switch type, retry
//!   otherwise              → issue load(kind, sources[kind][index])
//!
//! on_load_finished(ticket, result):
//!   ticket != in-flight    → discard (StaleLoadDiscarded)
//!   Ok                     → push to pool, cursor.on_success, pump()
//!   Err                    → cursor.on_failure, pump()
//!                            └─ every source failed in a row → back_off()
//!
//! back_off():
//!   pauses left            → FillBackoff, post FillRetry after fill_retry.delay(n)
//!   pauses spent           → stop (FillStalled)
//! ```
//!
//! ## Rules
//! - `pool.len() <= target_size` at every observation point.
//! - `clear()` forgets the in-flight ticket, so a late completion is a no-op.
//! - `request_item()` re-arms filling only after the first `start_filling()`,
//!   including after a stall.
//! - A successful load resets the failure streak and the pause count.

use std::sync::Arc;
use std::time::Duration;

use crate::core::mailbox::{Mailbox, Message, Tickets};
use crate::core::runner::run_load;
use crate::error::LoadError;
use crate::events::{Bus, Event, EventKind};
use crate::policies::PollPolicy;
use crate::supply::content::{CachedItem, ContentHandle, ContentType, SourceUnit};
use crate::supply::cursor::{CursorMove, SchedulerCursor};
use crate::supply::loader::Loader;
use crate::supply::pool::Pool;
use crate::supply::registry::ContentUnitRegistry;

/// Something the flow engine can draw pooled items from.
pub(crate) trait ItemSource {
    /// Removes and returns the oldest pooled item.
    fn request_item(&mut self) -> Option<CachedItem>;
}

/// Placeholder source used before any document was launched.
pub(crate) struct NoSupply;

impl ItemSource for NoSupply {
    fn request_item(&mut self) -> Option<CachedItem> {
        None
    }
}

struct InFlight {
    ticket: u64,
    unit: SourceUnit,
}

/// Point-in-time view of the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplySnapshot {
    /// Cursor type.
    pub kind: ContentType,
    /// Cursor index within the type's list.
    pub index: usize,
    /// Consecutive failures of the cursor type.
    pub failures: usize,
    /// Pooled units, oldest first.
    pub pool: Vec<SourceUnit>,
    pub target_size: usize,
    /// True while the fill loop is running.
    pub filling: bool,
    /// True while a pause between failed cycles is pending.
    pub backing_off: bool,
    /// Unit currently being loaded.
    pub loading: Option<SourceUnit>,
}

pub(crate) struct SupplyScheduler {
    registry: Arc<ContentUnitRegistry>,
    pool: Pool,
    cursor: SchedulerCursor,
    loader: Arc<dyn Loader>,
    load_timeout: Option<Duration>,
    fill_retry: PollPolicy,
    mailbox: Mailbox,
    bus: Bus,
    tickets: Tickets,
    in_flight: Option<InFlight>,
    filling: bool,
    armed: bool,
    // consecutive failed loads, across types
    failed_streak: usize,
    retry_round: u32,
    retry: Option<u64>,
}

impl SupplyScheduler {
    pub(crate) fn new(
        registry: Arc<ContentUnitRegistry>,
        loader: Arc<dyn Loader>,
        load_timeout: Option<Duration>,
        fill_retry: PollPolicy,
        mailbox: Mailbox,
        bus: Bus,
    ) -> Self {
        let pool = Pool::new(registry.target_size());
        Self {
            registry,
            pool,
            cursor: SchedulerCursor::new(),
            loader,
            load_timeout,
            fill_retry,
            mailbox,
            bus,
            tickets: Tickets::default(),
            in_flight: None,
            filling: false,
            armed: false,
            failed_streak: 0,
            retry_round: 0,
            retry: None,
        }
    }

    /// Resets the cursor and starts filling until the pool is full.
    ///
    /// A load still in flight from an earlier fill is forgotten; its
    /// completion will be discarded. A pending retry pause is dropped.
    pub(crate) fn start_filling(&mut self) {
        self.in_flight = None;
        self.reset_retry();
        self.cursor.reset();
        self.filling = true;
        self.armed = true;
        self.bus.publish(
            Event::new(EventKind::FillStarted)
                .with_pool_len(self.pool.len())
                .with_total(self.pool.capacity()),
        );
        self.pump();
    }

    /// Empties the pool and drops in-flight bookkeeping.
    pub(crate) fn clear(&mut self) {
        self.pool.clear();
        self.in_flight = None;
        self.reset_retry();
        self.filling = false;
        self.bus
            .publish(Event::new(EventKind::PoolCleared).with_pool_len(0));
    }

    /// Applies a load completion.
    pub(crate) fn on_load_finished(
        &mut self,
        ticket: u64,
        result: Result<ContentHandle, LoadError>,
    ) {
        let Some(flight) = self.in_flight.take_if(|f| f.ticket == ticket) else {
            let mut ev = Event::new(EventKind::StaleLoadDiscarded).with_count(ticket as usize);
            if let Err(e) = &result {
                ev = ev.with_reason(e.to_string());
            }
            self.bus.publish(ev);
            return;
        };

        let unit = flight.unit;
        let len = self.registry.len(unit.kind);
        match result {
            Ok(handle) => {
                if self.pool.push(CachedItem::new(unit.clone(), handle)).is_ok() {
                    self.bus.publish(
                        Event::new(EventKind::LoadSucceeded)
                            .with_content(unit.kind)
                            .with_source(Arc::clone(&unit.source_id))
                            .with_pool_len(self.pool.len()),
                    );
                }
                self.failed_streak = 0;
                self.retry_round = 0;
                let mv = self.cursor.on_success(len);
                self.publish_move(mv);
            }
            Err(e) => {
                self.bus.publish(
                    Event::new(EventKind::LoadFailed)
                        .with_content(unit.kind)
                        .with_source(Arc::clone(&unit.source_id))
                        .with_count(self.cursor.failures() + 1)
                        .with_reason(e.to_string()),
                );
                let mv = self.cursor.on_failure(len);
                self.publish_move(mv);

                self.failed_streak += 1;
                if self.filling && self.failed_streak >= self.registry.total() {
                    self.failed_streak = 0;
                    self.back_off();
                    return;
                }
            }
        }

        if self.filling {
            self.pump();
        }
    }

    /// Ends a retry pause. Tickets of dropped pauses are ignored.
    pub(crate) fn on_fill_retry(&mut self, ticket: u64) {
        if self.retry.take_if(|t| *t == ticket).is_none() {
            return;
        }
        if self.filling {
            self.pump();
        }
    }

    pub(crate) fn snapshot(&self) -> SupplySnapshot {
        SupplySnapshot {
            kind: self.cursor.kind(),
            index: self.cursor.index(),
            failures: self.cursor.failures(),
            pool: self.pool.iter().map(|i| i.unit.clone()).collect(),
            target_size: self.pool.capacity(),
            filling: self.filling,
            backing_off: self.retry.is_some(),
            loading: self.in_flight.as_ref().map(|f| f.unit.clone()),
        }
    }

    fn pump(&mut self) {
        loop {
            if self.in_flight.is_some() || self.retry.is_some() {
                return;
            }
            if self.pool.is_full() {
                self.filling = false;
                self.bus
                    .publish(Event::new(EventKind::PoolFull).with_pool_len(self.pool.len()));
                return;
            }
            if self.registry.is_empty() {
                self.filling = false;
                self.bus.publish(Event::new(EventKind::FillStalled));
                return;
            }

            match self.registry.unit(self.cursor.kind(), self.cursor.index()) {
                Some(unit) => {
                    self.issue(unit);
                    return;
                }
                None => {
                    let mv = self.cursor.switch_type();
                    self.publish_move(mv);
                }
            }
        }
    }

    /// Pauses filling after a full cycle of failures, or stalls once every
    /// pause was spent.
    fn back_off(&mut self) {
        if self.fill_retry.exhausted(self.retry_round) {
            self.filling = false;
            self.retry_round = 0;
            self.bus.publish(
                Event::new(EventKind::FillStalled)
                    .with_count(self.fill_retry.max_checks as usize)
                    .with_reason("every source failed"),
            );
            return;
        }

        let delay = self.fill_retry.delay(self.retry_round);
        self.retry_round += 1;
        let ticket = self.tickets.issue();
        self.retry = Some(ticket);
        self.bus.publish(
            Event::new(EventKind::FillBackoff)
                .with_count(self.retry_round as usize)
                .with_total(self.fill_retry.max_checks as usize)
                .with_delay(delay),
        );
        self.mailbox.post_after(delay, Message::FillRetry { ticket });
    }

    fn reset_retry(&mut self) {
        self.retry = None;
        self.failed_streak = 0;
        self.retry_round = 0;
    }

    fn issue(&mut self, unit: SourceUnit) {
        let ticket = self.tickets.issue();
        self.bus.publish(
            Event::new(EventKind::LoadStarted)
                .with_content(unit.kind)
                .with_source(Arc::clone(&unit.source_id))
                .with_count(self.cursor.index()),
        );

        let loader = Arc::clone(&self.loader);
        let timeout = self.load_timeout;
        let request = unit.clone();
        self.mailbox.dispatch(async move {
            let result = run_load(loader.as_ref(), request, timeout).await;
            Message::LoadFinished { ticket, result }
        });
        self.in_flight = Some(InFlight { ticket, unit });
    }

    fn publish_move(&self, mv: CursorMove) {
        if let CursorMove::Switched { from, to } = mv {
            self.bus.publish(
                Event::new(EventKind::TypeSwitched)
                    .with_content(to)
                    .with_reason(from.as_label()),
            );
        }
    }
}

impl ItemSource for SupplyScheduler {
    fn request_item(&mut self) -> Option<CachedItem> {
        let item = self.pool.pop();
        match &item {
            Some(it) => self.bus.publish(
                Event::new(EventKind::ItemConsumed)
                    .with_content(it.kind())
                    .with_source(Arc::clone(&it.unit.source_id))
                    .with_pool_len(self.pool.len()),
            ),
            None => self.bus.publish(Event::new(EventKind::PoolEmpty)),
        }

        if self.armed && !self.filling && self.pool.len() < self.pool.capacity() {
            self.filling = true;
            self.bus.publish(
                Event::new(EventKind::FillResumed)
                    .with_pool_len(self.pool.len())
                    .with_total(self.pool.capacity()),
            );
            self.pump();
        }
        item
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policies::{BackoffPolicy, JitterPolicy};
    use async_trait::async_trait;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio::time;

    /// Loader answering from a per-source script; unscripted sources succeed.
    /// Source ids starting with `hang` never resolve; ids starting with
    /// `fail` always fail.
    #[derive(Default)]
    struct Scripted {
        outcomes: Mutex<HashMap<&'static str, VecDeque<bool>>>,
        calls: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn with(script: &[(&'static str, &[bool])]) -> Arc<Self> {
            let outcomes = script
                .iter()
                .map(|(id, seq)| (*id, seq.iter().copied().collect()))
                .collect();
            Arc::new(Self {
                outcomes: Mutex::new(outcomes),
                calls: Mutex::default(),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Loader for Scripted {
        async fn load(&self, unit: SourceUnit) -> Result<ContentHandle, LoadError> {
            self.calls.lock().unwrap().push(unit.source_id.to_string());
            if unit.source_id.starts_with("hang") {
                futures::future::pending::<()>().await;
            }
            if unit.source_id.starts_with("fail") {
                return Err(LoadError::failed("no fill"));
            }
            let ok = self
                .outcomes
                .lock()
                .unwrap()
                .get_mut(unit.source_id.as_ref())
                .and_then(VecDeque::pop_front)
                .unwrap_or(true);
            if ok {
                Ok(ContentHandle::new(unit.source_id.to_string()))
            } else {
                Err(LoadError::failed("no fill"))
            }
        }
    }

    fn scheduler(
        registry: ContentUnitRegistry,
        loader: Arc<Scripted>,
    ) -> (SupplyScheduler, UnboundedReceiver<Message>, Bus) {
        scheduler_with_retry(registry, loader, PollPolicy::fill_retry())
    }

    fn scheduler_with_retry(
        registry: ContentUnitRegistry,
        loader: Arc<Scripted>,
        retry: PollPolicy,
    ) -> (SupplyScheduler, UnboundedReceiver<Message>, Bus) {
        let (mailbox, rx) = Mailbox::channel();
        let bus = Bus::new(256);
        let s = SupplyScheduler::new(Arc::new(registry), loader, None, retry, mailbox, bus.clone());
        (s, rx, bus)
    }

    /// Applies load completions and retry pauses until nothing arrives for
    /// `idle`.
    async fn settle_for(s: &mut SupplyScheduler, rx: &mut UnboundedReceiver<Message>, idle: Duration) {
        while let Ok(Some(msg)) = time::timeout(idle, rx.recv()).await {
            match msg {
                Message::LoadFinished { ticket, result } => {
                    s.on_load_finished(ticket, result);
                    assert!(s.pool.len() <= s.pool.capacity());
                }
                Message::FillRetry { ticket } => s.on_fill_retry(ticket),
                _ => {}
            }
        }
    }

    async fn settle(s: &mut SupplyScheduler, rx: &mut UnboundedReceiver<Message>) {
        settle_for(s, rx, Duration::from_secs(1)).await;
    }

    fn pooled(s: &SupplyScheduler) -> Vec<String> {
        s.pool.iter().map(|i| i.source_id().to_string()).collect()
    }

    fn registry(reward: &[&str], inter: &[&str], splash: &[&str], target: usize) -> ContentUnitRegistry {
        ContentUnitRegistry::new(reward, inter, splash, target)
    }

    #[tokio::test(start_paused = true)]
    async fn failed_first_reward_then_success_wraps_in_place() {
        let loader = Scripted::with(&[("r1", &[false])]);
        let (mut s, mut rx, _bus) = scheduler(registry(&["r1", "r2"], &[], &[], 1), Arc::clone(&loader));

        s.start_filling();
        settle(&mut s, &mut rx).await;

        assert_eq!(pooled(&s), vec!["r2"]);
        assert_eq!(s.cursor.kind(), ContentType::Reward);
        assert_eq!(s.cursor.index(), 0);
        assert_eq!(s.cursor.failures(), 0);
        assert_eq!(loader.calls(), vec!["r1", "r2"]);
        assert!(!s.filling);
    }

    #[tokio::test(start_paused = true)]
    async fn list_length_failures_switch_type_once() {
        let loader = Scripted::with(&[("i1", &[false]), ("i2", &[false])]);
        let (mut s, mut rx, bus) = scheduler(registry(&[], &["i1", "i2"], &["s1"], 1), Arc::clone(&loader));
        let mut events = bus.subscribe();

        s.start_filling();
        settle(&mut s, &mut rx).await;

        assert_eq!(loader.calls(), vec!["i1", "i2", "s1"]);
        assert_eq!(pooled(&s), vec!["s1"]);
        // splash exhausted on success escalates back to reward
        assert_eq!(s.cursor.kind(), ContentType::Reward);

        let mut switches = Vec::new();
        while let Ok(ev) = events.try_recv() {
            if ev.kind == EventKind::TypeSwitched {
                switches.push(ev.content);
            }
        }
        assert_eq!(
            switches,
            vec![
                Some(ContentType::Interstitial),
                Some(ContentType::Splash),
                Some(ContentType::Reward)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn request_item_refills_below_target() {
        let loader = Scripted::with(&[]);
        let (mut s, mut rx, _bus) = scheduler(registry(&["r1"], &[], &[], 2), Arc::clone(&loader));

        s.start_filling();
        settle(&mut s, &mut rx).await;
        assert_eq!(s.pool.len(), 2);

        let item = s.request_item().expect("pooled item");
        assert_eq!(item.source_id(), "r1");
        assert!(s.filling);

        settle(&mut s, &mut rx).await;
        assert_eq!(s.pool.len(), 2);
        assert_eq!(loader.calls().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_pool_request_does_not_issue_a_second_load() {
        let loader = Scripted::with(&[]);
        let (mut s, _rx, _bus) = scheduler(registry(&["hang1"], &[], &[], 1), Arc::clone(&loader));

        s.start_filling();
        assert!(s.request_item().is_none());
        assert!(s.request_item().is_none());
        time::sleep(Duration::from_millis(10)).await;

        assert_eq!(loader.calls(), vec!["hang1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn request_before_start_does_not_fill() {
        let loader = Scripted::with(&[]);
        let (mut s, _rx, _bus) = scheduler(registry(&["r1"], &[], &[], 1), Arc::clone(&loader));

        assert!(s.request_item().is_none());
        assert!(!s.filling);
        assert!(s.in_flight.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn late_completion_after_clear_is_discarded() {
        let loader = Scripted::with(&[]);
        let (mut s, mut rx, bus) = scheduler(registry(&["r1"], &[], &[], 1), Arc::clone(&loader));
        let mut events = bus.subscribe();

        s.start_filling();
        s.clear();
        settle(&mut s, &mut rx).await;

        assert!(s.pool.is_empty());
        let stale = std::iter::from_fn(|| events.try_recv().ok())
            .any(|ev| ev.kind == EventKind::StaleLoadDiscarded);
        assert!(stale);
    }

    #[tokio::test(start_paused = true)]
    async fn no_sources_stalls_instead_of_spinning() {
        let loader = Scripted::with(&[]);
        let (mut s, _rx, bus) = scheduler(registry(&[], &[], &[], 3), Arc::clone(&loader));
        let mut events = bus.subscribe();

        s.start_filling();

        assert!(!s.filling);
        assert!(loader.calls().is_empty());
        let kinds: Vec<_> = std::iter::from_fn(|| events.try_recv().ok()).map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EventKind::FillStarted, EventKind::FillStalled]);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_target_never_loads() {
        let loader = Scripted::with(&[]);
        let (mut s, _rx, _bus) = scheduler(registry(&["r1"], &[], &[], 0), Arc::clone(&loader));

        s.start_filling();
        assert!(s.request_item().is_none());
        assert!(loader.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn pool_never_exceeds_target_under_mixed_outcomes() {
        let loader = Scripted::with(&[
            ("r1", &[false, true, false, true]),
            ("r2", &[true, false, false]),
            ("i1", &[false, false, true]),
        ]);
        let (mut s, mut rx, _bus) = scheduler(registry(&["r1", "r2"], &["i1"], &["s1"], 3), Arc::clone(&loader));

        s.start_filling();
        settle(&mut s, &mut rx).await;
        assert_eq!(s.pool.len(), 3);

        for _ in 0..5 {
            s.request_item();
            settle(&mut s, &mut rx).await;
            assert!(s.pool.len() <= 3);
        }
        assert_eq!(s.pool.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn snapshot_reports_cursor_and_pool() {
        let loader = Scripted::with(&[]);
        let (mut s, mut rx, _bus) = scheduler(registry(&["r1", "r2"], &[], &[], 1), Arc::clone(&loader));

        s.start_filling();
        settle(&mut s, &mut rx).await;

        let snap = s.snapshot();
        assert_eq!(snap.pool, vec![SourceUnit::new(ContentType::Reward, "r1")]);
        assert_eq!(snap.index, 1);
        assert_eq!(snap.target_size, 1);
        assert!(!snap.filling);
        assert!(snap.loading.is_none());
    }

    fn short_retry() -> PollPolicy {
        PollPolicy {
            backoff: BackoffPolicy {
                first: Duration::from_millis(100),
                max: Duration::from_secs(1),
                factor: 2.0,
                jitter: JitterPolicy::None,
            },
            max_checks: 3,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn failing_cycles_back_off_then_stall() {
        let loader = Scripted::with(&[]);
        let (mut s, mut rx, bus) = scheduler_with_retry(
            registry(&["fail-r"], &["fail-i"], &["fail-s"], 1),
            Arc::clone(&loader),
            short_retry(),
        );
        let mut events = bus.subscribe();

        let started = time::Instant::now();
        s.start_filling();
        settle_for(&mut s, &mut rx, Duration::from_secs(5)).await;

        // one cycle of three sources per attempt: the first plus three retries
        assert_eq!(loader.calls().len(), 12);
        assert!(!s.filling);
        assert!(s.retry.is_none());

        let evs: Vec<_> = std::iter::from_fn(|| events.try_recv().ok()).collect();
        let pauses: Vec<_> = evs
            .iter()
            .filter(|e| e.kind == EventKind::FillBackoff)
            .map(|e| (e.count, e.delay_ms))
            .collect();
        assert_eq!(
            pauses,
            vec![(Some(1), Some(100)), (Some(2), Some(200)), (Some(3), Some(400))]
        );
        let stalled = evs.iter().find(|e| e.kind == EventKind::FillStalled).expect("stall");
        assert_eq!(stalled.count, Some(3));
        // pauses plus the idle window of the settle loop
        assert!(started.elapsed() >= Duration::from_millis(5_700));

        // the next demand restarts filling
        assert!(s.request_item().is_none());
        assert!(s.filling);
        let loading = s.snapshot().loading.expect("load issued");
        assert_eq!(loading.source_id.as_ref(), "fail-r");
    }

    #[tokio::test(start_paused = true)]
    async fn retry_waits_for_the_pause() {
        let loader = Scripted::with(&[("r1", &[false, true])]);
        let (mut s, mut rx, _bus) = scheduler_with_retry(
            registry(&["r1"], &[], &[], 1),
            Arc::clone(&loader),
            short_retry(),
        );

        s.start_filling();
        let Some(Message::LoadFinished { ticket, result }) = rx.recv().await else {
            panic!("expected a load completion");
        };
        s.on_load_finished(ticket, result);

        assert!(s.snapshot().backing_off);
        assert_eq!(loader.calls().len(), 1);

        // a request during the pause does not jump the queue
        assert!(s.request_item().is_none());
        time::sleep(Duration::from_millis(99)).await;
        assert_eq!(loader.calls().len(), 1);

        settle(&mut s, &mut rx).await;
        assert_eq!(loader.calls(), vec!["r1", "r1"]);
        assert_eq!(pooled(&s), vec!["r1"]);
        assert_eq!(s.retry_round, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn clear_drops_a_pending_pause() {
        let loader = Scripted::with(&[]);
        let (mut s, mut rx, _bus) = scheduler_with_retry(
            registry(&["fail-r"], &[], &[], 1),
            Arc::clone(&loader),
            short_retry(),
        );

        s.start_filling();
        let Some(Message::LoadFinished { ticket, result }) = rx.recv().await else {
            panic!("expected a load completion");
        };
        s.on_load_finished(ticket, result);
        assert!(s.retry.is_some());

        s.clear();
        settle(&mut s, &mut rx).await;
        assert_eq!(loader.calls().len(), 1);
        assert!(!s.filling);
    }
}
