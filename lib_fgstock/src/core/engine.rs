//! # Real-time Engine
//!
//! The connection state machine, the generator tickers, the insight ledger
//! and the event hub, assembled into one explicitly owned object.
//!
//! ## Timeline
//!
//! All engine state lives in an `EngineState` behind a reentrant lock. Every
//! operation (public calls, timer ticks, connect completions) follows the same
//! shape:
//!
//! 1.  Take the lock and borrow the state mutably.
//! 2.  Mutate, and freeze the observers that must hear about it.
//! 3.  Release the borrow, keep the lock, and deliver.
//!
//! Holding the lock across delivery keeps other threads from interleaving a
//! mutation between steps 2 and 3, while the reentrancy lets an observer call
//! back into the engine (`disconnect`, `unsubscribe`, ...) from inside its
//! callback.
//!
//! ## Status queue
//!
//! A status change queues its notification together with the observers
//! registered at that moment. The queue is drained in order by whichever
//! call started draining first, so an observer that changes the status from
//! inside its callback never overtakes the notification still in flight:
//! every observer sees every transition, in transition order.
//!
//! ## Sessions
//!
//! Every `connect` and `disconnect` bumps a session counter. Timer ticks and
//! connect completions carry the session they were started in and turn into
//! no-ops once it is stale, so nothing scheduled before a `disconnect` can
//! emit after it.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Utc;
use parking_lot::ReentrantMutex;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use super::connection::{ConnectionBackend, MockBackend, RetryPolicy};
use super::generator::{BoxedRng, GeneratorHandle, UpdateGenerator};
use super::hub::{ChannelKind, Delivery, EventHub, Subscription};
use super::ledger::InsightLedger;
use crate::configs::EngineConfig;
use crate::datasets::DashboardDataSource;
use crate::error::{BackendError, EngineError};
use crate::models::{ConnectionStatus, InsightEvent, InsightSnapshot, MetricUpdate};

struct EngineState {
    status: ConnectionStatus,
    /// Transitions not yet delivered, oldest first.
    status_queue: VecDeque<(ConnectionStatus, Delivery<ConnectionStatus>)>,
    draining_status: bool,
    session: u64,
    reconnect_attempts: u32,
    ledger: InsightLedger,
    hub: EventHub,
    generator: UpdateGenerator,
    ticks: Option<GeneratorHandle>,
    /// Covers the handshake in flight and any backoff wait before the next one.
    pending_connect: Option<CancellationToken>,
    torn_down: bool,
}

impl EngineState {
    fn set_status(&mut self, status: ConnectionStatus) {
        log::info!("Connection status: {} -> {}", self.status, status);
        self.status = status;
        let delivery = self.hub.status_delivery();
        self.status_queue.push_back((status, delivery));
    }

    fn is_streaming(&self, session: u64) -> bool {
        !self.torn_down && self.session == session && self.status == ConnectionStatus::Connected
    }

    fn cancel_pending(&mut self) -> bool {
        let had_pending = self.pending_connect.is_some();
        if let Some(token) = self.pending_connect.take() {
            token.cancel();
        }
        if let Some(ticks) = self.ticks.take() {
            ticks.cancel();
        }
        had_pending
    }
}

type Timeline = ReentrantMutex<RefCell<EngineState>>;

struct EngineInner {
    timeline: Timeline,
    runtime: Handle,
    backend: Arc<dyn ConnectionBackend>,
    retry: RetryPolicy,
    config: EngineConfig,
}

/// # Realtime Engine
///
/// Owns the live feed of the dashboard. Observers register on four channels
/// and receive events synchronously, in emission order, on whichever thread
/// produced them.
///
/// Dropping the engine tears it down.
pub struct RealtimeEngine {
    inner: Arc<EngineInner>,
}

/// # Engine Builder
///
/// Assembles a `RealtimeEngine` from a config plus optional overrides for the
/// backend, the random source, the seed insights and the runtime.
pub struct EngineBuilder {
    config: EngineConfig,
    backend: Option<Arc<dyn ConnectionBackend>>,
    rng: Option<BoxedRng>,
    seeds: Vec<InsightEvent>,
    runtime: Option<Handle>,
}

impl EngineBuilder {
    pub fn backend(mut self, backend: Arc<dyn ConnectionBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Replaces the random source. Takes precedence over `EngineConfig::seed`.
    pub fn rng(mut self, rng: BoxedRng) -> Self {
        self.rng = Some(rng);
        self
    }

    /// Initial ledger contents, newest first.
    pub fn seed_insights(mut self, seeds: Vec<InsightEvent>) -> Self {
        self.seeds = seeds;
        self
    }

    /// Seeds the ledger from `dataset`.
    pub fn dataset(self, dataset: &dyn DashboardDataSource) -> Self {
        let seeds = dataset.seed_insights(Utc::now());
        self.seed_insights(seeds)
    }

    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn build(self) -> Result<RealtimeEngine, EngineError> {
        self.config.validate()?;

        let runtime = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|e| EngineError::NoRuntime(e.to_string()))?,
        };
        let ledger = InsightLedger::with_seed(self.config.ledger_capacity, self.seeds)?;
        let generator = match self.rng {
            Some(rng) => UpdateGenerator::new(rng),
            None => UpdateGenerator::from_seed(self.config.seed),
        };
        let backend = self
            .backend
            .unwrap_or_else(|| Arc::new(MockBackend::from_config(&self.config)));

        log::info!(
            "Engine ready: backend '{}', ledger {}/{}, metric every {:?}, insight every {:?}",
            backend.name(),
            ledger.len(),
            ledger.capacity(),
            self.config.metric_interval(),
            self.config.insight_interval()
        );

        let state = EngineState {
            status: ConnectionStatus::Disconnected,
            status_queue: VecDeque::new(),
            draining_status: false,
            session: 0,
            reconnect_attempts: 0,
            ledger,
            hub: EventHub::new(),
            generator,
            ticks: None,
            pending_connect: None,
            torn_down: false,
        };

        Ok(RealtimeEngine {
            inner: Arc::new(EngineInner {
                timeline: ReentrantMutex::new(RefCell::new(state)),
                runtime,
                backend,
                retry: RetryPolicy::from_config(&self.config),
                config: self.config,
            }),
        })
    }
}

impl RealtimeEngine {
    pub fn builder(config: EngineConfig) -> EngineBuilder {
        EngineBuilder {
            config,
            backend: None,
            rng: None,
            seeds: Vec::new(),
            runtime: None,
        }
    }

    /// Engine on the mock backend, ledger seeded from `dataset`. Must be
    /// called from within a tokio runtime.
    pub fn new(config: EngineConfig, dataset: &dyn DashboardDataSource) -> Result<Self, EngineError> {
        Self::builder(config).dataset(dataset).build()
    }

    /// Starts connecting. No-op while connected or connecting; during a
    /// backoff wait it abandons the wait and starts a fresh attempt.
    pub fn connect(&self) {
        self.inner.connect();
    }

    /// Cancels pending work and goes back to `disconnected`. Returns once no
    /// further metric or insight event can be delivered.
    pub fn disconnect(&self) {
        self.inner.disconnect();
    }

    /// Irreversible shutdown. Cancels all timers and silences every observer.
    pub fn teardown(&self) {
        self.inner.teardown();
    }

    /// Replay-latest: `observer` immediately receives the current status.
    pub fn subscribe_connection_status<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&ConnectionStatus) + Send + Sync + 'static,
    {
        let guard = self.inner.timeline.lock();
        let (handle, replay, current) = {
            let mut state = guard.borrow_mut();
            let (handle, replay) = state.hub.subscribe_status(Box::new(observer));
            (handle, replay, state.status)
        };
        replay.deliver(&current);
        handle
    }

    /// Fire-and-forget: only updates emitted after this call.
    pub fn subscribe_metric_updates<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&MetricUpdate) + Send + Sync + 'static,
    {
        let guard = self.inner.timeline.lock();
        let handle = guard.borrow_mut().hub.subscribe_metrics(Box::new(observer));
        handle
    }

    /// Fire-and-forget: only insights emitted after this call.
    pub fn subscribe_insight_events<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&InsightEvent) + Send + Sync + 'static,
    {
        let guard = self.inner.timeline.lock();
        let handle = guard.borrow_mut().hub.subscribe_insights(Box::new(observer));
        handle
    }

    /// Replay-latest: `observer` immediately receives the current ledger.
    pub fn subscribe_insight_ledger<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&InsightSnapshot) + Send + Sync + 'static,
    {
        let guard = self.inner.timeline.lock();
        let (handle, replay, snapshot) = {
            let mut state = guard.borrow_mut();
            let (handle, replay) = state.hub.subscribe_ledger(Box::new(observer));
            (handle, replay, state.ledger.snapshot())
        };
        replay.deliver(&snapshot);
        handle
    }

    /// Stops delivery to `handle`. Safe to call repeatedly.
    pub fn unsubscribe(&self, handle: Subscription) {
        let guard = self.inner.timeline.lock();
        guard.borrow_mut().hub.unsubscribe(handle);
    }

    pub fn status(&self) -> ConnectionStatus {
        self.inner.timeline.lock().borrow().status
    }

    pub fn ledger_snapshot(&self) -> InsightSnapshot {
        self.inner.timeline.lock().borrow().ledger.snapshot()
    }

    /// Failed handshakes since the last success, explicit connect or disconnect.
    pub fn reconnect_attempts(&self) -> u32 {
        self.inner.timeline.lock().borrow().reconnect_attempts
    }

    pub fn max_reconnect_attempts(&self) -> u32 {
        self.inner.retry.max_attempts
    }

    pub fn is_torn_down(&self) -> bool {
        self.inner.timeline.lock().borrow().torn_down
    }

    pub fn subscriber_count(&self, channel: ChannelKind) -> usize {
        self.inner.timeline.lock().borrow().hub.subscriber_count(channel)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }
}

impl Drop for RealtimeEngine {
    fn drop(&mut self) {
        self.inner.teardown();
    }
}

impl EngineInner {
    /// Delivers queued status notifications in order. A nested call made from
    /// inside a status observer returns at once; the outer call picks up
    /// whatever the observer queued.
    fn drain_status(&self) {
        let guard = self.timeline.lock();
        {
            let mut state = guard.borrow_mut();
            if state.draining_status {
                return;
            }
            state.draining_status = true;
        }
        loop {
            let next = guard.borrow_mut().status_queue.pop_front();
            match next {
                Some((status, delivery)) => delivery.deliver(&status),
                None => break,
            }
        }
        guard.borrow_mut().draining_status = false;
    }

    fn connect(self: &Arc<Self>) {
        let guard = self.timeline.lock();
        let (session, token) = {
            let mut state = guard.borrow_mut();
            if state.torn_down {
                log::warn!("connect() called after teardown, ignoring");
                return;
            }
            if state.status != ConnectionStatus::Disconnected {
                log::debug!("connect() while {}, nothing to do", state.status);
                return;
            }
            if state.cancel_pending() {
                log::info!("Abandoning reconnect backoff for a fresh attempt");
            }

            state.session += 1;
            state.reconnect_attempts = 0;
            let token = CancellationToken::new();
            state.pending_connect = Some(token.clone());
            state.set_status(ConnectionStatus::Connecting);
            (state.session, token)
        };

        self.spawn_attempt(session, token, None);
        self.drain_status();
    }

    fn disconnect(&self) {
        let guard = self.timeline.lock();
        {
            let mut state = guard.borrow_mut();
            if state.torn_down {
                log::debug!("disconnect() after teardown, nothing to do");
                return;
            }
            let had_pending = state.cancel_pending();
            state.session += 1;
            state.reconnect_attempts = 0;

            if state.status == ConnectionStatus::Disconnected {
                if had_pending {
                    log::info!("Pending reconnect cancelled");
                } else {
                    log::debug!("disconnect() while disconnected, nothing to do");
                }
                return;
            }
            self.backend.close();
            state.set_status(ConnectionStatus::Disconnected);
        }

        self.drain_status();
    }

    fn teardown(&self) {
        let guard = self.timeline.lock();
        let mut state = guard.borrow_mut();
        if state.torn_down {
            log::debug!("Engine already torn down");
            return;
        }
        state.torn_down = true;
        state.cancel_pending();
        state.session += 1;
        state.hub.close();
        state.status_queue.clear();
        if state.status != ConnectionStatus::Disconnected {
            self.backend.close();
            state.status = ConnectionStatus::Disconnected;
        }
        log::info!("Engine torn down");
    }

    /// Runs one handshake, optionally after a backoff `delay`.
    fn spawn_attempt(self: &Arc<Self>, session: u64, token: CancellationToken, delay: Option<Duration>) {
        let weak = Arc::downgrade(self);
        let backend = Arc::clone(&self.backend);

        self.runtime.spawn(async move {
            if let Some(delay) = delay {
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = tokio::time::sleep(delay) => {}
                }
                match weak.upgrade() {
                    Some(inner) if inner.begin_retry(session) => {}
                    _ => return,
                }
            }

            let outcome = tokio::select! {
                _ = token.cancelled() => return,
                outcome = backend.open() => outcome,
            };

            if let Some(inner) = weak.upgrade() {
                inner.finish_attempt(session, outcome);
            }
        });
    }

    fn begin_retry(&self, session: u64) -> bool {
        let guard = self.timeline.lock();
        {
            let mut state = guard.borrow_mut();
            if state.torn_down
                || state.session != session
                || state.status != ConnectionStatus::Disconnected
            {
                return false;
            }
            log::info!(
                "Reconnect attempt {}/{}",
                state.reconnect_attempts + 1,
                self.retry.max_attempts + 1
            );
            state.set_status(ConnectionStatus::Connecting);
        }
        self.drain_status();
        true
    }

    fn finish_attempt(self: &Arc<Self>, session: u64, outcome: Result<(), BackendError>) {
        let guard = self.timeline.lock();
        {
            let mut state = guard.borrow_mut();
            if state.torn_down
                || state.session != session
                || state.status != ConnectionStatus::Connecting
            {
                return;
            }

            match outcome {
                Ok(()) => {
                    state.pending_connect = None;
                    state.reconnect_attempts = 0;
                    state.ticks = Some(self.start_generator(session));
                    log::info!("Connected through '{}' backend", self.backend.name());
                    state.set_status(ConnectionStatus::Connected);
                }
                Err(e) => {
                    state.reconnect_attempts += 1;
                    let attempt = state.reconnect_attempts;
                    state.set_status(ConnectionStatus::Disconnected);

                    if self.retry.allows(attempt) {
                        let delay = self.retry.delay_for(attempt);
                        log::warn!("Connect failed ({}), retrying in {:?}", e, delay);
                        if let Some(token) = state.pending_connect.clone() {
                            self.spawn_attempt(session, token, Some(delay));
                        }
                    } else {
                        state.pending_connect = None;
                        log::error!(
                            "Connect failed ({}), giving up after {} attempts",
                            e,
                            attempt
                        );
                    }
                }
            }
        }

        self.drain_status();
    }

    fn start_generator(self: &Arc<Self>, session: u64) -> GeneratorHandle {
        let on_metric = {
            let weak: Weak<EngineInner> = Arc::downgrade(self);
            move || match weak.upgrade() {
                Some(inner) => {
                    inner.metric_tick(session);
                    true
                }
                None => false,
            }
        };
        let on_insight = {
            let weak: Weak<EngineInner> = Arc::downgrade(self);
            move || match weak.upgrade() {
                Some(inner) => {
                    inner.insight_tick(session);
                    true
                }
                None => false,
            }
        };

        GeneratorHandle::start(
            &self.runtime,
            self.config.metric_interval(),
            self.config.insight_interval(),
            on_metric,
            on_insight,
        )
    }

    fn metric_tick(&self, session: u64) {
        let guard = self.timeline.lock();
        let (update, delivery) = {
            let mut state = guard.borrow_mut();
            if !state.is_streaming(session) {
                return;
            }
            let update = state.generator.next_metric();
            log::debug!("Metric update: {} -> {}", update.metric_id, update.new_value);
            (update, state.hub.metric_delivery())
        };
        delivery.deliver_while(&update, || guard.borrow().is_streaming(session));
    }

    fn insight_tick(&self, session: u64) {
        let guard = self.timeline.lock();
        let (event, snapshot, ledger_delivery, insight_delivery) = {
            let mut state = guard.borrow_mut();
            if !state.is_streaming(session) {
                return;
            }
            let event = state.generator.next_insight(Utc::now());
            let snapshot = match state.ledger.record(event.clone()) {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    log::error!("Dropping generated insight: {}", e);
                    return;
                }
            };
            log::debug!("New insight {} ({})", event.id, event.category);
            (event, snapshot, state.hub.ledger_delivery(), state.hub.insight_delivery())
        };
        ledger_delivery.deliver_while(&snapshot, || guard.borrow().is_streaming(session));
        insight_delivery.deliver_while(&event, || guard.borrow().is_streaming(session));
    }
}
