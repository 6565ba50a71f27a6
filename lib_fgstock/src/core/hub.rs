//! # Event Distribution Hub
//!
//! The observer registry behind the engine's four channels. Each channel is an
//! ordered list of callbacks; a delivery iterates a frozen copy of that list,
//! so observers that subscribe or unsubscribe while an event is in flight never
//! disturb the iteration.
//!
//! ## Delivery rules:
//!
//! 1.  **Emission order**: observers of a channel are invoked one after the
//!     other, in registration order, for every event. All observers therefore
//!     see the same sequence.
//! 2.  **Unsubscribe wins**: every entry carries an `active` flag that is
//!     cleared on unsubscribe. A frozen delivery re-checks the flag right before
//!     each call, so an observer removed mid-delivery is skipped.
//! 3.  **Failure isolation**: each callback runs under `catch_unwind`. A
//!     panicking observer is logged and skipped; the remaining observers and
//!     the hub's own state are unaffected.
//! 4.  **Close is final**: once closed, the hub deactivates every entry and
//!     hands out inert subscriptions that are never registered.
//!
//! The hub does not own the current status or ledger. For the replay-latest
//! channels it returns a single-target `Delivery` that the engine feeds with
//! the current value after releasing its own state.

use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::models::{ConnectionStatus, InsightEvent, InsightSnapshot, MetricUpdate};

/// The four event channels exposed by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    /// Replay-latest connection status.
    ConnectionStatus,
    /// Fire-and-forget metric updates.
    MetricUpdates,
    /// Fire-and-forget single insights.
    InsightEvents,
    /// Replay-latest ledger snapshots.
    InsightLedger,
}

impl ChannelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::ConnectionStatus => "connection-status",
            ChannelKind::MetricUpdates => "metric-updates",
            ChannelKind::InsightEvents => "insight-events",
            ChannelKind::InsightLedger => "insight-ledger",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Process-wide, so a handle from one hub never matches an observer of another.
static NEXT_SUBSCRIPTION_ID: AtomicU64 = AtomicU64::new(1);

/// # Subscription
///
/// Opaque handle tying one observer to one channel. Pass it back to
/// `unsubscribe` to stop delivery; doing so more than once is harmless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    id: u64,
    channel: ChannelKind,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn channel(&self) -> ChannelKind {
        self.channel
    }
}

type Callback<T> = Box<dyn Fn(&T) + Send + Sync>;

struct ObserverEntry<T> {
    id: u64,
    active: AtomicBool,
    callback: Callback<T>,
}

/// A frozen list of observers, ready to receive one event.
pub(crate) struct Delivery<T> {
    channel: ChannelKind,
    targets: Vec<Arc<ObserverEntry<T>>>,
}

impl<T> Delivery<T> {
    fn empty(channel: ChannelKind) -> Self {
        Self {
            channel,
            targets: Vec::new(),
        }
    }

    /// Invokes every still-active observer with `event`, isolating panics.
    pub(crate) fn deliver(&self, event: &T) {
        self.deliver_while(event, || true);
    }

    /// Like `deliver`, but stops as soon as `live` returns false. `live` is
    /// checked before each observer, so a state change made by one observer
    /// cuts the delivery short for the ones after it.
    pub(crate) fn deliver_while(&self, event: &T, mut live: impl FnMut() -> bool) {
        for target in &self.targets {
            if !live() {
                log::debug!("Delivery on channel '{}' superseded", self.channel);
                return;
            }
            if !target.active.load(Ordering::Acquire) {
                continue;
            }
            let outcome = catch_unwind(AssertUnwindSafe(|| (target.callback)(event)));
            if let Err(payload) = outcome {
                log::error!(
                    "Observer {} on channel '{}' panicked: {}. Delivery continues.",
                    target.id,
                    self.channel,
                    panic_message(payload.as_ref())
                );
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "<non-string panic payload>"
    }
}

struct ObserverRegistry<T> {
    channel: ChannelKind,
    entries: Vec<Arc<ObserverEntry<T>>>,
}

impl<T> ObserverRegistry<T> {
    fn new(channel: ChannelKind) -> Self {
        Self {
            channel,
            entries: Vec::new(),
        }
    }

    fn register(&mut self, id: u64, callback: Callback<T>) -> Arc<ObserverEntry<T>> {
        let entry = Arc::new(ObserverEntry {
            id,
            active: AtomicBool::new(true),
            callback,
        });
        self.entries.push(Arc::clone(&entry));
        log::debug!("Observer {} registered on channel '{}'", id, self.channel);
        entry
    }

    fn remove(&mut self, id: u64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| {
            if entry.id == id {
                entry.active.store(false, Ordering::Release);
                false
            } else {
                true
            }
        });
        before != self.entries.len()
    }

    fn freeze(&self) -> Delivery<T> {
        Delivery {
            channel: self.channel,
            targets: self.entries.clone(),
        }
    }

    fn close(&mut self) {
        for entry in self.entries.drain(..) {
            entry.active.store(false, Ordering::Release);
        }
    }
}

/// # Event Hub
///
/// Registry of observers for the four channels.
pub struct EventHub {
    closed: bool,
    status: ObserverRegistry<ConnectionStatus>,
    metrics: ObserverRegistry<MetricUpdate>,
    insights: ObserverRegistry<InsightEvent>,
    ledger: ObserverRegistry<InsightSnapshot>,
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHub {
    pub fn new() -> Self {
        Self {
            closed: false,
            status: ObserverRegistry::new(ChannelKind::ConnectionStatus),
            metrics: ObserverRegistry::new(ChannelKind::MetricUpdates),
            insights: ObserverRegistry::new(ChannelKind::InsightEvents),
            ledger: ObserverRegistry::new(ChannelKind::InsightLedger),
        }
    }

    fn allocate(&self, channel: ChannelKind) -> Subscription {
        let id = NEXT_SUBSCRIPTION_ID.fetch_add(1, Ordering::Relaxed);
        Subscription { id, channel }
    }

    /// Registers a status observer. The returned delivery targets only the
    /// new observer and is used to replay the current status.
    pub(crate) fn subscribe_status(
        &mut self,
        callback: Callback<ConnectionStatus>,
    ) -> (Subscription, Delivery<ConnectionStatus>) {
        let handle = self.allocate(ChannelKind::ConnectionStatus);
        if self.closed {
            return (handle, Delivery::empty(handle.channel));
        }
        let entry = self.status.register(handle.id, callback);
        let replay = Delivery {
            channel: handle.channel,
            targets: vec![entry],
        };
        (handle, replay)
    }

    pub(crate) fn subscribe_metrics(&mut self, callback: Callback<MetricUpdate>) -> Subscription {
        let handle = self.allocate(ChannelKind::MetricUpdates);
        if !self.closed {
            self.metrics.register(handle.id, callback);
        }
        handle
    }

    pub(crate) fn subscribe_insights(&mut self, callback: Callback<InsightEvent>) -> Subscription {
        let handle = self.allocate(ChannelKind::InsightEvents);
        if !self.closed {
            self.insights.register(handle.id, callback);
        }
        handle
    }

    /// Registers a ledger observer; see `subscribe_status` for the replay delivery.
    pub(crate) fn subscribe_ledger(
        &mut self,
        callback: Callback<InsightSnapshot>,
    ) -> (Subscription, Delivery<InsightSnapshot>) {
        let handle = self.allocate(ChannelKind::InsightLedger);
        if self.closed {
            return (handle, Delivery::empty(handle.channel));
        }
        let entry = self.ledger.register(handle.id, callback);
        let replay = Delivery {
            channel: handle.channel,
            targets: vec![entry],
        };
        (handle, replay)
    }

    /// Removes the observer behind `handle`. Returns whether anything was removed.
    pub fn unsubscribe(&mut self, handle: Subscription) -> bool {
        let removed = match handle.channel {
            ChannelKind::ConnectionStatus => self.status.remove(handle.id),
            ChannelKind::MetricUpdates => self.metrics.remove(handle.id),
            ChannelKind::InsightEvents => self.insights.remove(handle.id),
            ChannelKind::InsightLedger => self.ledger.remove(handle.id),
        };
        if removed {
            log::debug!("Observer {} removed from channel '{}'", handle.id, handle.channel);
        }
        removed
    }

    pub(crate) fn status_delivery(&self) -> Delivery<ConnectionStatus> {
        self.status.freeze()
    }

    pub(crate) fn metric_delivery(&self) -> Delivery<MetricUpdate> {
        self.metrics.freeze()
    }

    pub(crate) fn insight_delivery(&self) -> Delivery<InsightEvent> {
        self.insights.freeze()
    }

    pub(crate) fn ledger_delivery(&self) -> Delivery<InsightSnapshot> {
        self.ledger.freeze()
    }

    /// Deactivates every observer. Later subscriptions are inert.
    pub fn close(&mut self) {
        self.closed = true;
        self.status.close();
        self.metrics.close();
        self.insights.close();
        self.ledger.close();
    }

    /// Number of live observers on `channel`.
    pub fn subscriber_count(&self, channel: ChannelKind) -> usize {
        match channel {
            ChannelKind::ConnectionStatus => self.status.entries.len(),
            ChannelKind::MetricUpdates => self.metrics.entries.len(),
            ChannelKind::InsightEvents => self.insights.entries.len(),
            ChannelKind::InsightLedger => self.ledger.entries.len(),
        }
    }
}
