//! # Insight Ledger
//!
//! Bounded, newest-first store of insight events. New entries always land at
//! index 0; once the capacity is exceeded the oldest entries fall off the tail.
//!
//! Readers never see the deque itself. After every mutation the ledger
//! freezes its contents into an `Arc<[InsightEvent]>` snapshot, which is
//! what observers and callers receive. A snapshot is therefore always a
//! complete, consistent view and cannot be used to mutate the ledger.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::error::{ConfigError, EngineError};
use crate::models::{InsightEvent, InsightSnapshot};

/// Bounded, newest-first insight store.
#[derive(Debug)]
pub struct InsightLedger {
    entries: VecDeque<InsightEvent>,
    capacity: usize,
    snapshot: InsightSnapshot,
}

impl InsightLedger {
    /// Creates an empty ledger. A zero capacity is a configuration error.
    pub fn new(capacity: usize) -> Result<Self, EngineError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity.into());
        }
        Ok(Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
            snapshot: Arc::from(Vec::new()),
        })
    }

    /// Creates a ledger pre-filled with `seeds`, given newest first.
    ///
    /// Seeds beyond the capacity are dropped from the old end, exactly as if
    /// they had been recorded one by one from oldest to newest.
    pub fn with_seed(capacity: usize, seeds: Vec<InsightEvent>) -> Result<Self, EngineError> {
        let mut ledger = Self::new(capacity)?;
        for event in seeds.into_iter().rev() {
            ledger.record(event)?;
        }
        Ok(ledger)
    }

    /// Prepends `event`, evicts from the tail down to the capacity, and
    /// returns the fresh snapshot.
    ///
    /// An id already present in the ledger is an invariant violation and is
    /// rejected without touching the contents.
    pub fn record(&mut self, event: InsightEvent) -> Result<InsightSnapshot, EngineError> {
        if self.contains(&event.id) {
            return Err(EngineError::DuplicateInsightId(event.id));
        }

        self.entries.push_front(event);
        while self.entries.len() > self.capacity {
            if let Some(evicted) = self.entries.pop_back() {
                log::debug!("Ledger full, evicting insight '{}'", evicted.id);
            }
        }

        self.snapshot = self.entries.iter().cloned().collect::<Vec<_>>().into();
        Ok(Arc::clone(&self.snapshot))
    }

    /// Current contents, newest first.
    pub fn snapshot(&self) -> InsightSnapshot {
        Arc::clone(&self.snapshot)
    }

    /// Whether an insight with this id is currently held.
    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
