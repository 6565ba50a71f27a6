//! # Dashboard Aggregator
//!
//! Folds the engine's four channels into the state the dashboard renders:
//! connection badge, KPI cards, insight panel and its unread counter.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use super::engine::RealtimeEngine;
use super::hub::Subscription;
use crate::datasets::DashboardDataSource;
use crate::models::{ConnectionStatus, InsightEvent, KpiData, MetricUpdate};

/// Display state maintained by a `DashboardAggregator`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardState {
    pub status: ConnectionStatus,
    pub kpis: Vec<KpiData>,
    /// Latest ledger snapshot, newest first.
    pub insights: Vec<InsightEvent>,
    pub last_metric_update: Option<MetricUpdate>,
    /// Insights received live since the last `mark_insights_read`.
    pub unread_insights: usize,
}

impl DashboardState {
    fn apply_metric(&mut self, update: &MetricUpdate) {
        match self.kpis.iter_mut().find(|card| card.id == update.metric_id) {
            Some(card) => card.apply_update(update),
            None => log::warn!("Metric update for unknown card '{}'", update.metric_id),
        }
        self.last_metric_update = Some(update.clone());
    }
}

/// # Dashboard Aggregator
///
/// Subscribes to every engine channel on `attach` and keeps a
/// `DashboardState` current. Call `detach` (or tear the engine down) to stop.
pub struct DashboardAggregator {
    state: Arc<Mutex<DashboardState>>,
    subscriptions: Vec<Subscription>,
}

impl DashboardAggregator {
    /// Seeds the KPI cards from `dataset` and subscribes to `engine`.
    pub fn attach(engine: &RealtimeEngine, dataset: &dyn DashboardDataSource) -> Self {
        let state = Arc::new(Mutex::new(DashboardState {
            status: engine.status(),
            kpis: dataset.kpis(),
            insights: engine.ledger_snapshot().to_vec(),
            last_metric_update: None,
            unread_insights: 0,
        }));

        let mut subscriptions = Vec::with_capacity(4);

        let sink = Arc::clone(&state);
        subscriptions.push(engine.subscribe_connection_status(move |status| {
            sink.lock().status = *status;
        }));

        let sink = Arc::clone(&state);
        subscriptions.push(engine.subscribe_metric_updates(move |update| {
            sink.lock().apply_metric(update);
        }));

        let sink = Arc::clone(&state);
        subscriptions.push(engine.subscribe_insight_ledger(move |snapshot| {
            sink.lock().insights = snapshot.to_vec();
        }));

        let sink = Arc::clone(&state);
        subscriptions.push(engine.subscribe_insight_events(move |_| {
            sink.lock().unread_insights += 1;
        }));

        log::info!("Dashboard aggregator attached");
        Self {
            state,
            subscriptions,
        }
    }

    /// Copy of the current display state.
    pub fn state(&self) -> DashboardState {
        self.state.lock().clone()
    }

    pub fn mark_insights_read(&self) {
        self.state.lock().unread_insights = 0;
    }

    /// Unsubscribes from every channel. Later events leave the state untouched.
    pub fn detach(&mut self, engine: &RealtimeEngine) {
        for handle in self.subscriptions.drain(..) {
            engine.unsubscribe(handle);
        }
        log::info!("Dashboard aggregator detached");
    }
}
