//! # Update Generator
//!
//! Synthesizes the live feed: one KPI change per metric tick and one insight
//! per insight tick. Value synthesis (`UpdateGenerator`) is separate from
//! scheduling (`GeneratorHandle`) so that the former can be driven directly
//! with a seeded random source.
//!
//! ## Metric tick
//! A metric is drawn uniformly from the five live cards. Its new value is an
//! integer drawn from a card-specific range and formatted like the card
//! (Indian digit grouping for quantities, one decimal for values in lakhs).
//! The signed trend is drawn from a card-specific range; its sign gives the
//! direction. `previous_value` is whatever this generator last emitted for
//! the card, starting from the dashboard's initial figures.
//!
//! ## Insight tick
//! A category is drawn uniformly, then a message template within it. The id
//! combines the wall-clock millisecond with a process-wide sequence number,
//! so two insights created within the same millisecond still differ.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::models::{InsightCategory, InsightEvent, MetricId, MetricUpdate};
use crate::utils::format::{format_fixed1, format_indian};

/// Random source used by the generator.
pub type BoxedRng = Box<dyn RngCore + Send>;

static NEXT_INSIGHT_SEQ: AtomicU64 = AtomicU64::new(1);

/// Allocates an insight id that is unique for the lifetime of the process.
pub fn next_insight_id(now: DateTime<Utc>) -> String {
    let seq = NEXT_INSIGHT_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("insight-{}-{}", now.timestamp_millis(), seq)
}

#[derive(Debug, Clone, Copy)]
enum ValueStyle {
    Grouped,
    OneDecimal,
}

#[derive(Debug, Clone, Copy)]
struct MetricRange {
    id: MetricId,
    low: u64,
    high: u64,
    style: ValueStyle,
    trend_low: i64,
    trend_high: i64,
    baseline: &'static str,
}

const METRIC_RANGES: [MetricRange; 5] = [
    MetricRange {
        id: MetricId::TotalFgStock,
        low: 120_000,
        high: 130_000,
        style: ValueStyle::Grouped,
        trend_low: -3,
        trend_high: 8,
        baseline: "1,24,580",
    },
    MetricRange {
        id: MetricId::TotalDispatch,
        low: 40_000,
        high: 50_000,
        style: ValueStyle::Grouped,
        trend_low: 5,
        trend_high: 15,
        baseline: "42,350",
    },
    MetricRange {
        id: MetricId::PendingOrders,
        low: 25_000,
        high: 35_000,
        style: ValueStyle::Grouped,
        trend_low: -5,
        trend_high: 25,
        baseline: "28,750",
    },
    MetricRange {
        id: MetricId::SlowMovingValue,
        low: 40,
        high: 55,
        style: ValueStyle::OneDecimal,
        trend_low: -2,
        trend_high: 12,
        baseline: "45.2",
    },
    MetricRange {
        id: MetricId::NonMovingValue,
        low: 15,
        high: 22,
        style: ValueStyle::OneDecimal,
        trend_low: -5,
        trend_high: 5,
        baseline: "18.5",
    },
];

struct InsightTemplate {
    message: &'static str,
    value: Option<&'static str>,
}

const fn template(message: &'static str, value: Option<&'static str>) -> InsightTemplate {
    InsightTemplate { message, value }
}

const ALERT_TEMPLATES: [InsightTemplate; 3] = [
    template("Working capital blockage detected", Some("₹ 22.3 Lakhs")),
    template("Slow-moving stock threshold breach", Some("₹ 15.8 Lakhs")),
    template("FG ageing > 90 days critical level", Some("12,500 Kg")),
];

const WARNING_TEMPLATES: [InsightTemplate; 3] = [
    template("Shade Burgundy – Approaching non-moving status", None),
    template("Order ORD-2024-007 due in 2 days", None),
    template("Stock rotation declining for White shade", None),
];

const RECOMMENDATION_TEMPLATES: [InsightTemplate; 3] = [
    template("Dispatch FG-012 recommended – Urgent order match", None),
    template("Prioritize Navy Blue dispatch – High margin", None),
    template("Bundle slow-moving items for clearance sale", None),
];

const INFO_TEMPLATES: [InsightTemplate; 3] = [
    template("Dispatch efficiency improved by 8% today", None),
    template("New order received from Arvind Mills", None),
    template("Stock replenishment completed for Black shade", None),
];

fn templates_for(category: InsightCategory) -> &'static [InsightTemplate] {
    match category {
        InsightCategory::Alert => &ALERT_TEMPLATES,
        InsightCategory::Warning => &WARNING_TEMPLATES,
        InsightCategory::Recommendation => &RECOMMENDATION_TEMPLATES,
        InsightCategory::Info => &INFO_TEMPLATES,
    }
}

/// # Update Generator
///
/// Produces `MetricUpdate` and `InsightEvent` values from a pluggable random source.
pub struct UpdateGenerator {
    rng: BoxedRng,
    last_values: HashMap<MetricId, String>,
}

impl UpdateGenerator {
    pub fn new(rng: BoxedRng) -> Self {
        let last_values = METRIC_RANGES
            .iter()
            .map(|range| (range.id, range.baseline.to_string()))
            .collect();
        Self { rng, last_values }
    }

    /// Seeded from `seed` when given, otherwise from the OS.
    pub fn from_seed(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::new(Box::new(rng))
    }

    pub fn next_metric(&mut self) -> MetricUpdate {
        let range = METRIC_RANGES[self.rng.random_range(0..METRIC_RANGES.len())];
        let raw = self.rng.random_range(range.low..=range.high);
        let new_value = match range.style {
            ValueStyle::Grouped => format_indian(raw),
            ValueStyle::OneDecimal => format_fixed1(raw as f64),
        };
        let trend = self.rng.random_range(range.trend_low..=range.trend_high);

        let previous_value = self
            .last_values
            .insert(range.id, new_value.clone())
            .unwrap_or_else(|| range.baseline.to_string());

        MetricUpdate::from_signed_trend(range.id, new_value, previous_value, trend as f64)
    }

    pub fn next_insight(&mut self, now: DateTime<Utc>) -> InsightEvent {
        let category = InsightCategory::ALL[self.rng.random_range(0..InsightCategory::ALL.len())];
        let choices = templates_for(category);
        let chosen = &choices[self.rng.random_range(0..choices.len())];

        InsightEvent {
            id: next_insight_id(now),
            category,
            icon_key: category.default_icon().to_string(),
            message: chosen.message.to_string(),
            value: chosen.value.map(str::to_string),
            emitted_at: "Just now".to_string(),
            created_at: now,
        }
    }
}

/// # Generator Handle
///
/// The two running tick tasks of one connected session. Consumed by
/// `cancel`, so the cancellation happens exactly once.
pub(crate) struct GeneratorHandle {
    token: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl GeneratorHandle {
    /// Starts the metric and insight tickers. Each callback returns `false`
    /// once the engine behind it is gone, which ends its ticker.
    pub(crate) fn start<M, I>(
        runtime: &Handle,
        metric_period: Duration,
        insight_period: Duration,
        on_metric: M,
        on_insight: I,
    ) -> Self
    where
        M: FnMut() -> bool + Send + 'static,
        I: FnMut() -> bool + Send + 'static,
    {
        let token = CancellationToken::new();
        let tasks = vec![
            spawn_ticker(runtime, token.clone(), "metric", metric_period, on_metric),
            spawn_ticker(runtime, token.clone(), "insight", insight_period, on_insight),
        ];
        Self { token, tasks }
    }

    pub(crate) fn cancel(self) {
        self.token.cancel();
        for task in self.tasks {
            task.abort();
        }
        log::debug!("Generator timers cancelled");
    }
}

fn spawn_ticker<F>(
    runtime: &Handle,
    token: CancellationToken,
    label: &'static str,
    period: Duration,
    mut tick: F,
) -> JoinHandle<()>
where
    F: FnMut() -> bool + Send + 'static,
{
    runtime.spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    if token.is_cancelled() || !tick() {
                        break;
                    }
                }
            }
        }
        log::debug!("{} ticker stopped", label);
    })
}
