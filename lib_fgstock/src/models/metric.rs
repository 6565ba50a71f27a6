use serde::{Deserialize, Serialize};
use std::fmt;

/// # Metric Identifier
///
/// Stable identifiers of the KPI cards on the dashboard. The serialized form
/// matches the card ids used by the front end (`total-fg-stock`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetricId {
    /// Total finished-goods stock in kilograms.
    TotalFgStock,
    /// Total dispatched quantity in kilograms.
    TotalDispatch,
    /// Quantity tied up in pending orders, in kilograms.
    PendingOrders,
    /// Total stock value in crores. Not produced by the generator.
    TotalStockValue,
    /// Value of slow-moving stock in lakhs.
    SlowMovingValue,
    /// Value of non-moving stock in lakhs.
    NonMovingValue,
}

impl MetricId {
    /// Every known metric, in dashboard card order.
    pub const ALL: [MetricId; 6] = [
        MetricId::TotalFgStock,
        MetricId::TotalDispatch,
        MetricId::PendingOrders,
        MetricId::TotalStockValue,
        MetricId::SlowMovingValue,
        MetricId::NonMovingValue,
    ];

    /// The kebab-case card id.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricId::TotalFgStock => "total-fg-stock",
            MetricId::TotalDispatch => "total-dispatch",
            MetricId::PendingOrders => "pending-orders",
            MetricId::TotalStockValue => "total-stock-value",
            MetricId::SlowMovingValue => "slow-moving-value",
            MetricId::NonMovingValue => "non-moving-value",
        }
    }

    /// Whether an upward movement of this metric is bad news.
    pub fn up_is_negative(&self) -> bool {
        matches!(
            self,
            MetricId::PendingOrders | MetricId::SlowMovingValue | MetricId::NonMovingValue
        )
    }
}

impl fmt::Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a metric's most recent movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    /// Value went up.
    Up,
    /// Value went down.
    Down,
    /// No movement.
    #[default]
    Neutral,
}

impl TrendDirection {
    /// Derives the direction from a signed trend.
    pub fn from_signed(trend: f64) -> Self {
        if trend > 0.0 {
            TrendDirection::Up
        } else if trend < 0.0 {
            TrendDirection::Down
        } else {
            TrendDirection::Neutral
        }
    }
}

/// # Metric Update
///
/// A single synthesized change to one KPI card. Constructed once by the
/// generator and forwarded verbatim to every metric-update subscriber.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricUpdate {
    /// Which card changed.
    pub metric_id: MetricId,
    /// Display-formatted new value.
    pub new_value: String,
    /// Display-formatted value the card showed before this update.
    pub previous_value: String,
    /// Absolute size of the trend, in percent. Never negative.
    pub trend_magnitude: f64,
    /// Direction of the trend.
    pub trend_direction: TrendDirection,
}

impl MetricUpdate {
    /// Builds an update from a signed trend, splitting it into magnitude and direction.
    pub fn from_signed_trend(
        metric_id: MetricId,
        new_value: String,
        previous_value: String,
        signed_trend: f64,
    ) -> Self {
        Self {
            metric_id,
            new_value,
            previous_value,
            trend_magnitude: signed_trend.abs(),
            trend_direction: TrendDirection::from_signed(signed_trend),
        }
    }
}
