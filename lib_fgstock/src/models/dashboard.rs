use serde::{Deserialize, Serialize};
use std::fmt;

use super::metric::{MetricId, MetricUpdate, TrendDirection};
use crate::utils::format::{format_currency, format_quantity};

const CURRENCY_PREFIX: &str = "₹ ";

/// Health colour shared by KPI cards and stock ageing rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockHealth {
    /// Within normal bounds.
    Healthy,
    /// Needs watching.
    Warning,
    /// Needs action.
    Critical,
}

/// Whether a KPI's trend should be read as good or bad news.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendSentiment {
    /// Moving the right way.
    Positive,
    /// Moving the wrong way.
    Negative,
    /// Flat or unknown.
    Neutral,
}

/// # KPI Card
///
/// One tile on the top row of the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiData {
    /// Card id.
    pub id: MetricId,
    /// Title shown on the card.
    pub label: String,
    /// Display value, possibly with a currency prefix.
    pub value: String,
    /// Unit suffix (`Kg`, `Lakhs`, `Cr`).
    pub unit: String,
    /// Trend percentage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend: Option<f64>,
    /// Trend direction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend_direction: Option<TrendDirection>,
    /// Health colour of the card.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StockHealth>,
}

impl KpiData {
    /// Classifies the current trend. For stock-risk cards an upward move is negative.
    pub fn trend_sentiment(&self) -> TrendSentiment {
        let negative_when_up = self.id.up_is_negative();
        match self.trend_direction {
            Some(TrendDirection::Up) if negative_when_up => TrendSentiment::Negative,
            Some(TrendDirection::Up) => TrendSentiment::Positive,
            Some(TrendDirection::Down) if negative_when_up => TrendSentiment::Positive,
            Some(TrendDirection::Down) => TrendSentiment::Negative,
            Some(TrendDirection::Neutral) | None => TrendSentiment::Neutral,
        }
    }

    /// Applies a live update to this card. A currency prefix on the current
    /// value is carried over to the new one.
    pub fn apply_update(&mut self, update: &MetricUpdate) {
        self.value = if self.value.starts_with(CURRENCY_PREFIX)
            && !update.new_value.starts_with(CURRENCY_PREFIX)
        {
            format!("{}{}", CURRENCY_PREFIX, update.new_value)
        } else {
            update.new_value.clone()
        };
        self.trend = Some(update.trend_magnitude);
        self.trend_direction = Some(update.trend_direction);
    }
}

/// Urgency of an open order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// On schedule.
    Pending,
    /// Due within a few days.
    Urgent,
    /// Past its due date.
    Overdue,
}

/// Row of the pending orders grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingOrder {
    pub order_id: String,
    pub customer: String,
    pub shade: String,
    pub quantity: u64,
    pub due_date: String,
    pub status: OrderStatus,
    /// Negative once the order is overdue.
    pub days_remaining: i64,
}

/// Row of the stock ageing grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAgeing {
    pub item_code: String,
    pub shade: String,
    pub quantity: u64,
    pub age_in_days: u32,
    pub value: u64,
    pub status: StockHealth,
}

/// Row of the non-moving stock grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NonMovingItem {
    pub item_code: String,
    pub shade: String,
    pub quantity: u64,
    pub last_movement: String,
    pub days_stagnant: u32,
    pub blocked_value: u64,
}

/// Stock cover of a fast-moving item relative to its reorder level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockLevel {
    Adequate,
    Low,
    Critical,
}

/// Row of the fast-moving items grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FastMovingItem {
    pub item_code: String,
    pub shade: String,
    pub avg_dispatch: u64,
    pub current_stock: u64,
    pub reorder_level: u64,
    pub status: StockLevel,
}

// Grid rows render the way the dashboard tables show them: quantities in Kg,
// money in rupees (lakhs from one lakh upward).

impl fmt::Display for PendingOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | {} | {} | due {} ({} days) | {:?}",
            self.order_id,
            self.customer,
            self.shade,
            format_quantity(self.quantity),
            self.due_date,
            self.days_remaining,
            self.status
        )
    }
}

impl fmt::Display for StockAgeing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | {} | {} days | {} | {:?}",
            self.item_code,
            self.shade,
            format_quantity(self.quantity),
            self.age_in_days,
            format_currency(self.value),
            self.status
        )
    }
}

impl fmt::Display for NonMovingItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | {} | last moved {} ({} days) | {} blocked",
            self.item_code,
            self.shade,
            format_quantity(self.quantity),
            self.last_movement,
            self.days_stagnant,
            format_currency(self.blocked_value)
        )
    }
}

impl fmt::Display for FastMovingItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | {}/day | stock {} | reorder at {} | {:?}",
            self.item_code,
            self.shade,
            format_quantity(self.avg_dispatch),
            format_quantity(self.current_stock),
            format_quantity(self.reorder_level),
            self.status
        )
    }
}

/// Fill colour of a chart series: one colour, or one per bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChartColor {
    Single(String),
    PerPoint(Vec<String>),
}

/// One series of a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDataset {
    pub label: String,
    pub data: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<ChartColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tension: Option<f64>,
}

/// Labels plus series, ready for the chart widgets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<ChartDataset>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(id: MetricId, value: &str, direction: Option<TrendDirection>) -> KpiData {
        KpiData {
            id,
            label: "Card".into(),
            value: value.into(),
            unit: "Lakhs".into(),
            trend: Some(1.0),
            trend_direction: direction,
            status: Some(StockHealth::Warning),
        }
    }

    #[test]
    fn upward_pending_orders_read_as_negative() {
        let kpi = card(MetricId::PendingOrders, "28,750", Some(TrendDirection::Up));
        assert_eq!(kpi.trend_sentiment(), TrendSentiment::Negative);
        let kpi = card(MetricId::PendingOrders, "28,750", Some(TrendDirection::Down));
        assert_eq!(kpi.trend_sentiment(), TrendSentiment::Positive);
    }

    #[test]
    fn upward_dispatch_reads_as_positive() {
        let kpi = card(MetricId::TotalDispatch, "42,350", Some(TrendDirection::Up));
        assert_eq!(kpi.trend_sentiment(), TrendSentiment::Positive);
        let kpi = card(MetricId::TotalDispatch, "42,350", None);
        assert_eq!(kpi.trend_sentiment(), TrendSentiment::Neutral);
    }

    #[test]
    fn update_keeps_currency_prefix() {
        let mut kpi = card(MetricId::SlowMovingValue, "₹ 45.2", Some(TrendDirection::Up));
        let update = MetricUpdate::from_signed_trend(
            MetricId::SlowMovingValue,
            "47.0".into(),
            "45.2".into(),
            -2.0,
        );
        kpi.apply_update(&update);
        assert_eq!(kpi.value, "₹ 47.0");
        assert_eq!(kpi.trend, Some(2.0));
        assert_eq!(kpi.trend_direction, Some(TrendDirection::Down));
    }

    #[test]
    fn grid_rows_render_money_in_lakhs_and_quantities_in_kg() {
        let row = StockAgeing {
            item_code: "FG-001".into(),
            shade: "Navy Blue".into(),
            quantity: 2_500,
            age_in_days: 95,
            value: 425_000,
            status: StockHealth::Critical,
        };
        assert_eq!(row.to_string(), "FG-001 | Navy Blue | 2,500 Kg | 95 days | ₹ 4.25 L | Critical");

        let row = NonMovingItem {
            item_code: "FG-017".into(),
            shade: "Grey".into(),
            quantity: 1_200,
            last_movement: "2024-01-02".into(),
            days_stagnant: 120,
            blocked_value: 95_000,
        };
        assert!(row.to_string().ends_with("₹ 95,000 blocked"));
    }
}
