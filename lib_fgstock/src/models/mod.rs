//! # Data Models
//!
//! Plain value types that flow out of the engine and the mock data sources.
//! Nothing in here owns behaviour beyond small derived helpers; the engine in
//! `core` produces these values and observers consume them.

/// Connection lifecycle states.
pub mod status;
/// Metric identifiers and the `MetricUpdate` event.
pub mod metric;
/// Insight categories and the `InsightEvent` event.
pub mod insight;
/// KPI cards, tables and chart rows served by the dashboard.
pub mod dashboard;

pub use status::ConnectionStatus;
pub use metric::{MetricId, MetricUpdate, TrendDirection};
pub use insight::{InsightCategory, InsightEvent, InsightSnapshot};
pub use dashboard::{
    ChartColor, ChartData, ChartDataset, FastMovingItem, KpiData, NonMovingItem, OrderStatus,
    PendingOrder, StockAgeing, StockHealth, StockLevel, TrendSentiment,
};
