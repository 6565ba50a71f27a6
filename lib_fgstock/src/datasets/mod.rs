//! # Data Sources
//!
//! The static datasets behind the dashboard's cards, grids and charts. The
//! engine never reaches for them directly: the composition root injects a
//! `DashboardDataSource`, and the engine only borrows its seed insights.
//!
//! ## Contained Modules:
//! - **`mock`**: `MockDataset`, the in-memory finished-goods figures the
//!   dashboard ships with.

use chrono::{DateTime, Utc};

use crate::models::{
    ChartData, FastMovingItem, InsightEvent, KpiData, NonMovingItem, PendingOrder, StockAgeing,
};

/// In-memory finished-goods dataset.
pub mod mock;

pub use mock::MockDataset;

/// # Dashboard Data Source
///
/// Read-only provider of everything the dashboard renders outside of the
/// live feed. Implementations must be cheap to call repeatedly.
pub trait DashboardDataSource: Send + Sync {
    /// KPI cards, in display order.
    fn kpis(&self) -> Vec<KpiData>;
    /// Open orders grid.
    fn pending_orders(&self) -> Vec<PendingOrder>;
    /// Stock ageing grid.
    fn stock_ageing(&self) -> Vec<StockAgeing>;
    /// Non-moving stock grid.
    fn non_moving_items(&self) -> Vec<NonMovingItem>;
    /// Fast-moving items grid.
    fn fast_moving_items(&self) -> Vec<FastMovingItem>;
    /// Insights present before the live feed starts, newest first, with
    /// recency computed relative to `now`.
    fn seed_insights(&self, now: DateTime<Utc>) -> Vec<InsightEvent>;
    /// FG stock versus dispatch line chart.
    fn stock_dispatch_trend(&self) -> ChartData;
    /// Stock quantity per ageing bucket bar chart.
    fn stock_ageing_chart(&self) -> ChartData;
}
