use chrono::{DateTime, Duration, Utc};

use super::DashboardDataSource;
use crate::models::{
    ChartColor, ChartData, ChartDataset, FastMovingItem, InsightCategory, InsightEvent, KpiData,
    MetricId, NonMovingItem, OrderStatus, PendingOrder, StockAgeing, StockHealth, StockLevel,
    TrendDirection,
};
use crate::utils::format::format_recency;

/// # Mock Dataset
///
/// The finished-goods figures the dashboard ships with. Stateless; every call
/// builds fresh values.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockDataset;

impl MockDataset {
    pub fn new() -> Self {
        Self
    }
}

fn kpi(
    id: MetricId,
    label: &str,
    value: &str,
    unit: &str,
    trend: f64,
    direction: TrendDirection,
    status: StockHealth,
) -> KpiData {
    KpiData {
        id,
        label: label.to_string(),
        value: value.to_string(),
        unit: unit.to_string(),
        trend: Some(trend),
        trend_direction: Some(direction),
        status: Some(status),
    }
}

fn order(
    order_id: &str,
    customer: &str,
    shade: &str,
    quantity: u64,
    due_date: &str,
    status: OrderStatus,
    days_remaining: i64,
) -> PendingOrder {
    PendingOrder {
        order_id: order_id.to_string(),
        customer: customer.to_string(),
        shade: shade.to_string(),
        quantity,
        due_date: due_date.to_string(),
        status,
        days_remaining,
    }
}

fn ageing(
    item_code: &str,
    shade: &str,
    quantity: u64,
    age_in_days: u32,
    value: u64,
    status: StockHealth,
) -> StockAgeing {
    StockAgeing {
        item_code: item_code.to_string(),
        shade: shade.to_string(),
        quantity,
        age_in_days,
        value,
        status,
    }
}

fn non_moving(
    item_code: &str,
    shade: &str,
    quantity: u64,
    last_movement: &str,
    days_stagnant: u32,
    blocked_value: u64,
) -> NonMovingItem {
    NonMovingItem {
        item_code: item_code.to_string(),
        shade: shade.to_string(),
        quantity,
        last_movement: last_movement.to_string(),
        days_stagnant,
        blocked_value,
    }
}

fn fast_moving(
    item_code: &str,
    shade: &str,
    avg_dispatch: u64,
    current_stock: u64,
    reorder_level: u64,
    status: StockLevel,
) -> FastMovingItem {
    FastMovingItem {
        item_code: item_code.to_string(),
        shade: shade.to_string(),
        avg_dispatch,
        current_stock,
        reorder_level,
        status,
    }
}

fn seed(
    now: DateTime<Utc>,
    ordinal: u32,
    category: InsightCategory,
    icon_key: &str,
    message: &str,
    value: Option<&str>,
    minutes_ago: i64,
) -> InsightEvent {
    let age = Duration::minutes(minutes_ago);
    InsightEvent {
        id: format!("insight-{}", ordinal),
        category,
        icon_key: icon_key.to_string(),
        message: message.to_string(),
        value: value.map(str::to_string),
        emitted_at: format_recency(age.to_std().unwrap_or_default()),
        created_at: now - age,
    }
}

impl DashboardDataSource for MockDataset {
    fn kpis(&self) -> Vec<KpiData> {
        use StockHealth::*;
        use TrendDirection::*;
        vec![
            kpi(MetricId::TotalFgStock, "Total FG Stock", "1,24,580", "Kg", 5.2, Up, Healthy),
            kpi(MetricId::TotalDispatch, "Total Dispatch", "42,350", "Kg", 12.8, Up, Healthy),
            kpi(MetricId::PendingOrders, "Pending Orders", "28,750", "Kg", 19.3, Up, Warning),
            kpi(MetricId::TotalStockValue, "Total Stock Value", "₹ 2.85", "Cr", 3.1, Up, Healthy),
            kpi(MetricId::SlowMovingValue, "Slow-Moving Value", "₹ 45.2", "Lakhs", 8.5, Up, Warning),
            kpi(MetricId::NonMovingValue, "Non-Moving Value", "₹ 18.5", "Lakhs", 2.3, Down, Critical),
        ]
    }

    fn pending_orders(&self) -> Vec<PendingOrder> {
        use OrderStatus::*;
        vec![
            order("ORD-2024-001", "Arvind Mills", "Navy Blue", 2500, "2024-01-28", Urgent, 3),
            order("ORD-2024-002", "Raymond Ltd", "Charcoal Grey", 1800, "2024-01-30", Pending, 5),
            order("ORD-2024-003", "Welspun India", "Olive Green", 3200, "2024-01-25", Overdue, -2),
            order("ORD-2024-004", "Vardhman Textiles", "Black", 1500, "2024-02-05", Pending, 11),
            order("ORD-2024-005", "Trident Group", "White", 4200, "2024-02-02", Pending, 8),
            order("ORD-2024-006", "Indo Count", "Beige", 2100, "2024-01-27", Urgent, 2),
        ]
    }

    fn stock_ageing(&self) -> Vec<StockAgeing> {
        use StockHealth::*;
        vec![
            ageing("FG-001", "Navy Blue", 8500, 15, 425_000, Healthy),
            ageing("FG-002", "Charcoal Grey", 6200, 45, 310_000, Warning),
            ageing("FG-003", "Olive Green", 3800, 82, 190_000, Critical),
            ageing("FG-004", "Black", 12500, 22, 625_000, Healthy),
            ageing("FG-005", "White", 9800, 58, 490_000, Warning),
            ageing("FG-006", "Burgundy", 2400, 95, 120_000, Critical),
        ]
    }

    fn non_moving_items(&self) -> Vec<NonMovingItem> {
        vec![
            non_moving("FG-103", "Salmon Pink", 1200, "2023-10-15", 102, 180_000),
            non_moving("FG-087", "Mustard Yellow", 850, "2023-11-02", 84, 127_500),
            non_moving("FG-142", "Teal", 620, "2023-09-28", 119, 93_000),
            non_moving("FG-091", "Lavender", 980, "2023-10-22", 95, 147_000),
            non_moving("FG-156", "Coral", 540, "2023-11-10", 76, 81_000),
        ]
    }

    fn fast_moving_items(&self) -> Vec<FastMovingItem> {
        use StockLevel::*;
        vec![
            fast_moving("FG-001", "Navy Blue", 2500, 8500, 5000, Adequate),
            fast_moving("FG-004", "Black", 3200, 12500, 6000, Adequate),
            fast_moving("FG-008", "White", 2800, 4200, 5500, Low),
            fast_moving("FG-012", "Grey Melange", 1800, 1500, 3500, Critical),
            fast_moving("FG-015", "Indigo", 2100, 6800, 4000, Adequate),
        ]
    }

    fn seed_insights(&self, now: DateTime<Utc>) -> Vec<InsightEvent> {
        use InsightCategory::*;
        vec![
            seed(now, 1, Alert, "alert-triangle", "Blocked in FG stock > 75 days", Some("₹ 18.5 Lakhs"), 2),
            seed(now, 2, Warning, "clock", "Shade Navy – Non-moving for 80 days", None, 5),
            seed(now, 3, Recommendation, "truck", "Dispatch FG005 recommended – High demand predicted", None, 12),
            seed(now, 4, Info, "trending-up", "Pending orders increased by 19% this week", None, 25),
            seed(now, 5, Recommendation, "package", "Reorder Grey Melange – Stock below threshold", None, 32),
            seed(now, 6, Alert, "alert-circle", "Order ORD-2024-003 is 2 days overdue", None, 45),
        ]
    }

    fn stock_dispatch_trend(&self) -> ChartData {
        ChartData {
            labels: ["Jan 1", "Jan 5", "Jan 10", "Jan 15", "Jan 20", "Jan 25"]
                .into_iter()
                .map(String::from)
                .collect(),
            datasets: vec![
                ChartDataset {
                    label: "FG Stock (Kg)".to_string(),
                    data: vec![118500.0, 122000.0, 119800.0, 125400.0, 121000.0, 124580.0],
                    border_color: Some("#0F172A".to_string()),
                    background_color: Some(ChartColor::Single("rgba(15, 23, 42, 0.1)".to_string())),
                    fill: Some(true),
                    tension: Some(0.4),
                },
                ChartDataset {
                    label: "Dispatch (Kg)".to_string(),
                    data: vec![35200.0, 38500.0, 41200.0, 39800.0, 44500.0, 42350.0],
                    border_color: Some("#10B981".to_string()),
                    background_color: Some(ChartColor::Single("rgba(16, 185, 129, 0.1)".to_string())),
                    fill: Some(true),
                    tension: Some(0.4),
                },
            ],
        }
    }

    fn stock_ageing_chart(&self) -> ChartData {
        ChartData {
            labels: ["0-30 Days", "31-60 Days", "61-90 Days", "90+ Days"]
                .into_iter()
                .map(String::from)
                .collect(),
            datasets: vec![ChartDataset {
                label: "Stock Quantity (Kg)".to_string(),
                data: vec![52000.0, 38500.0, 22000.0, 12080.0],
                border_color: None,
                background_color: Some(ChartColor::PerPoint(
                    ["#10B981", "#F59E0B", "#EF4444", "#7C3AED"]
                        .into_iter()
                        .map(String::from)
                        .collect(),
                )),
                fill: None,
                tension: None,
            }],
        }
    }
}
