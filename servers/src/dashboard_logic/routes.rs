//! # HTTP Routes
//!
//! Read-only JSON API over the mock datasets and the live dashboard state.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};

use lib_fgstock::core::{DashboardAggregator, DashboardState, RealtimeEngine};
use lib_fgstock::datasets::DashboardDataSource;
use lib_fgstock::models::{ChartData, FastMovingItem, NonMovingItem, PendingOrder, StockAgeing};

/// # Application State
///
/// Shared by every handler. Owns the engine, so dropping the last reference
/// tears the feed down.
pub struct AppState {
    pub engine: RealtimeEngine,
    pub aggregator: DashboardAggregator,
    pub dataset: Arc<dyn DashboardDataSource>,
}

pub type SharedState = Arc<AppState>;

pub fn router(state: SharedState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/dashboard", get(dashboard))
        .route("/api/insights/read", post(mark_insights_read))
        .route("/api/orders/pending", get(pending_orders))
        .route("/api/stock/ageing", get(stock_ageing))
        .route("/api/stock/non-moving", get(non_moving))
        .route("/api/stock/fast-moving", get(fast_moving))
        .route("/api/charts/stock-dispatch", get(stock_dispatch_chart))
        .route("/api/charts/stock-ageing", get(stock_ageing_chart))
        .layer(cors)
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "service": "fg-stock-dashboard-api" }))
}

/// Current dashboard state, with insight recency re-rendered for this request.
async fn dashboard(State(state): State<SharedState>) -> Json<DashboardState> {
    let now = Utc::now();
    let mut view = state.aggregator.state();
    view.insights = view.insights.iter().map(|i| i.refreshed(now)).collect();
    Json(view)
}

async fn mark_insights_read(State(state): State<SharedState>) -> StatusCode {
    state.aggregator.mark_insights_read();
    StatusCode::NO_CONTENT
}

async fn pending_orders(State(state): State<SharedState>) -> Json<Vec<PendingOrder>> {
    Json(state.dataset.pending_orders())
}

async fn stock_ageing(State(state): State<SharedState>) -> Json<Vec<StockAgeing>> {
    Json(state.dataset.stock_ageing())
}

async fn non_moving(State(state): State<SharedState>) -> Json<Vec<NonMovingItem>> {
    Json(state.dataset.non_moving_items())
}

async fn fast_moving(State(state): State<SharedState>) -> Json<Vec<FastMovingItem>> {
    Json(state.dataset.fast_moving_items())
}

async fn stock_dispatch_chart(State(state): State<SharedState>) -> Json<ChartData> {
    Json(state.dataset.stock_dispatch_trend())
}

async fn stock_ageing_chart(State(state): State<SharedState>) -> Json<ChartData> {
    Json(state.dataset.stock_ageing_chart())
}
