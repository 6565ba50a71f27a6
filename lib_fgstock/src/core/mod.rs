//! # Core Engine Module
//!
//! The real-time update distribution engine behind the dashboard. It models a
//! live connection, synthesizes a stream of KPI and insight events while that
//! connection is up, and fans the events out to observers with defined
//! ordering and lifecycle guarantees.
//!
//! ## Core Components:
//!
//! - **`engine`**: `RealtimeEngine`, the explicitly owned object tying the
//!   pieces together. Hosts the connection state machine and serializes every
//!   mutation and notification on one timeline.
//!
//! - **`connection`**: the pluggable `ConnectionBackend`, the simulated
//!   `MockBackend`, and the bounded exponential `RetryPolicy` applied when a
//!   handshake fails.
//!
//! - **`generator`**: metric and insight synthesis from a seedable random
//!   source, plus the cancellable tickers that drive it while connected.
//!
//! - **`ledger`**: the bounded, newest-first `InsightLedger` handing out
//!   immutable snapshots.
//!
//! - **`hub`**: the observer registry with its four channels, replay-latest
//!   and fire-and-forget, and per-observer failure isolation.
//!
//! - **`aggregator`**: `DashboardAggregator`, a consumer folding all four
//!   channels into display state.

#![forbid(unsafe_code)]

/// Folds engine events into dashboard display state.
pub mod aggregator;
/// Connection backends and reconnect policy.
pub mod connection;
/// The engine and its builder.
pub mod engine;
/// Metric and insight synthesis, and the tickers driving it.
pub mod generator;
/// Observer registry and delivery.
pub mod hub;
/// Bounded insight history.
pub mod ledger;

// --- Public API Re-exports ---
pub use aggregator::{DashboardAggregator, DashboardState};
pub use connection::{ConnectionBackend, MockBackend, RetryPolicy};
pub use engine::{EngineBuilder, RealtimeEngine};
pub use generator::{BoxedRng, UpdateGenerator};
pub use hub::{ChannelKind, EventHub, Subscription};
pub use ledger::InsightLedger;
