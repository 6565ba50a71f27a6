//! # lib_fgstock
//!
//! Real-time feed and data sources of the finished-goods stock dashboard.
//!
//! ```no_run
//! use lib_fgstock::configs::EngineConfig;
//! use lib_fgstock::core::RealtimeEngine;
//! use lib_fgstock::datasets::MockDataset;
//!
//! # async fn run() -> Result<(), lib_fgstock::error::EngineError> {
//! let engine = RealtimeEngine::new(EngineConfig::default(), &MockDataset::new())?;
//! let _status = engine.subscribe_connection_status(|status| println!("status: {}", status));
//! engine.connect();
//! # Ok(())
//! # }
//! ```

pub mod configs;
pub mod core;
pub mod datasets;
pub mod error;
pub mod models;
pub mod utils;

pub use crate::configs::EngineConfig;
pub use crate::core::{DashboardAggregator, RealtimeEngine, Subscription};
pub use crate::error::{BackendError, ConfigError, EngineError};
