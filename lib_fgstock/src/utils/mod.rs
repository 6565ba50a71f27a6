//! # Utilities Module
//!
//! General-purpose helpers that do not belong to the engine itself.
//!
//! ## Contained Modules:
//!
//! - **`format`**: number, currency, quantity and recency formatting for the
//!   dashboard's display strings.

/// Display formatting helpers.
pub mod format;
