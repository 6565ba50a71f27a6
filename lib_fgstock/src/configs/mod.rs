//! # Configuration Modules
//!
//! Engine tunables and their validation. Binaries layer their own
//! CLI/environment handling on top and hand the result to the engine.

/// Engine tunables, loaded from JSON and validated before use.
pub mod engine_config;

pub use engine_config::EngineConfig;
