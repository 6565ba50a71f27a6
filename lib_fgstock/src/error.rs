//! # Engine Errors
//!
//! Error types shared by the engine, its configuration layer, and the
//! connection backends.

use thiserror::Error;

#[derive(Debug, Error)]
/// # Engine Error
///
/// Failures that can surface from constructing or running the real-time engine.
/// Configuration problems are fatal and reported before any state is created.
pub enum EngineError {
    /// The supplied configuration failed validation.
    #[error("invalid engine configuration: {0}")]
    Config(#[from] ConfigError),

    /// An insight with the same id is already present in the ledger.
    #[error("duplicate insight id '{0}'")]
    DuplicateInsightId(String),

    /// The engine was built outside of a tokio runtime and has nowhere to run its timers.
    #[error("no tokio runtime available: {0}")]
    NoRuntime(String),
}

#[derive(Debug, Error)]
/// # Config Error
///
/// Raised while loading or validating an `EngineConfig`.
pub enum ConfigError {
    /// An I/O error occurred while reading a configuration file.
    #[error("I/O error occurred: {0}")]
    IoError(#[from] std::io::Error),

    /// The configuration file is not valid JSON for the expected shape.
    #[error("failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// The ledger capacity must be at least one.
    #[error("ledger capacity must be greater than zero")]
    ZeroCapacity,

    /// A timer period or latency was zero.
    #[error("{field} must be greater than zero")]
    ZeroPeriod {
        /// Name of the offending field.
        field: &'static str,
    },

    /// The reconnect base delay exceeds the reconnect ceiling.
    #[error("reconnect base delay ({base_ms} ms) exceeds max delay ({max_ms} ms)")]
    BackoffRange {
        /// Configured base delay in milliseconds.
        base_ms: u64,
        /// Configured maximum delay in milliseconds.
        max_ms: u64,
    },
}

#[derive(Debug, Clone, Error)]
/// # Backend Error
///
/// A transport-level failure reported by a `ConnectionBackend` while opening
/// its connection. The engine maps it onto the `connecting -> disconnected` edge.
pub enum BackendError {
    /// The remote endpoint could not be reached.
    #[error("endpoint unreachable: {0}")]
    Unreachable(String),
}
