//! # Connection Layer
//!
//! What the engine talks to when it "connects", and how it retries when that
//! fails.
//!
//! ## Core Components:
//! - **`ConnectionBackend`**: opens a connection and resolves once the
//!   handshake succeeds or fails. The engine owns the timing around it
//!   (cancellation, retries, status transitions).
//! - **`MockBackend`**: simulated transport with a fixed handshake latency and
//!   optionally scripted failures.
//! - **`RetryPolicy`**: bounded exponential backoff, `base * 2^(attempt-1)`
//!   capped at a ceiling.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use crate::configs::EngineConfig;
use crate::error::BackendError;

/// # Connection Backend
///
/// A transport the engine can open. `open` must not touch engine state; the
/// returned future is raced against a cancellation token and simply dropped
/// when the engine disconnects first.
pub trait ConnectionBackend: Send + Sync {
    /// Starts a handshake. Resolves `Ok(())` once the connection is usable.
    fn open(&self) -> BoxFuture<'static, Result<(), BackendError>>;

    /// Releases the connection. Called on disconnect and teardown.
    fn close(&self) {}

    /// Short label for logs.
    fn name(&self) -> &str {
        "backend"
    }
}

/// # Mock Backend
///
/// Simulated transport. Every handshake takes `latency`; the first
/// `failures` handshakes fail with `BackendError::Unreachable`.
#[derive(Debug)]
pub struct MockBackend {
    latency: Duration,
    failures_left: AtomicU32,
    always_fail: bool,
}

impl MockBackend {
    /// A backend whose handshakes always succeed after `latency`.
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            failures_left: AtomicU32::new(0),
            always_fail: false,
        }
    }

    /// Fails the first `failures` handshakes, then succeeds.
    pub fn flaky(latency: Duration, failures: u32) -> Self {
        Self {
            latency,
            failures_left: AtomicU32::new(failures),
            always_fail: false,
        }
    }

    /// Never completes a handshake.
    pub fn unreachable(latency: Duration) -> Self {
        Self {
            latency,
            failures_left: AtomicU32::new(0),
            always_fail: true,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.connect_latency())
    }

    fn take_failure(&self) -> bool {
        if self.always_fail {
            return true;
        }
        self.failures_left
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |left| left.checked_sub(1))
            .is_ok()
    }
}

impl ConnectionBackend for MockBackend {
    fn open(&self) -> BoxFuture<'static, Result<(), BackendError>> {
        let latency = self.latency;
        let fail = self.take_failure();
        async move {
            tokio::time::sleep(latency).await;
            if fail {
                Err(BackendError::Unreachable("mock endpoint refused the connection".to_string()))
            } else {
                Ok(())
            }
        }
        .boxed()
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// # Retry Policy
///
/// Bounded exponential backoff used after a failed handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            max_attempts: config.max_reconnect_attempts,
            base_delay: config.reconnect_base_delay(),
            max_delay: config.reconnect_max_delay(),
        }
    }

    /// Whether failed attempt number `attempt` (1-based) may be retried.
    pub fn allows(&self, attempt: u32) -> bool {
        attempt >= 1 && attempt <= self.max_attempts
    }

    /// Wait before retrying after failed attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let factor = 1u32 << exponent;
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }
}
