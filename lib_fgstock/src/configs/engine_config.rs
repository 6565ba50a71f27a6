use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

/// # Engine Config
///
/// Tunables of the real-time engine. Every field has a default matching the
/// dashboard's reference behaviour, so a JSON file only needs the keys it
/// wants to override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Maximum number of insights kept in the ledger.
    pub ledger_capacity: usize,
    /// Period of the metric tick, in milliseconds.
    pub metric_interval_ms: u64,
    /// Period of the insight tick, in milliseconds.
    pub insight_interval_ms: u64,
    /// Simulated handshake latency of the mock backend, in milliseconds.
    pub connect_latency_ms: u64,
    /// Failed attempts tolerated before the engine gives up reconnecting.
    pub max_reconnect_attempts: u32,
    /// First reconnect delay, doubled on each further failure.
    pub reconnect_base_delay_ms: u64,
    /// Ceiling for the reconnect delay.
    pub reconnect_max_delay_ms: u64,
    /// Seed for the generator's random source. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ledger_capacity: 10,
            metric_interval_ms: 20_000,
            insight_interval_ms: 30_000,
            connect_latency_ms: 1_000,
            max_reconnect_attempts: 5,
            reconnect_base_delay_ms: 1_000,
            reconnect_max_delay_ms: 60_000,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Reads a JSON config file and validates it.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Parses a JSON document and validates it.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ledger_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }

        let periods = [
            ("metricIntervalMs", self.metric_interval_ms),
            ("insightIntervalMs", self.insight_interval_ms),
            ("connectLatencyMs", self.connect_latency_ms),
            ("reconnectBaseDelayMs", self.reconnect_base_delay_ms),
        ];
        if let Some((field, _)) = periods.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::ZeroPeriod { field });
        }

        if self.reconnect_base_delay_ms > self.reconnect_max_delay_ms {
            return Err(ConfigError::BackoffRange {
                base_ms: self.reconnect_base_delay_ms,
                max_ms: self.reconnect_max_delay_ms,
            });
        }

        Ok(())
    }

    pub fn metric_interval(&self) -> Duration {
        Duration::from_millis(self.metric_interval_ms)
    }

    pub fn insight_interval(&self) -> Duration {
        Duration::from_millis(self.insight_interval_ms)
    }

    pub fn connect_latency(&self) -> Duration {
        Duration::from_millis(self.connect_latency_ms)
    }

    pub fn reconnect_base_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_base_delay_ms)
    }

    pub fn reconnect_max_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_max_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let config = EngineConfig {
            ledger_capacity: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroCapacity)));
    }

    #[test]
    fn zero_period_names_the_field() {
        let config = EngineConfig {
            insight_interval_ms: 0,
            ..EngineConfig::default()
        };
        match config.validate() {
            Err(ConfigError::ZeroPeriod { field }) => assert_eq!(field, "insightIntervalMs"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn inverted_backoff_range_is_rejected() {
        let config = EngineConfig {
            reconnect_base_delay_ms: 5_000,
            reconnect_max_delay_ms: 1_000,
            ..EngineConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::BackoffRange { .. })));
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "ledgerCapacity": 4, "seed": 7 }}"#).unwrap();

        let config = EngineConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.ledger_capacity, 4);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.metric_interval_ms, 20_000);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            EngineConfig::from_json_file(file.path()),
            Err(ConfigError::ParseError(_))
        ));
    }
}
