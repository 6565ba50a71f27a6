use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use lib_fgstock::configs::EngineConfig;

const DEFAULT_CONFIG_FILE: &str = "server_dashboard.conf";

#[derive(Parser, Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[command(about = "FG Stock Dashboard API Server", version)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[arg(long, env = "DASHBOARD_PORT", help = "Port to listen on for HTTP clients.")]
    pub port: Option<u16>,

    #[arg(long, env = "DASHBOARD_CONFIG_PATH", help = "Path to the JSON configuration file.")]
    pub config_path: Option<PathBuf>,

    #[arg(long, env = "DASHBOARD_LOG_DIR", help = "Directory for log files.")]
    pub log_dir: Option<PathBuf>,

    #[arg(long, env = "DASHBOARD_LOG_PREFIX", help = "File name prefix of the log files.")]
    pub log_prefix: Option<String>,

    #[arg(long, env = "DASHBOARD_LOG_LEVEL", help = "Logging level (trace, debug, info, warn, error).")]
    pub log_level: Option<String>,

    #[arg(long, env = "DASHBOARD_LEDGER_CAPACITY", help = "Maximum number of insights kept in the ledger.")]
    pub ledger_capacity: Option<usize>,

    #[arg(long, env = "DASHBOARD_METRIC_INTERVAL_MS", help = "Milliseconds between metric updates.")]
    pub metric_interval_ms: Option<u64>,

    #[arg(long, env = "DASHBOARD_INSIGHT_INTERVAL_MS", help = "Milliseconds between new insights.")]
    pub insight_interval_ms: Option<u64>,

    #[arg(long, env = "DASHBOARD_CONNECT_LATENCY_MS", help = "Simulated connection handshake latency in milliseconds.")]
    pub connect_latency_ms: Option<u64>,

    #[arg(long, env = "DASHBOARD_MAX_RECONNECT_ATTEMPTS", help = "Failed handshakes tolerated before giving up.")]
    pub max_reconnect_attempts: Option<u32>,

    #[arg(long, env = "DASHBOARD_RECONNECT_BASE_DELAY_MS", help = "Base delay in milliseconds for reconnect attempts.")]
    pub reconnect_base_delay_ms: Option<u64>,

    #[arg(long, env = "DASHBOARD_RECONNECT_MAX_DELAY_MS", help = "Maximum delay in milliseconds for reconnect attempts.")]
    pub reconnect_max_delay_ms: Option<u64>,

    #[arg(long, env = "DASHBOARD_SEED", help = "Seed for the update generator. Random when omitted.")]
    pub seed: Option<u64>,
}

impl Config {
    // Merge two Config structs, where 'other' overrides 'self' for Some values
    fn merge(self, other: Config) -> Config {
        Config {
            port: other.port.or(self.port),
            config_path: other.config_path.or(self.config_path),
            log_dir: other.log_dir.or(self.log_dir),
            log_prefix: other.log_prefix.or(self.log_prefix),
            log_level: other.log_level.or(self.log_level),
            ledger_capacity: other.ledger_capacity.or(self.ledger_capacity),
            metric_interval_ms: other.metric_interval_ms.or(self.metric_interval_ms),
            insight_interval_ms: other.insight_interval_ms.or(self.insight_interval_ms),
            connect_latency_ms: other.connect_latency_ms.or(self.connect_latency_ms),
            max_reconnect_attempts: other.max_reconnect_attempts.or(self.max_reconnect_attempts),
            reconnect_base_delay_ms: other.reconnect_base_delay_ms.or(self.reconnect_base_delay_ms),
            reconnect_max_delay_ms: other.reconnect_max_delay_ms.or(self.reconnect_max_delay_ms),
            seed: other.seed.or(self.seed),
        }
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(8000)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(|| PathBuf::from("./logs"))
    }

    pub fn log_prefix(&self) -> &str {
        self.log_prefix.as_deref().unwrap_or("server_dashboard")
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    /// Engine tunables: engine defaults, overridden by whatever this config sets.
    pub fn engine_config(&self) -> EngineConfig {
        let defaults = EngineConfig::default();
        EngineConfig {
            ledger_capacity: self.ledger_capacity.unwrap_or(defaults.ledger_capacity),
            metric_interval_ms: self.metric_interval_ms.unwrap_or(defaults.metric_interval_ms),
            insight_interval_ms: self.insight_interval_ms.unwrap_or(defaults.insight_interval_ms),
            connect_latency_ms: self.connect_latency_ms.unwrap_or(defaults.connect_latency_ms),
            max_reconnect_attempts: self
                .max_reconnect_attempts
                .unwrap_or(defaults.max_reconnect_attempts),
            reconnect_base_delay_ms: self
                .reconnect_base_delay_ms
                .unwrap_or(defaults.reconnect_base_delay_ms),
            reconnect_max_delay_ms: self
                .reconnect_max_delay_ms
                .unwrap_or(defaults.reconnect_max_delay_ms),
            seed: self.seed.or(defaults.seed),
        }
    }
}

fn defaults() -> Config {
    Config {
        port: Some(8000),
        log_dir: Some(PathBuf::from("./logs")),
        log_prefix: Some("server_dashboard".to_string()),
        log_level: Some("info".to_string()),
        ..Default::default()
    }
}

fn read_config_file(path: &Path) -> Option<Config> {
    if !path.exists() {
        log::info!(
            "Config file not found at {}. Using defaults and environment/CLI variables.",
            path.display()
        );
        return None;
    }
    match fs::read_to_string(path) {
        Ok(raw) => match serde_json::from_str::<Config>(&raw) {
            Ok(file_config) => Some(file_config),
            Err(e) => {
                log::warn!("Failed to parse config file {}: {}. Falling back to other sources.", path.display(), e);
                None
            }
        },
        Err(e) => {
            log::warn!("Failed to read config file {}: {}. Falling back to other sources.", path.display(), e);
            None
        }
    }
}

/// Layers defaults < config file < `cli` (which already carries env vars).
pub fn resolve_config(cli: Config) -> Config {
    let config_file_path = cli
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    let mut current_config = defaults();
    if let Some(file_config) = read_config_file(&config_file_path) {
        current_config = current_config.merge(file_config);
    }
    current_config.merge(cli)
}

pub fn load_config() -> Config {
    resolve_config(Config::parse())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn cli_with_file(path: &Path) -> Config {
        Config {
            config_path: Some(path.to_path_buf()),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_apply_without_a_file() {
        let config = resolve_config(cli_with_file(Path::new("/nonexistent/server_dashboard.conf")));
        assert_eq!(config.port(), 8000);
        assert_eq!(config.log_level(), "info");
        assert_eq!(config.log_prefix(), "server_dashboard");
        assert_eq!(config.engine_config(), EngineConfig::default());
    }

    #[test]
    fn file_overrides_defaults_and_cli_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "port": 9100, "logLevel": "debug", "logPrefix": "fg_feed", "metricIntervalMs": 5000 }}"#
        )
        .unwrap();

        let cli = Config {
            port: Some(9200),
            seed: Some(3),
            ..cli_with_file(file.path())
        };
        let config = resolve_config(cli);

        assert_eq!(config.port(), 9200);
        assert_eq!(config.log_level(), "debug");
        assert_eq!(config.log_prefix(), "fg_feed");
        let engine = config.engine_config();
        assert_eq!(engine.metric_interval_ms, 5_000);
        assert_eq!(engine.seed, Some(3));
        assert_eq!(engine.insight_interval_ms, 30_000);
    }

    #[test]
    fn malformed_file_is_ignored() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ port: ").unwrap();
        let config = resolve_config(cli_with_file(file.path()));
        assert_eq!(config.port(), 8000);
    }
}
