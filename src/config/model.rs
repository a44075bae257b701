//! Configuration data model.
//!
//! All structs derive `Serialize`/`Deserialize` for TOML persistence.
//! Every field has a sensible default so the application works out of the box.
//! Dashboard preferences (theme, refresh interval) live in the dashboard
//! store, not here.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

/// Where dashboard state is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for the persisted dashboard. Defaults to the platform data
    /// directory.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Scheduler timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshConfig {
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    #[serde(default = "default_health_interval")]
    pub health_interval_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            health_interval_secs: default_health_interval(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Timeout for custom API widget requests.
    #[serde(default = "default_external_timeout")]
    pub external_timeout_secs: u64,
    /// Artificial delay on every mock response.
    #[serde(default)]
    pub mock_latency_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            external_timeout_secs: default_external_timeout(),
            mock_latency_ms: 0,
        }
    }
}

/// Diagnostic log settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// `tracing` filter directive, overridden by `FINBOARD_LOG`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            timestamp_format: default_timestamp_format(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("finboard")
}
fn default_tick_ms() -> u64 {
    250
}
fn default_health_interval() -> u64 {
    5 * 60
}
fn default_external_timeout() -> u64 {
    10
}
fn default_true() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_timestamp_format() -> String {
    "%H:%M:%S".to_string()
}
