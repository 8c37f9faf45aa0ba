//! Configuration schema definitions.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RanniConfig {
    /// Connection to the gateway.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Local REST front-end.
    #[serde(default)]
    pub api: ApiConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

// =============================================================================
// Gateway
// =============================================================================

/// Gateway connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Event stream address. A bare `host:port` is treated as `ws://host:port`.
    #[serde(default = "default_ws_url")]
    pub ws_url: String,

    /// Base address of the gateway HTTP API.
    #[serde(default = "default_callback_url")]
    pub callback_url: String,

    /// Access token sent as the `access_token` query parameter.
    #[serde(default)]
    pub access_token: Option<String>,

    /// Timeout for HTTP API calls, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            ws_url: default_ws_url(),
            callback_url: default_callback_url(),
            access_token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GatewayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_ws_url() -> String {
    "127.0.0.1:6700".to_string()
}

fn default_callback_url() -> String {
    "http://127.0.0.1:5700".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

// =============================================================================
// REST front-end
// =============================================================================

/// REST front-end settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Listen address, e.g. `0.0.0.0:8080`. The front-end is off when unset.
    #[serde(default)]
    pub listen_addr: Option<String>,
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    #[cfg(feature = "json-log")]
    Json,
}

/// Where log lines go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    /// Write to `file_path`.
    File,
}

/// How often the log file is rotated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpanEventConfig {
    pub new: bool,
    pub enter: bool,
    pub exit: bool,
    pub close: bool,
}

/// Logging settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    pub output: LogOutput,
    /// Log file, required when `output` is `file`.
    pub file_path: Option<PathBuf>,
    pub rotation: LogRotation,
    /// Per-module levels, e.g. `ranni_core = "debug"`.
    pub filters: HashMap<String, LogLevel>,
    pub thread_ids: bool,
    /// Show file and line of each event.
    pub file_location: bool,
    pub span_events: SpanEventConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_gateway() {
        let config = RanniConfig::default();
        assert_eq!(config.gateway.ws_url, "127.0.0.1:6700");
        assert_eq!(config.gateway.callback_url, "http://127.0.0.1:5700");
        assert_eq!(config.gateway.timeout(), Duration::from_secs(30));
        assert!(config.api.listen_addr.is_none());
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn partial_sections_fill_defaults() {
        let config: RanniConfig = serde_json::from_value(serde_json::json!({
            "gateway": {"access_token": "t"},
            "logging": {"level": "debug", "filters": {"ranni_core": "trace"}}
        }))
        .unwrap();
        assert_eq!(config.gateway.access_token.as_deref(), Some("t"));
        assert_eq!(config.gateway.timeout_secs, 30);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.filters["ranni_core"], LogLevel::Trace);
    }
}
