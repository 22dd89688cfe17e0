//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::checker::CheckerSettings;

/// Root configuration for the path checker daemon.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MonitorConfig {
    /// Checker defaults applied to every path.
    pub checker: CheckerConfig,

    /// Paths to monitor.
    pub paths: Vec<PathConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Checker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CheckerConfig {
    /// Registered strategy name (`tur`, `readsector0`).
    pub name: String,

    /// Probe timeout in seconds.
    pub timeout_secs: u64,

    /// Total attempts for transient conditions.
    pub retries: u32,

    /// Longest a single poll may wait for an async worker, in milliseconds.
    pub poll_budget_ms: u64,

    /// Run probes on worker threads.
    pub async_mode: bool,

    /// Seconds between polls of all paths.
    pub interval_secs: u64,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            name: "tur".to_string(),
            timeout_secs: 30,
            retries: 5,
            poll_budget_ms: 1,
            async_mode: true,
            interval_secs: 5,
        }
    }
}

impl CheckerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn settings(&self) -> CheckerSettings {
        CheckerSettings {
            retries: self.retries,
            poll_budget: Duration::from_millis(self.poll_budget_ms),
        }
    }
}

/// A single monitored path.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathConfig {
    /// Path identifier for logging/metrics.
    pub name: String,

    /// Device node (e.g., "/dev/sdb" or "/dev/sg2").
    pub device: String,

    /// Strategy override for this path.
    #[serde(default)]
    pub checker: Option<String>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9102".to_string(),
        }
    }
}
