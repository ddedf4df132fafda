//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from the TOML settings file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backend::UpdateStrategy;

/// Schedule file used when no source is configured.
pub const DEFAULT_LOCAL_CONFIG_FILE: &str = "dynamic-config-local-schedules.yaml";

/// Root settings for the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address, limits).
    pub listener: ListenerConfig,

    /// Where schedules come from.
    pub source: SourceConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:55700").
    pub bind_address: String,

    /// Maximum concurrent requests (backpressure).
    pub max_connections: usize,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:55700".to_string(),
            max_connections: 10_000,
            max_body_size: 64 * 1024,
        }
    }
}

/// Configuration source settings.
///
/// At most one of `local_config_file` and `remote_endpoint` may be set. With
/// neither, the service reads [`DEFAULT_LOCAL_CONFIG_FILE`].
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SourceConfig {
    pub local_config_file: Option<PathBuf>,

    /// Upstream config service (e.g., "http://config.internal:55700").
    pub remote_endpoint: Option<String>,

    /// Suggested client poll interval. Non-positive values keep the backend default.
    pub wait_time_secs: i32,

    pub update_strategy: UpdateStrategy,

    /// Serve per-resource matched blocks instead of one global configuration.
    pub resource_matching: bool,
}

impl SourceConfig {
    /// Schedule file to load, unless a remote endpoint is configured instead.
    pub fn local_config_file(&self) -> Option<&Path> {
        match (&self.local_config_file, &self.remote_endpoint) {
            (Some(path), _) => Some(path.as_path()),
            (None, None) => Some(Path::new(DEFAULT_LOCAL_CONFIG_FILE)),
            (None, Some(_)) => None,
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            local_config_file: None,
            remote_endpoint: None,
            wait_time_secs: 30,
            update_strategy: UpdateStrategy::Default,
            resource_matching: true,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Upstream round trip timeout in seconds.
    pub upstream_secs: u64,
}

impl TimeoutConfig {
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    pub fn upstream(&self) -> Duration {
        Duration::from_secs(self.upstream_secs)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            upstream_secs: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
