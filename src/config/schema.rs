//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the farm.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::farm::host::DEFAULT_OLLAMA_PORT;

/// Root configuration for the farm.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FarmConfig {
    /// Listener configuration (port, body limit).
    pub listener: ListenerConfig,

    /// Ollama hosts that make up the farm, in scan order.
    pub hosts: Vec<HostConfig>,

    /// Health probe settings.
    pub health: HealthConfig,

    /// Host selection / failover policy.
    pub failover: FailoverConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Port the farm listens on (all interfaces).
    pub port: u16,

    /// Largest accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            port: 4444,
            max_body_bytes: 8 * 1024 * 1024,
        }
    }
}

/// A single Ollama host.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HostConfig {
    /// Host name or IP address.
    pub address: String,

    /// Ollama API port.
    #[serde(default = "default_host_port")]
    pub port: u16,

    /// Bound on a reachability probe in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Bound on a whole forwarded request in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl HostConfig {
    /// Host with default timeouts.
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_host_port() -> u16 {
    DEFAULT_OLLAMA_PORT
}

fn default_connect_timeout() -> u64 {
    15
}

fn default_request_timeout() -> u64 {
    300
}

/// Health probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Delay after any probe before the same host is probed again.
    pub retry_secs: u64,

    /// Probe from a background task instead of inline during selection.
    pub background: bool,

    /// Tick interval of the background prober in seconds.
    pub interval_secs: u64,
}

impl HealthConfig {
    pub fn retry_window(&self) -> Duration {
        Duration::from_secs(self.retry_secs)
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            retry_secs: 30,
            background: false,
            interval_secs: 5,
        }
    }
}

/// What to do when a forward fails with a backend error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FailoverPolicy {
    /// Single attempt: a busy farm is reported as 429, a failure as 500.
    #[default]
    Reject,
    /// Keep selecting other hosts until one succeeds or the deadline passes.
    Retry,
}

/// Failover configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FailoverConfig {
    pub policy: FailoverPolicy,

    /// Overall deadline for a retried request in seconds.
    pub deadline_secs: u64,

    /// Upper bound on the wait between empty selection passes.
    pub idle_delay_ms: u64,
}

impl FailoverConfig {
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }

    pub fn idle_delay(&self) -> Duration {
        Duration::from_millis(self.idle_delay_ms)
    }
}

impl Default for FailoverConfig {
    fn default() -> Self {
        Self {
            policy: FailoverPolicy::Reject,
            deadline_secs: 15 * 60,
            idle_delay_ms: 25,
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
