//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid)
//! - Detect duplicate hosts
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: FarmConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use thiserror::Error;

use crate::config::schema::FarmConfig;
use crate::farm::host::HostId;

/// Upper bound for any configured duration (30 days).
pub const MAX_DURATION_SECS: u64 = 30 * 24 * 60 * 60;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listen port must be between 1 and 65535")]
    ListenPort,

    #[error("no Ollama hosts configured")]
    NoHosts,

    #[error("host {0} has an empty address")]
    EmptyAddress(String),

    #[error("host {0} has an invalid port")]
    HostPort(String),

    #[error("host {0} is listed more than once")]
    DuplicateHost(String),

    #[error("host {host} has a zero {field}")]
    ZeroTimeout { host: String, field: &'static str },

    #[error("{0} must be greater than zero")]
    ZeroSetting(&'static str),

    #[error("{field} exceeds the maximum of {max_secs} secs")]
    TooLong { field: String, max_secs: u64 },
}

fn check_max(errors: &mut Vec<ValidationError>, field: impl Into<String>, secs: u64) {
    if secs > MAX_DURATION_SECS {
        errors.push(ValidationError::TooLong {
            field: field.into(),
            max_secs: MAX_DURATION_SECS,
        });
    }
}

/// Validate a fully merged configuration.
pub fn validate_config(config: &FarmConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.port == 0 {
        errors.push(ValidationError::ListenPort);
    }

    if config.hosts.is_empty() {
        errors.push(ValidationError::NoHosts);
    }

    let mut seen = HashSet::new();
    for host in &config.hosts {
        let label = format!("{}:{}", host.address, host.port);

        if host.address.trim().is_empty() {
            errors.push(ValidationError::EmptyAddress(label.clone()));
        }
        if host.port == 0 {
            errors.push(ValidationError::HostPort(label.clone()));
        }
        if host.connect_timeout_secs == 0 {
            errors.push(ValidationError::ZeroTimeout {
                host: label.clone(),
                field: "connect_timeout_secs",
            });
        }
        if host.request_timeout_secs == 0 {
            errors.push(ValidationError::ZeroTimeout {
                host: label.clone(),
                field: "request_timeout_secs",
            });
        }
        check_max(&mut errors, format!("{} connect_timeout_secs", label), host.connect_timeout_secs);
        check_max(&mut errors, format!("{} request_timeout_secs", label), host.request_timeout_secs);
        if !seen.insert(HostId::new(host.address.trim(), host.port)) {
            errors.push(ValidationError::DuplicateHost(label));
        }
    }

    if config.health.retry_secs == 0 {
        errors.push(ValidationError::ZeroSetting("health.retry_secs"));
    }
    if config.health.background && config.health.interval_secs == 0 {
        errors.push(ValidationError::ZeroSetting("health.interval_secs"));
    }
    if config.failover.deadline_secs == 0 {
        errors.push(ValidationError::ZeroSetting("failover.deadline_secs"));
    }
    if config.failover.idle_delay_ms == 0 {
        errors.push(ValidationError::ZeroSetting("failover.idle_delay_ms"));
    }
    check_max(&mut errors, "health.retry_secs", config.health.retry_secs);
    check_max(&mut errors, "health.interval_secs", config.health.interval_secs);
    check_max(&mut errors, "failover.deadline_secs", config.failover.deadline_secs);
    check_max(&mut errors, "failover.idle_delay_ms", config.failover.idle_delay_ms / 1000);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
