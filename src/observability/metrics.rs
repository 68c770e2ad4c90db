//! Metrics collection and exposition.
//!
//! # Metrics
//! - `farm_requests_total` (counter): forwarded requests by host, status
//! - `farm_request_duration_seconds` (histogram): time to response by host
//! - `farm_host_online` (gauge): 1=online, 0=offline, per host
//! - `farm_failover_retries_total` (counter): forwards retried on another host
//!
//! Recording is a no-op until an exporter is installed.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(host: &str, status: u16, started: Instant) {
    counter!(
        "farm_requests_total",
        "host" => host.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("farm_request_duration_seconds", "host" => host.to_string())
        .record(started.elapsed().as_secs_f64());
}

pub fn record_host_online(host: &str, online: bool) {
    gauge!("farm_host_online", "host" => host.to_string()).set(if online { 1.0 } else { 0.0 });
}

pub fn record_failover_retry() {
    counter!("farm_failover_retries_total").increment(1);
}
