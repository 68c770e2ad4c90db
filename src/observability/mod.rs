//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured tracing events: host transitions, request timing)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (fmt subscriber)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Events carry structured fields (host, request_id, elapsed_secs), not formatted text
//! - Request ID flows from the tower-http layer into every request log line
//! - Metrics are cheap and no-ops when the exporter is disabled

pub mod logging;
pub mod metrics;
