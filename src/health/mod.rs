//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Inline (default):
//!     Selector reaches a host whose next probe is due
//!     → probe.rs (TCP connect within connect timeout)
//!     → online flag + next probe time updated
//!
//! After a backend failure:
//!     Forwarder error
//!     → probe.rs (may take the host offline)
//!
//! Background (health.background = true):
//!     monitor.rs ticker
//!     → probe.rs for every due host
//! ```
//!
//! # Design Decisions
//! - Fixed backoff after every probe, success or failure
//! - Timeouts on forwarded requests are not health signals
//! - Health state is per-host atomics, no locks

pub mod monitor;
pub mod probe;

pub use probe::{HealthProbe, ProbeOutcome};
