//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Generate request:
//!     → failover.rs (select → forward)
//!     → Timeout: return 408, never retried
//!     → Backend failure: 500, or reselect under the retry policy
//!     → Retry policy bounded by an overall deadline
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every backend call has a deadline
//! - Failed hosts are excluded by their own backoff, not by a retry list

pub mod failover;

pub use crate::config::FailoverPolicy;
pub use failover::FailoverCoordinator;
