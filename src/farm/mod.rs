//! Host pool subsystem.
//!
//! # Data Flow
//! ```text
//! Request arrives (optionally pinned via farm_host)
//!     → selector.rs (one pass over the registry)
//!         - skip busy / offline-not-due hosts
//!         - claim with compare-and-set on busy
//!         - probe inline when due (health::probe)
//!     → host.rs HostLease (busy until dropped)
//!     → forwarder relays the request, lease dropped on every exit path
//! ```
//!
//! # Design Decisions
//! - At most one in-flight request per host
//! - No lock spans the registry; each host owns its atomics
//! - Hosts are fixed at startup; no insertion or removal

pub mod host;
pub mod registry;
pub mod selector;

pub use host::{BackendHost, HostId, HostLease, DEFAULT_OLLAMA_PORT};
pub use registry::HostRegistry;
pub use selector::HostSelector;
