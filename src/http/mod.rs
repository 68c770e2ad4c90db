//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! POST /api/generate/
//!     → server.rs (Axum setup, request ID, body limit)
//!     → request.rs (read farm_host / stream, keep payload bytes)
//!     → resilience::failover (select host, forward, maybe retry)
//!     → forwarder.rs (buffered or streamed exchange with one host)
//!     → response.rs (inject farm_host into every JSON object)
//!     → error.rs (failures rendered as JSON messages)
//!     → Send to client
//! ```

pub mod error;
pub mod forwarder;
pub mod request;
pub mod response;
pub mod server;

pub use error::FarmError;
pub use request::{FarmRequest, X_REQUEST_ID};
pub use server::FarmServer;
