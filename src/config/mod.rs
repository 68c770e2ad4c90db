//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → cli.rs (command line hosts / port merged on top)
//!     → validation.rs (semantic checks)
//!     → FarmConfig (validated, immutable)
//!     → consumed once by the composition root
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the host list is fixed for the process lifetime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod cli;
pub mod loader;
pub mod schema;
pub mod validation;

pub use cli::FarmArgs;
pub use loader::{load_config, ConfigError};
pub use schema::{
    FailoverConfig, FailoverPolicy, FarmConfig, HealthConfig, HostConfig, ListenerConfig,
    ObservabilityConfig,
};
