//! Ollama Farm: combine Ollama API instances into a single Ollama API service.

pub mod config;
pub mod farm;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::FarmConfig;
pub use http::FarmServer;
pub use lifecycle::Shutdown;

#[cfg(test)]
mod test_support;
