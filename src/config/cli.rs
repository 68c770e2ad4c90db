//! Command line arguments.
//!
//! Hosts given on the command line are appended to those in the config file,
//! `--port` overrides the listen port.

use std::path::PathBuf;

use clap::Parser;

use crate::config::loader::{read_config, ConfigError};
use crate::config::schema::{FailoverPolicy, FarmConfig, HostConfig};
use crate::config::validation::validate_config;
use crate::farm::host::HostId;

#[derive(Debug, Parser)]
#[command(name = "ollama-farm")]
#[command(about = "Combine Ollama API instances into a single Ollama API service", long_about = None)]
pub struct FarmArgs {
    /// Listen to HTTP port number (defaults to 4444)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Retry failed requests on other hosts instead of returning 500
    #[arg(long)]
    pub failover: bool,

    /// Ollama hosts with optional ports (e.g. localhost 10.0.10.3:11435)
    #[arg(value_name = "HOST")]
    pub hosts: Vec<String>,
}

impl FarmArgs {
    /// Merge the arguments over the optional config file and validate.
    pub fn into_config(self) -> Result<FarmConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => FarmConfig::default(),
        };

        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if self.failover {
            config.failover.policy = FailoverPolicy::Retry;
        }

        for spec in &self.hosts {
            let id: HostId = spec.parse().map_err(|source| ConfigError::Host {
                spec: spec.clone(),
                source,
            })?;
            config
                .hosts
                .push(HostConfig::new(id.address(), id.port()));
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}
