//! Reachability probe.
//!
//! # Responsibilities
//! - Open a bare TCP connection to a host within its connect timeout
//! - Record the result as the host's online flag
//! - Push the next probe out by the retry window, whatever the result
//!
//! Two probes of the same host may overlap; the last one to finish wins.

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time;

use crate::farm::host::BackendHost;
use crate::observability::metrics;

/// Result of a probe relative to the host's previous state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    CameOnline,
    WentOffline,
    StillOnline,
    StillOffline,
}

impl ProbeOutcome {
    fn from_states(was_online: bool, online: bool) -> Self {
        match (was_online, online) {
            (false, true) => ProbeOutcome::CameOnline,
            (true, false) => ProbeOutcome::WentOffline,
            (true, true) => ProbeOutcome::StillOnline,
            (false, false) => ProbeOutcome::StillOffline,
        }
    }

    pub fn is_online(self) -> bool {
        matches!(self, ProbeOutcome::CameOnline | ProbeOutcome::StillOnline)
    }

    /// True when the online flag flipped.
    pub fn is_transition(self) -> bool {
        matches!(self, ProbeOutcome::CameOnline | ProbeOutcome::WentOffline)
    }
}

/// Bounded-time TCP reachability check with a fixed backoff.
#[derive(Debug, Clone)]
pub struct HealthProbe {
    retry_window: Duration,
}

impl HealthProbe {
    pub fn new(retry_window: Duration) -> Self {
        Self { retry_window }
    }

    pub fn retry_window(&self) -> Duration {
        self.retry_window
    }

    /// Probe `host` and update its health state.
    pub async fn probe(&self, host: &BackendHost) -> ProbeOutcome {
        let id = host.id();
        let connect = TcpStream::connect((id.address(), id.port()));

        let reachable = match time::timeout(host.connect_timeout(), connect).await {
            Ok(Ok(_stream)) => true,
            Ok(Err(e)) => {
                tracing::debug!(host = %id, error = %e, "Probe failed: connection error");
                false
            }
            Err(_) => {
                tracing::debug!(host = %id, timeout = ?host.connect_timeout(), "Probe failed: timeout");
                false
            }
        };

        let was_online = host.set_online(reachable);
        host.schedule_probe(self.retry_window);

        let outcome = ProbeOutcome::from_states(was_online, reachable);
        match outcome {
            ProbeOutcome::CameOnline => {
                tracing::info!(host = %id, "Ollama host back online");
            }
            ProbeOutcome::WentOffline => {
                tracing::warn!(
                    host = %id,
                    retry_secs = self.retry_window.as_secs(),
                    "Ollama host offline; retry in {} secs",
                    self.retry_window.as_secs()
                );
            }
            _ => {}
        }
        metrics::record_host_online(&id.to_string(), reachable);

        outcome
    }
}
