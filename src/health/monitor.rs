//! Background health probing.
//!
//! # Responsibilities
//! - Periodically probe hosts whose next probe is due
//! - Keep the selection path free of probe latency

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time;

use crate::farm::registry::HostRegistry;
use crate::health::probe::HealthProbe;

pub struct HealthMonitor {
    registry: Arc<HostRegistry>,
    probe: HealthProbe,
    interval: Duration,
}

impl HealthMonitor {
    pub fn new(registry: Arc<HostRegistry>, probe: HealthProbe, interval: Duration) -> Self {
        Self {
            registry,
            probe,
            interval,
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            retry_secs = self.probe.retry_window().as_secs(),
            "Health monitor starting"
        );

        let mut ticker = time::interval(self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.check_due().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Probe every due host concurrently.
    pub async fn check_due(&self) {
        let due = self
            .registry
            .iter()
            .filter(|host| host.is_probe_due())
            .map(|host| self.probe.probe(host));

        futures_util::future::join_all(due).await;
    }
}
