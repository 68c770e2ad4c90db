//! Startup orchestration.
//!
//! # Responsibilities
//! - Probe every host once before traffic is accepted
//! - Log the resulting host list
//! - Leave offline hosts due so the first request re-probes them

use crate::farm::registry::HostRegistry;
use crate::health::probe::HealthProbe;

/// Probe all hosts concurrently. Returns how many are online.
pub async fn probe_all(registry: &HostRegistry, probe: &HealthProbe) -> usize {
    let probes = registry.iter().map(|host| probe.probe(host));
    futures_util::future::join_all(probes).await;

    let mut online = 0;
    for host in registry.iter() {
        if host.is_online() {
            online += 1;
        } else {
            host.mark_probe_due();
        }
        tracing::info!(
            host = %host.id(),
            online = host.is_online(),
            "Using Ollama host {} ({})",
            host.id(),
            if host.is_online() { "Online" } else { "Offline" }
        );
    }
    online
}
