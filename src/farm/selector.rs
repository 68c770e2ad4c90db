//! Host selection.
//!
//! One non-blocking pass over the registry in configured order:
//! 1. skip busy hosts and offline hosts whose next probe is not due
//! 2. claim the host (compare-and-set on `busy`)
//! 3. if its probe is due, probe it inline; a host whose state just flipped
//!    is skipped for this pass
//! 4. keep the first online host that matches the requested id (or any host
//!    when none was requested); every other claim is released
//!
//! A pinned request never falls back to a different host.

use std::sync::Arc;

use crate::farm::host::{HostId, HostLease};
use crate::farm::registry::HostRegistry;
use crate::health::probe::HealthProbe;

#[derive(Debug, Clone)]
pub struct HostSelector {
    registry: Arc<HostRegistry>,
    probe: HealthProbe,
    /// When false a background monitor owns probing and selection reads cached state.
    inline_probe: bool,
}

impl HostSelector {
    pub fn new(registry: Arc<HostRegistry>, probe: HealthProbe, inline_probe: bool) -> Self {
        Self {
            registry,
            probe,
            inline_probe,
        }
    }

    pub fn registry(&self) -> &Arc<HostRegistry> {
        &self.registry
    }

    /// Claim an idle, online host, or `None` when nothing is available.
    pub async fn acquire(&self, requested: Option<&HostId>) -> Option<HostLease> {
        self.acquire_excluding(requested, &[]).await
    }

    /// Like [`acquire`](Self::acquire), never considering hosts in `excluded`.
    pub async fn acquire_excluding(
        &self,
        requested: Option<&HostId>,
        excluded: &[HostId],
    ) -> Option<HostLease> {
        for host in self.registry.iter() {
            if requested.is_some_and(|id| host.id() != id) {
                continue;
            }
            if excluded.contains(host.id()) {
                continue;
            }
            if !host.is_eligible() {
                continue;
            }

            let Some(lease) = self.registry.lease(host) else {
                continue;
            };

            if host.is_probe_due() {
                if self.inline_probe {
                    let outcome = self.probe.probe(host).await;
                    if outcome.is_transition() {
                        continue;
                    }
                } else if !host.is_online() {
                    continue;
                }
            }

            if host.is_online() {
                tracing::debug!(host = %host.id(), "Host acquired");
                return Some(lease);
            }
        }

        None
    }
}
