//! Host registry.
//!
//! # Responsibilities
//! - Own the ordered, fixed collection of hosts
//! - Lookup by identity
//! - Hand out leases and signal their release

use std::sync::Arc;

use tokio::sync::Notify;

use crate::config::HostConfig;
use crate::farm::host::{BackendHost, HostId, HostLease};

/// The pool of hosts shared by every request handler.
///
/// There is no lock over the collection; each host synchronizes its own
/// fields.
#[derive(Debug)]
pub struct HostRegistry {
    hosts: Vec<Arc<BackendHost>>,
    released: Arc<Notify>,
}

impl HostRegistry {
    pub fn new(hosts: Vec<BackendHost>) -> Self {
        Self {
            hosts: hosts.into_iter().map(Arc::new).collect(),
            released: Arc::new(Notify::new()),
        }
    }

    pub fn from_config(configs: &[HostConfig]) -> Self {
        Self::new(configs.iter().map(BackendHost::from_config).collect())
    }

    /// Hosts in configured (scan) order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<BackendHost>> {
        self.hosts.iter()
    }

    pub fn get(&self, id: &HostId) -> Option<&Arc<BackendHost>> {
        self.hosts.iter().find(|h| h.id() == id)
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Try to claim `host` for one request.
    pub fn lease(&self, host: &Arc<BackendHost>) -> Option<HostLease> {
        HostLease::try_new(host, &self.released)
    }

    /// Notified every time a lease is dropped.
    pub fn released(&self) -> &Notify {
        &self.released
    }
}
