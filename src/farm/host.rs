//! Backend host abstraction.
//!
//! # Responsibilities
//! - Represent a single Ollama host and its identity
//! - Track health (online flag, next probe time)
//! - Track the busy flag used for one-request-per-host admission
//! - Hand out leases that clear the busy flag on drop

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::Notify;

use crate::config::HostConfig;

/// Port used when a host is given without one.
pub const DEFAULT_OLLAMA_PORT: u16 = 11434;

/// Error parsing an `address[:port]` host spec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostIdError {
    #[error("host address is empty")]
    EmptyAddress,

    #[error("port {0:?} is not between 1 and 65535")]
    InvalidPort(String),
}

/// Identity of a host: address plus port, address compared case-insensitively.
#[derive(Debug, Clone, Eq)]
pub struct HostId {
    address: String,
    port: u16,
}

impl HostId {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl PartialEq for HostId {
    fn eq(&self, other: &Self) -> bool {
        self.port == other.port && self.address.eq_ignore_ascii_case(&other.address)
    }
}

impl Hash for HostId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address.to_ascii_lowercase().hash(state);
        self.port.hash(state);
    }
}

impl FromStr for HostId {
    type Err = HostIdError;

    /// Parse `address[:port]`, defaulting the port to 11434.
    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let spec = spec.trim();
        let (address, port) = match spec.rsplit_once(':') {
            Some((address, port)) => {
                let port = port
                    .trim()
                    .parse::<u16>()
                    .ok()
                    .filter(|p| *p != 0)
                    .ok_or_else(|| HostIdError::InvalidPort(port.to_string()))?;
                (address.trim(), port)
            }
            None => (spec, DEFAULT_OLLAMA_PORT),
        };

        if address.is_empty() {
            return Err(HostIdError::EmptyAddress);
        }

        Ok(Self::new(address, port))
    }
}

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

/// A single Ollama host in the farm.
///
/// `online` and the probe schedule are written only by the health probe;
/// `busy` is set by a successful claim and cleared when its [`HostLease`] drops.
#[derive(Debug)]
pub struct BackendHost {
    id: HostId,
    connect_timeout: Duration,
    request_timeout: Duration,

    online: AtomicBool,
    busy: AtomicBool,
    /// Milliseconds since `epoch` at which the next probe is due.
    next_probe_at: AtomicU64,
    epoch: Instant,
}

impl BackendHost {
    /// Create a host that is assumed online and due for a probe.
    pub fn new(id: HostId, connect_timeout: Duration, request_timeout: Duration) -> Self {
        Self {
            id,
            connect_timeout,
            request_timeout,
            online: AtomicBool::new(true),
            busy: AtomicBool::new(false),
            next_probe_at: AtomicU64::new(0),
            epoch: Instant::now(),
        }
    }

    pub fn from_config(config: &HostConfig) -> Self {
        Self::new(
            HostId::new(config.address.trim(), config.port),
            config.connect_timeout(),
            config.request_timeout(),
        )
    }

    pub fn id(&self) -> &HostId {
        &self.id
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Record a probe result. Returns the previous value.
    pub fn set_online(&self, online: bool) -> bool {
        self.online.swap(online, Ordering::AcqRel)
    }

    /// Schedule the next probe `after` from now.
    pub fn schedule_probe(&self, after: Duration) {
        let at = self.elapsed_ms().saturating_add(after.as_millis() as u64);
        self.next_probe_at.store(at, Ordering::Release);
    }

    /// Make the host due for a probe immediately.
    pub fn mark_probe_due(&self) {
        self.next_probe_at.store(self.elapsed_ms(), Ordering::Release);
    }

    pub fn is_probe_due(&self) -> bool {
        self.elapsed_ms() >= self.next_probe_at.load(Ordering::Acquire)
    }

    /// Time left until the next probe is due (zero when due).
    pub fn probe_due_in(&self) -> Duration {
        let at = self.next_probe_at.load(Ordering::Acquire);
        Duration::from_millis(at.saturating_sub(self.elapsed_ms()))
    }

    /// A host can be selected when idle and either online or due for a probe.
    pub fn is_eligible(&self) -> bool {
        !self.is_busy() && (self.is_online() || self.is_probe_due())
    }

    /// Atomically flip `busy` from false to true.
    pub(crate) fn try_claim(&self) -> bool {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn release(&self) {
        self.busy.store(false, Ordering::Release);
    }

    fn elapsed_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }
}

/// Exclusive claim on a host; clears `busy` and wakes waiters when dropped.
#[derive(Debug)]
pub struct HostLease {
    host: Arc<BackendHost>,
    released: Arc<Notify>,
}

impl HostLease {
    /// Claim `host`, or `None` if another request already holds it.
    pub(crate) fn try_new(host: &Arc<BackendHost>, released: &Arc<Notify>) -> Option<Self> {
        if !host.try_claim() {
            return None;
        }
        Some(Self {
            host: Arc::clone(host),
            released: Arc::clone(released),
        })
    }

    pub fn host(&self) -> &Arc<BackendHost> {
        &self.host
    }
}

impl Deref for HostLease {
    type Target = BackendHost;
    fn deref(&self) -> &Self::Target {
        &self.host
    }
}

impl Drop for HostLease {
    fn drop(&mut self) {
        self.host.release();
        self.released.notify_waiters();
        tracing::trace!(host = %self.host.id, "Host released");
    }
}
