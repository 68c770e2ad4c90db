//! Selection → forward orchestration.
//!
//! # States
//! ```text
//! Selecting → Forwarding → Succeeded
//!                        → TimedOut   (host request timeout, never retried)
//!                        → Retrying → Selecting   (retry policy only)
//! Selecting → TimedOut   (overall deadline, retry policy only)
//! ```
//!
//! # Design Decisions
//! - `Reject` makes a single pass: nothing available is a 429 the caller polls on
//! - `Retry` polls the selector, waking on any host release and at least every
//!   `idle_delay`, until the overall deadline
//! - Pinned requests are never retried elsewhere and never queue
//! - A host that failed is skipped by this request until its retry window
//!   has passed, even when its re-probe left it online

use std::time::Duration;

use axum::body::Body;
use axum::http::Response;
use tokio::time::{self, Instant};

use crate::config::{FailoverConfig, FailoverPolicy};
use crate::farm::host::{HostId, HostLease};
use crate::farm::selector::HostSelector;
use crate::http::error::FarmError;
use crate::http::forwarder::{ForwardError, RequestForwarder};
use crate::http::request::FarmRequest;
use crate::observability::metrics;

#[derive(Debug, Clone)]
pub struct FailoverCoordinator {
    selector: HostSelector,
    forwarder: RequestForwarder,
    policy: FailoverPolicy,
    deadline: Duration,
    idle_delay: Duration,
}

impl FailoverCoordinator {
    pub fn new(selector: HostSelector, forwarder: RequestForwarder, config: &FailoverConfig) -> Self {
        Self {
            selector,
            forwarder,
            policy: config.policy,
            deadline: config.deadline(),
            idle_delay: config.idle_delay(),
        }
    }

    pub fn selector(&self) -> &HostSelector {
        &self.selector
    }

    /// Serve one generate request.
    pub async fn dispatch(&self, request: &FarmRequest, request_id: &str) -> Result<Response<Body>, FarmError> {
        let pinned = request.farm_host.as_ref();
        if let Some(id) = pinned {
            if self.selector.registry().get(id).is_none() {
                return Err(FarmError::UnknownHost(id.clone()));
            }
        }

        let retrying = self.policy == FailoverPolicy::Retry && pinned.is_none();
        let deadline = Instant::now() + self.deadline;
        let mut failed: Vec<(HostId, Instant)> = Vec::new();

        loop {
            // Selecting
            let lease = match self.select(request, retrying, deadline, &mut failed).await {
                Some(lease) => lease,
                None if retrying => {
                    tracing::warn!(request_id = %request_id, deadline_secs = self.deadline.as_secs(), "No host became available before the deadline");
                    return Err(FarmError::DeadlineExceeded { deadline: self.deadline });
                }
                None => return Err(FarmError::NoHostAvailable { requested: pinned.cloned() }),
            };

            // Forwarding
            let host = lease.id().clone();
            let started = std::time::Instant::now();
            match self
                .forwarder
                .forward(lease, request.body.clone(), request.stream, request_id)
                .await
            {
                Ok(response) => {
                    metrics::record_request(&host.to_string(), response.status().as_u16(), started);
                    return Ok(response);
                }
                Err(ForwardError::Timeout { budget }) => {
                    metrics::record_request(&host.to_string(), 408, started);
                    return Err(FarmError::RequestTimeout { host, budget });
                }
                Err(ForwardError::Backend { message, offline }) => {
                    metrics::record_request(&host.to_string(), 500, started);

                    if !retrying {
                        return Err(FarmError::BackendFailure {
                            host,
                            message,
                            retry_in: offline.then(|| self.forwarder.probe().retry_window()),
                        });
                    }

                    // Retrying
                    let window = self.forwarder.probe().retry_window();
                    failed.push((host.clone(), Instant::now() + window));
                    metrics::record_failover_retry();
                    tracing::info!(request_id = %request_id, failed_host = %host, error = %message, "Retrying on another host");
                    if Instant::now() >= deadline {
                        return Err(FarmError::DeadlineExceeded { deadline: self.deadline });
                    }
                }
            }
        }
    }

    /// One pass under `Reject`, a deadline-bounded poll under `Retry`.
    ///
    /// Hosts in `failed` are skipped until their entry expires.
    async fn select(
        &self,
        request: &FarmRequest,
        retrying: bool,
        deadline: Instant,
        failed: &mut Vec<(HostId, Instant)>,
    ) -> Option<HostLease> {
        let pinned = request.farm_host.as_ref();
        if !retrying {
            return self.selector.acquire(pinned).await;
        }

        let released = self.selector.registry().released();
        loop {
            let now = Instant::now();
            failed.retain(|(_, until)| *until > now);
            let excluded: Vec<HostId> = failed.iter().map(|(id, _)| id.clone()).collect();

            let attempt = time::timeout_at(deadline, self.selector.acquire_excluding(pinned, &excluded))
                .await
                .ok()?;
            if attempt.is_some() {
                return attempt;
            }

            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            let nap = self.idle_delay.min(deadline - now);
            tokio::select! {
                _ = released.notified() => {}
                _ = time::sleep(nap) => {}
            }
        }
    }
}
