//! Forwarding to a leased host.
//!
//! # Responsibilities
//! - POST the payload verbatim to the host's generate route
//! - Bound the whole exchange by the host's request timeout
//! - Buffered mode: collect, inject `farm_host`, keep the backend status
//! - Streaming mode: relay NDJSON line by line, injecting `farm_host` into each
//! - Classify failures: timeouts leave health alone, anything else re-probes
//!
//! # Design Decisions
//! - The lease is consumed; it drops (clearing busy) when the buffered
//!   exchange returns or when the relayed stream ends or is dropped

use std::convert::Infallible;
use std::time::Duration;

use axum::body::{Body, BodyDataStream, Bytes};
use axum::http::{header, Method, Request, Response, StatusCode};
use futures_util::StreamExt;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use thiserror::Error;
use tokio::time::{self, Instant};

use crate::farm::host::{HostId, HostLease};
use crate::health::probe::HealthProbe;
use crate::http::response::{inject_farm_host, LineSplitter};

/// Generate route on every Ollama host.
pub const GENERATE_PATH: &str = "/api/generate/";

#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("request timeout of {} secs expired", .budget.as_secs())]
    Timeout { budget: Duration },

    #[error("{message}")]
    Backend {
        message: String,
        /// The re-probe after the failure found the host offline.
        offline: bool,
    },
}

#[derive(Debug, Clone)]
pub struct RequestForwarder {
    client: Client<HttpConnector, Body>,
    probe: HealthProbe,
}

impl RequestForwarder {
    pub fn new(probe: HealthProbe) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self { client, probe }
    }

    pub fn probe(&self) -> &HealthProbe {
        &self.probe
    }

    /// Relay `body` to the leased host.
    pub async fn forward(
        &self,
        lease: HostLease,
        body: Bytes,
        streaming: bool,
        request_id: &str,
    ) -> Result<Response<Body>, ForwardError> {
        tracing::info!(host = %lease.id(), request_id = %request_id, streaming, "Request to host");

        if streaming {
            self.forward_streaming(lease, body, request_id).await
        } else {
            self.forward_buffered(lease, body, request_id).await
        }
    }

    async fn forward_buffered(
        &self,
        lease: HostLease,
        body: Bytes,
        request_id: &str,
    ) -> Result<Response<Body>, ForwardError> {
        let started = std::time::Instant::now();
        let budget = lease.request_timeout();
        let request = build_request(lease.id(), body)?;

        let exchange = async {
            let response = self.client.request(request).await.map_err(|e| e.to_string())?;
            let (parts, incoming) = response.into_parts();
            let bytes = axum::body::to_bytes(Body::new(incoming), usize::MAX)
                .await
                .map_err(|e| e.to_string())?;
            Ok::<_, String>((parts.status, bytes))
        };

        let (status, bytes) = match time::timeout(budget, exchange).await {
            Err(_) => {
                tracing::warn!(host = %lease.id(), request_id = %request_id, timeout_secs = budget.as_secs(), "Request timed out");
                return Err(ForwardError::Timeout { budget });
            }
            Ok(Err(message)) => return Err(self.backend_failure(&lease, message, request_id).await),
            Ok(Ok(result)) => result,
        };

        let tagged = match inject_farm_host(&bytes, lease.id()) {
            Ok(tagged) => tagged,
            Err(e) => return Err(self.backend_failure(&lease, e.to_string(), request_id).await),
        };

        tracing::info!(
            host = %lease.id(),
            request_id = %request_id,
            status = status.as_u16(),
            elapsed_secs = format_args!("{:.2}", started.elapsed().as_secs_f64()),
            "Request complete"
        );

        json_response(status, Body::from(tagged))
    }

    async fn forward_streaming(
        &self,
        lease: HostLease,
        body: Bytes,
        request_id: &str,
    ) -> Result<Response<Body>, ForwardError> {
        let budget = lease.request_timeout();
        let deadline = Instant::now() + budget;
        let request = build_request(lease.id(), body)?;

        let response = match time::timeout_at(deadline, self.client.request(request)).await {
            Err(_) => {
                tracing::warn!(host = %lease.id(), request_id = %request_id, timeout_secs = budget.as_secs(), "Request timed out");
                return Err(ForwardError::Timeout { budget });
            }
            Ok(Err(e)) => return Err(self.backend_failure(&lease, e.to_string(), request_id).await),
            Ok(Ok(response)) => response,
        };

        let relay = LineRelay {
            upstream: Body::new(response.into_body()).into_data_stream(),
            splitter: LineSplitter::new(),
            probe: self.probe.clone(),
            deadline,
            started: std::time::Instant::now(),
            request_id: request_id.to_string(),
            ended: false,
            lease,
        };

        let stream = futures_util::stream::unfold(relay, |mut relay| async move {
            relay
                .next_line()
                .await
                .map(|line| (Ok::<_, Infallible>(line), relay))
        });

        json_response(StatusCode::OK, Body::from_stream(stream))
    }

    /// Re-probe after a failure; the probe may take the host offline.
    async fn backend_failure(&self, lease: &HostLease, message: String, request_id: &str) -> ForwardError {
        tracing::error!(host = %lease.id(), request_id = %request_id, error = %message, "Backend request failed");
        let outcome = self.probe.probe(lease).await;
        ForwardError::Backend {
            message,
            offline: !outcome.is_online(),
        }
    }
}

fn build_request(host: &HostId, body: Bytes) -> Result<Request<Body>, ForwardError> {
    Request::builder()
        .method(Method::POST)
        .uri(format!("http://{}:{}{}", host.address(), host.port(), GENERATE_PATH))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .map_err(|e| ForwardError::Backend {
            message: format!("invalid backend request: {}", e),
            offline: false,
        })
}

fn json_response(status: StatusCode, body: Body) -> Result<Response<Body>, ForwardError> {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body)
        .map_err(|e| ForwardError::Backend {
            message: format!("invalid response: {}", e),
            offline: false,
        })
}

/// State of one streamed relay. Owns the lease until the stream is dropped.
struct LineRelay {
    upstream: BodyDataStream,
    splitter: LineSplitter,
    probe: HealthProbe,
    deadline: Instant,
    started: std::time::Instant,
    request_id: String,
    ended: bool,
    lease: HostLease,
}

impl LineRelay {
    /// Next tagged line, or `None` once the relay is over.
    async fn next_line(&mut self) -> Option<Bytes> {
        loop {
            if let Some(line) = self.splitter.next_line() {
                return self.tag(&line).await;
            }
            if self.ended {
                return match self.splitter.finish() {
                    Some(line) => self.tag(&line).await,
                    None => {
                        self.log_done();
                        None
                    }
                };
            }

            match time::timeout_at(self.deadline, self.upstream.next()).await {
                Err(_) => {
                    tracing::warn!(
                        host = %self.lease.id(),
                        request_id = %self.request_id,
                        timeout_secs = self.lease.request_timeout().as_secs(),
                        "Stream cut off by request timeout"
                    );
                    return None;
                }
                Ok(None) => self.ended = true,
                Ok(Some(Ok(chunk))) => self.splitter.push(&chunk),
                Ok(Some(Err(e))) => {
                    self.fail(e.to_string()).await;
                    return None;
                }
            }
        }
    }

    async fn tag(&mut self, line: &[u8]) -> Option<Bytes> {
        match inject_farm_host(line, self.lease.id()) {
            Ok(mut tagged) => {
                tagged.push(b'\n');
                Some(Bytes::from(tagged))
            }
            Err(e) => {
                self.fail(e.to_string()).await;
                None
            }
        }
    }

    async fn fail(&mut self, message: String) {
        tracing::error!(host = %self.lease.id(), request_id = %self.request_id, error = %message, "Backend stream failed");
        self.probe.probe(&self.lease).await;
        self.ended = true;
    }

    fn log_done(&self) {
        tracing::info!(
            host = %self.lease.id(),
            request_id = %self.request_id,
            elapsed_secs = format_args!("{:.2}", self.started.elapsed().as_secs_f64()),
            "Request streamed"
        );
    }
}
