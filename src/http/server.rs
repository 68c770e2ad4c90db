//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the farm handlers
//! - Wire up middleware (request ID, tracing, body limit)
//! - Own the host registry for the lifetime of the server
//! - Dispatch generate requests to the failover coordinator
//! - Run the background health monitor when configured
//! - Stop accepting on shutdown and let in-flight requests finish

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::FarmConfig;
use crate::farm::registry::HostRegistry;
use crate::farm::selector::HostSelector;
use crate::health::monitor::HealthMonitor;
use crate::health::probe::HealthProbe;
use crate::http::forwarder::RequestForwarder;
use crate::http::request::{FarmRequest, UuidRequestId, X_REQUEST_ID};
use crate::resilience::failover::FailoverCoordinator;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<HostRegistry>,
    pub coordinator: FailoverCoordinator,
}

/// HTTP server for the farm.
pub struct FarmServer {
    router: Router,
    config: FarmConfig,
    registry: Arc<HostRegistry>,
    probe: HealthProbe,
}

impl FarmServer {
    /// Build the registry and every request-path component from `config`.
    pub fn new(config: FarmConfig) -> Self {
        let registry = Arc::new(HostRegistry::from_config(&config.hosts));
        let probe = HealthProbe::new(config.health.retry_window());

        let selector = HostSelector::new(registry.clone(), probe.clone(), !config.health.background);
        let forwarder = RequestForwarder::new(probe.clone());
        let coordinator = FailoverCoordinator::new(selector, forwarder, &config.failover);

        let state = AppState {
            registry: registry.clone(),
            coordinator,
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            registry,
            probe,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &FarmConfig, state: AppState) -> Router {
        Router::new()
            .route("/api/generate/", post(generate_handler))
            .route("/api/generate", post(generate_handler))
            .route("/api/farm/hosts", get(hosts_handler))
            .with_state(state)
            .layer(DefaultBodyLimit::disable())
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(RequestBodyLimitLayer::new(config.listener.max_body_bytes)),
            )
    }

    pub fn registry(&self) -> &Arc<HostRegistry> {
        &self.registry
    }

    pub fn probe(&self) -> &HealthProbe {
        &self.probe
    }

    pub fn config(&self) -> &FarmConfig {
        &self.config
    }

    /// Serve until a shutdown signal is received.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            hosts = self.registry.len(),
            policy = ?self.config.failover.policy,
            "HTTP server starting"
        );

        if self.config.health.background {
            let monitor = HealthMonitor::new(
                self.registry.clone(),
                self.probe.clone(),
                std::time::Duration::from_secs(self.config.health.interval_secs),
            );
            let monitor_shutdown = shutdown.resubscribe();
            tokio::spawn(monitor.run(monitor_shutdown));
        }

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, no longer accepting requests");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// `POST /api/generate/`
async fn generate_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request_id = headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let request = match FarmRequest::parse(body) {
        Ok(request) => request,
        Err(e) => {
            tracing::debug!(request_id = %request_id, error = %e, "Rejected payload");
            return e.into_response();
        }
    };

    tracing::debug!(
        request_id = %request_id,
        farm_host = ?request.farm_host.as_ref().map(ToString::to_string),
        stream = request.stream,
        "Generate request"
    );

    match state.coordinator.dispatch(&request, &request_id).await {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!(request_id = %request_id, status = e.status().as_u16(), error = %e, "Request failed");
            e.into_response()
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HostStatus {
    pub host: String,
    pub online: bool,
    pub busy: bool,
}

/// `GET /api/farm/hosts`
async fn hosts_handler(State(state): State<AppState>) -> Json<Vec<HostStatus>> {
    Json(
        state
            .registry
            .iter()
            .map(|h| HostStatus {
                host: h.id().to_string(),
                online: h.is_online(),
                busy: h.is_busy(),
            })
            .collect(),
    )
}
