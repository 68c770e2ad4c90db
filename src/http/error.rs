//! Client-visible errors.
//!
//! Every error renders as `{"message": "..."}` with the status code callers
//! key their retry behaviour on: 429 means poll again later.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::farm::host::HostId;

#[derive(Debug, Error)]
pub enum FarmError {
    #[error("No JSON payload")]
    EmptyPayload,

    #[error("Invalid JSON payload: {0}")]
    InvalidPayload(String),

    #[error("Requested host {0} is not part of the farm")]
    UnknownHost(HostId),

    #[error("{}", no_host_message(.requested))]
    NoHostAvailable { requested: Option<HostId> },

    #[error("The Ollama host request timeout of {} secs has expired.", .budget.as_secs())]
    RequestTimeout { host: HostId, budget: Duration },

    #[error("{}{message}", offline_prefix(.host, .retry_in))]
    BackendFailure {
        host: HostId,
        message: String,
        /// Set when the failure took the host offline.
        retry_in: Option<Duration>,
    },

    #[error("The request could not be completed within {} secs.", .deadline.as_secs())]
    DeadlineExceeded { deadline: Duration },
}

fn no_host_message(requested: &Option<HostId>) -> String {
    match requested {
        Some(id) => format!("Requested host {} is currently busy", id),
        None => "All Ollama hosts are currently busy".to_string(),
    }
}

fn offline_prefix(host: &HostId, retry_in: &Option<Duration>) -> String {
    match retry_in {
        Some(window) => format!(
            "Ollama host {} offline; retry in {} secs => ",
            host,
            window.as_secs()
        ),
        None => String::new(),
    }
}

impl FarmError {
    pub fn status(&self) -> StatusCode {
        match self {
            FarmError::EmptyPayload | FarmError::InvalidPayload(_) | FarmError::UnknownHost(_) => {
                StatusCode::BAD_REQUEST
            }
            FarmError::NoHostAvailable { .. } => StatusCode::TOO_MANY_REQUESTS,
            FarmError::RequestTimeout { .. } | FarmError::DeadlineExceeded { .. } => {
                StatusCode::REQUEST_TIMEOUT
            }
            FarmError::BackendFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for FarmError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "message": self.to_string() }))).into_response()
    }
}
