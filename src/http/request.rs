//! Request handling.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) for every inbound request
//! - Read the two farm-level fields of a generate payload
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The payload stays opaque; the original bytes are forwarded verbatim

use axum::body::Bytes;
use axum::http::{HeaderValue, Request};
use serde::Deserialize;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::farm::host::HostId;
use crate::http::error::FarmError;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

#[derive(Debug, Default, Deserialize)]
struct Envelope {
    #[serde(default)]
    farm_host: Option<String>,
    #[serde(default)]
    stream: Option<bool>,
}

/// A generate request: the raw payload plus the fields the farm routes on.
#[derive(Debug, Clone)]
pub struct FarmRequest {
    /// Host the request is pinned to, if any.
    pub farm_host: Option<HostId>,
    /// Relay the response as NDJSON lines.
    pub stream: bool,
    /// Original payload, forwarded unchanged.
    pub body: Bytes,
}

impl FarmRequest {
    pub fn parse(body: Bytes) -> Result<Self, FarmError> {
        if is_blank(&body) {
            return Err(FarmError::EmptyPayload);
        }

        let envelope: Envelope =
            serde_json::from_slice(&body).map_err(|e| FarmError::InvalidPayload(e.to_string()))?;

        let farm_host = match envelope.farm_host.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(spec) => Some(
                spec.parse::<HostId>()
                    .map_err(|e| FarmError::InvalidPayload(format!("farm_host {:?}: {}", spec, e)))?,
            ),
        };

        Ok(Self {
            farm_host,
            stream: envelope.stream.unwrap_or(false),
            body,
        })
    }
}

fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(u8::is_ascii_whitespace)
}
