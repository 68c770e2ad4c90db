//! Response rewriting.
//!
//! # Responsibilities
//! - Insert `farm_host` as the first top-level field of a backend JSON object
//! - Split a chunked NDJSON body into lines
//!
//! # Design Decisions
//! - Structured parse → insert → re-serialize, never string splicing
//! - Only JSON objects are accepted; anything else is a malformed response
//! - Key order of the backend object is preserved (serde_json `preserve_order`)

use serde_json::{Map, Value};
use thiserror::Error;

use crate::farm::host::HostId;

/// Field injected into every response.
pub const FARM_HOST_FIELD: &str = "farm_host";

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("backend returned invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("backend returned a JSON {0} instead of an object")]
    NotAnObject(&'static str),
}

/// Parse `payload`, put `farm_host` first and serialize it again.
pub fn inject_farm_host(payload: &[u8], host: &HostId) -> Result<Vec<u8>, RewriteError> {
    let value: Value = serde_json::from_slice(payload)?;
    let object = match value {
        Value::Object(object) => object,
        Value::Array(_) => return Err(RewriteError::NotAnObject("array")),
        Value::String(_) => return Err(RewriteError::NotAnObject("string")),
        Value::Number(_) => return Err(RewriteError::NotAnObject("number")),
        Value::Bool(_) => return Err(RewriteError::NotAnObject("boolean")),
        Value::Null => return Err(RewriteError::NotAnObject("null")),
    };

    let mut tagged = Map::with_capacity(object.len() + 1);
    tagged.insert(FARM_HOST_FIELD.to_string(), Value::String(host.to_string()));
    for (key, value) in object {
        if key != FARM_HOST_FIELD {
            tagged.insert(key, value);
        }
    }

    Ok(serde_json::to_vec(&Value::Object(tagged))?)
}

/// Accumulates body chunks and yields complete, non-blank lines.
#[derive(Debug, Default)]
pub struct LineSplitter {
    buf: Vec<u8>,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Next complete line without its terminator, skipping blank lines.
    pub fn next_line(&mut self) -> Option<Vec<u8>> {
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
            line.pop();
            if !is_blank(&line) {
                return Some(line);
            }
        }
        None
    }

    /// Whatever is left once the body has ended, if not blank.
    pub fn finish(&mut self) -> Option<Vec<u8>> {
        let rest = std::mem::take(&mut self.buf);
        if is_blank(&rest) {
            None
        } else {
            Some(rest)
        }
    }
}

fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(u8::is_ascii_whitespace)
}
