//! ==============================================================================
//! error.rs - upload validation errors
//! ==============================================================================
//!
//! purpose:
//!     the only thing that can go wrong while the host is running is a device
//!     sending a query string we cannot parse. this module names that failure
//!     and turns it into the plain-text 400 response the device expects.
//!
//! relationships:
//!     - raised by: domain.rs (UploadParams::parse)
//!     - returned by: store.rs (TelemetryStore::ingest)
//!     - rendered by: server.rs (upload_handler)
//!
//! ==============================================================================

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    /// a query parameter was present but did not parse as its numeric type
    #[error("invalid value for `{field}`: {raw:?} is not {expected}")]
    InvalidInput {
        field: &'static str,
        raw: String,
        expected: &'static str,
    },

    /// the query string itself could not be decoded
    #[error("malformed query string: {0}")]
    MalformedQuery(String),
}

impl IngestError {
    pub fn invalid(field: &'static str, raw: &str, expected: &'static str) -> Self {
        IngestError::InvalidInput {
            field,
            raw: raw.to_string(),
            expected,
        }
    }

    /// name of the offending query parameter
    pub fn field(&self) -> &'static str {
        match self {
            IngestError::InvalidInput { field, .. } => *field,
            IngestError::MalformedQuery(_) => "query",
        }
    }
}

// the device firmware only checks for "OK", so errors stay plain text
impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, format!("Error: {}", self)).into_response()
    }
}
