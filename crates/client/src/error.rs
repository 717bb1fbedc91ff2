//! Errors raised by the request layer.
//!
//! [`ApiError`] is the only error type that reaches UI code. Storage and
//! background refreshes never raise.

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur when talking to the Icycon backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure (DNS, connection, TLS, timeout) or body read failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered outside 200-299.
    ///
    /// Displays as the extracted message alone so it can be shown to users.
    #[error("{message}")]
    Status {
        status: u16,
        message: String,
        /// Parsed error body, when it was JSON.
        body: Option<Value>,
    },

    /// Request payload could not be encoded, or a typed response did not
    /// match the expected shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A typed call received text or no body where JSON was expected.
    #[error("Expected a JSON response body (status {status})")]
    UnexpectedBody { status: u16 },

    /// Path could not be resolved against the base URL.
    #[error("Invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// A header value could not be encoded.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
}

impl ApiError {
    /// HTTP status for backend-reported errors.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } | Self::UnexpectedBody { status } => Some(*status),
            _ => None,
        }
    }

    /// Whether the backend rejected the credentials.
    ///
    /// The UI layer typically ends the session when this is true.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status: 401, .. })
    }
}

/// Choose the human-readable message for a failed response.
///
/// Priority: `detail` field, `error` field, the whole JSON body, the raw
/// text, then a generic `Request failed (<status>)`.
pub(crate) fn error_message(status: StatusCode, parsed: Option<&Value>, raw: &str) -> String {
    if let Some(value) = parsed {
        if let Some(message) = ["detail", "error"]
            .into_iter()
            .find_map(|key| value.get(key).and_then(field_message))
        {
            return message;
        }
        if !value.is_null() {
            return value.to_string();
        }
    }

    if !raw.is_empty() {
        return raw.to_string();
    }

    format!("Request failed ({})", status.as_u16())
}

/// Message carried by a `detail`/`error` field; blank and falsy values are skipped.
fn field_message(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
