//! Error types for the macropad API access layer.
//!
//! # Design
//! `NotImplemented` gets its own variant because a 501 means the firmware does
//! not offer the capability at all, which the UI reports differently from a
//! rejected request. Timeouts and transport failures stay distinct so the
//! executor's retry policy can classify them; every other non-2xx lands in
//! `Http` with the raw status and body.
//!
//! Body decode failures have no variant: a malformed success body is coerced
//! to text or an empty object before it can reach a caller.

use thiserror::Error;

/// Errors returned by the executor and the typed endpoint facade.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("request to {path} timed out after {timeout_ms}ms")]
    Timeout { path: String, timeout_ms: u64 },

    #[error("could not reach device for {path}: {message}")]
    Transport { path: String, message: String },

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("{path} is not implemented by this firmware")]
    NotImplemented { path: String },

    #[error("no mock data available for {path}")]
    MockUnavailable { path: String },

    #[error("failed to load mock data for {path}: {reason}")]
    MockLoad { path: String, reason: String },

    #[error("failed to serialize request body: {0}")]
    Serialization(String),
}

impl ApiError {
    /// True for failures caused by the link rather than by the device's answer.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, ApiError::Timeout { .. } | ApiError::Transport { .. })
    }

    /// HTTP status carried by the error, if the device answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            ApiError::NotImplemented { .. } => Some(501),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Serialization(err.to_string())
    }
}

/// Failures reported by a `Transport` before any HTTP status was received.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("{0}")]
    Connect(String),
}
