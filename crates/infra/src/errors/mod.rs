//! Infrastructure error types

pub mod conversions;

use thiserror::Error;

/// Failure of an HTTP round trip
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("HTTP request timed out")]
    Timeout,

    #[error("HTTP connection failure: {0}")]
    Connect(String),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("invalid HTTP response body: {0}")]
    Decode(String),

    #[error("HTTP client configuration error: {0}")]
    Builder(String),

    #[error("HTTP request failed: {0}")]
    Request(String),
}

pub use conversions::InfraError;
