//! Error types used throughout the session layer

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Grantflow
///
/// The four variants are the whole taxonomy a session consumer can observe:
/// listeners receive one of them in `on_closed`, and every fallible public
/// operation returns one of them.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum GrantflowError {
    /// Bad caller input (e.g. an empty application key)
    #[error("ILLEGAL_ARGUMENT : {0}")]
    IllegalArgument(String),

    /// A required host-side declaration or setting is absent
    #[error("MISS_CONFIGURATION : {0}")]
    MissConfiguration(String),

    /// The user aborted the operation
    #[error("CANCELED_OPERATION : {0}")]
    CanceledOperation(String),

    /// Grant acquisition or token exchange failed
    #[error("AUTHORIZATION_FAILED : {0}")]
    AuthorizationFailed(String),
}

/// Discriminant of [`GrantflowError`] for matching without the message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    IllegalArgument,
    MissConfiguration,
    CanceledOperation,
    AuthorizationFailed,
}

impl GrantflowError {
    /// Kind of this error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::IllegalArgument(_) => ErrorKind::IllegalArgument,
            Self::MissConfiguration(_) => ErrorKind::MissConfiguration,
            Self::CanceledOperation(_) => ErrorKind::CanceledOperation,
            Self::AuthorizationFailed(_) => ErrorKind::AuthorizationFailed,
        }
    }

    /// Human-readable message without the kind prefix
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::IllegalArgument(msg)
            | Self::MissConfiguration(msg)
            | Self::CanceledOperation(msg)
            | Self::AuthorizationFailed(msg) => msg,
        }
    }

    /// Whether this error represents a user-initiated abort
    #[must_use]
    pub const fn is_canceled(&self) -> bool {
        matches!(self, Self::CanceledOperation(_))
    }
}

/// Result type alias for Grantflow operations
pub type Result<T> = std::result::Result<T, GrantflowError>;

/// Why a token exchange did not produce a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExchangeErrorKind {
    /// The request was abandoned before a response arrived
    Canceled,
    /// The server answered with an error body
    Rejected {
        /// Provider error code from the `{code, msg}` body
        code: i32,
    },
    /// The request never produced a response
    Transport,
    /// The response could not be interpreted as a token
    InvalidResponse,
}

/// Completion error of a token exchange
///
/// `refresh` records whether the exchange was driven by a refresh token; the
/// session keeps a refresh-capable token when such an exchange is canceled.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message}")]
pub struct ExchangeError {
    pub kind: ExchangeErrorKind,
    pub message: String,
    pub refresh: bool,
}

impl ExchangeError {
    /// Create an exchange error of the given kind
    #[must_use]
    pub fn new(kind: ExchangeErrorKind, message: impl Into<String>, refresh: bool) -> Self {
        Self { kind, message: message.into(), refresh }
    }

    /// Exchange abandoned by cancellation
    #[must_use]
    pub fn canceled(message: impl Into<String>, refresh: bool) -> Self {
        Self::new(ExchangeErrorKind::Canceled, message, refresh)
    }

    /// Server rejected the exchange with `{code, msg}`
    #[must_use]
    pub fn rejected(code: i32, message: impl Into<String>, refresh: bool) -> Self {
        Self::new(ExchangeErrorKind::Rejected { code }, message, refresh)
    }

    /// Transport-level failure (connect, timeout, TLS)
    #[must_use]
    pub fn transport(message: impl Into<String>, refresh: bool) -> Self {
        Self::new(ExchangeErrorKind::Transport, message, refresh)
    }

    /// Response body could not be turned into a token
    #[must_use]
    pub fn invalid_response(message: impl Into<String>, refresh: bool) -> Self {
        Self::new(ExchangeErrorKind::InvalidResponse, message, refresh)
    }

    #[must_use]
    pub const fn is_canceled(&self) -> bool {
        matches!(self.kind, ExchangeErrorKind::Canceled)
    }
}

impl From<ExchangeError> for GrantflowError {
    fn from(err: ExchangeError) -> Self {
        if err.is_canceled() {
            Self::CanceledOperation(err.message)
        } else {
            Self::AuthorizationFailed(err.message)
        }
    }
}

/// Failure of a token cache backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenCacheError {
    /// Backend could not be reached (keychain locked, I/O failure)
    #[error("token cache unavailable: {0}")]
    Unavailable(String),

    /// Stored data could not be decoded
    #[error("token cache corrupted: {0}")]
    Corrupted(String),
}
