//! Session state and in-flight request markers

use std::fmt;

use serde::{Deserialize, Serialize};

/// Externally visible session state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    /// No usable credentials
    #[default]
    Closed,
    /// Holds a grant or refresh-capable token, access token not yet valid
    Acquiring,
    /// Holds a valid access token
    Open,
}

impl SessionState {
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }

    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Closed => "CLOSED",
            Self::Acquiring => "ACQUIRING",
            Self::Open => "OPEN",
        };
        f.write_str(label)
    }
}

/// What the session is currently waiting for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestKind {
    /// Strategy chain is running
    AcquiringGrant,
    /// Authorization code is being exchanged
    ExchangingCode,
    /// Refresh token is being exchanged
    Refreshing,
}

impl RequestKind {
    #[must_use]
    pub const fn is_refresh(self) -> bool {
        matches!(self, Self::Refreshing)
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::AcquiringGrant => "ACQUIRING_GRANT",
            Self::ExchangingCode => "EXCHANGING_CODE",
            Self::Refreshing => "REFRESHING",
        };
        f.write_str(label)
    }
}

/// Identifies one in-flight request
///
/// Every request the session starts gets a fresh epoch; a completion whose
/// ticket no longer matches the in-flight marker is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestTicket {
    pub kind: RequestKind,
    pub epoch: u64,
}

impl fmt::Display for RequestTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.epoch)
    }
}
