//! Acquisition strategy contract

use std::fmt;
use std::future::Future;

use futures::future::BoxFuture;
use grantflow_domain::GrantRequest;

/// Asynchronous result of a launched strategy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyOutcome {
    /// Redirect URL carrying the authorization code
    Success(String),
    /// The user aborted the flow
    Cancel(String),
    /// A real attempt was made; try the next strategy
    Pass,
    Error(String),
}

/// What `try_acquire` decided synchronously
pub enum Launch {
    /// The strategy cannot run here; the chain advances
    NotApplicable(String),
    /// A flow was launched; the chain awaits its outcome
    Pending(BoxFuture<'static, StrategyOutcome>),
}

impl Launch {
    pub fn not_applicable(reason: impl Into<String>) -> Self {
        Self::NotApplicable(reason.into())
    }

    pub fn pending<F>(outcome: F) -> Self
    where
        F: Future<Output = StrategyOutcome> + Send + 'static,
    {
        Self::Pending(Box::pin(outcome))
    }

    /// Launch whose outcome is already known
    #[must_use]
    pub fn ready(outcome: StrategyOutcome) -> Self {
        Self::pending(futures::future::ready(outcome))
    }
}

impl fmt::Debug for Launch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotApplicable(reason) => f.debug_tuple("NotApplicable").field(reason).finish(),
            Self::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// One mechanism for obtaining an authorization grant
///
/// After `cancel` returns, the pending outcome must not resolve to
/// `Success`.
pub trait AcquisitionStrategy: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Whether the host must permit network access before this strategy runs
    fn requires_network(&self) -> bool {
        false
    }

    /// Decide applicability and launch the flow
    fn try_acquire(&self, request: &GrantRequest) -> Launch;

    /// Abort the pending flow, if any
    fn cancel(&self);
}
