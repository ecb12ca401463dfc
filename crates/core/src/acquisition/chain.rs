//! Strategy chain runner
//!
//! Tries acquisition strategies in their fixed priority order. A strategy
//! that is not applicable or that passes hands over to the next one; the
//! first pending strategy to succeed, cancel or fail ends the run.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use grantflow_domain::{AuthServerConfig, CompanionConfig, GrantRequest};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::browser::EmbeddedBrowserStrategy;
use super::companion::CompanionAppStrategy;
use super::ports::{BrowserFlow, CompanionApp};
use super::strategy::{AcquisitionStrategy, Launch, StrategyOutcome};
use crate::session::ports::{DefaultHost, HostEnvironment};

pub const NETWORK_PERMISSION_MESSAGE: &str = "This operation needs network permission.";
pub const EXHAUSTED_MESSAGE: &str = "Failed to get authorization code";
const CANCELED_MESSAGE: &str = "authorization request was canceled";

/// Terminal result of one chain run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainOutcome {
    /// Redirect URL carrying the authorization code
    Granted(String),
    Canceled(String),
    Failed(String),
}

/// Ordered acquisition strategies plus the host they check preconditions
/// against
pub struct StrategyChain {
    strategies: Vec<Arc<dyn AcquisitionStrategy>>,
    host: Arc<dyn HostEnvironment>,
    active: Mutex<Option<(u64, Arc<dyn AcquisitionStrategy>)>>,
    runs: AtomicU64,
}

impl StrategyChain {
    /// Chain trying `strategies` in the given order
    #[must_use]
    pub fn new(strategies: Vec<Arc<dyn AcquisitionStrategy>>) -> Self {
        Self {
            strategies,
            host: Arc::new(DefaultHost),
            active: Mutex::new(None),
            runs: AtomicU64::new(0),
        }
    }

    /// Standard order: companion signed in, companion signed out, embedded
    /// browser
    ///
    /// Companion strategies are left out when `companion` is `None` or the
    /// configuration disables them.
    #[must_use]
    pub fn standard(
        companion: Option<Arc<dyn CompanionApp>>,
        browser: Arc<dyn BrowserFlow>,
        companion_config: &CompanionConfig,
        auth: &AuthServerConfig,
    ) -> Self {
        let mut strategies: Vec<Arc<dyn AcquisitionStrategy>> = Vec::with_capacity(3);

        if let Some(app) = companion.filter(|_| companion_config.enabled) {
            let signed_in = CompanionAppStrategy::signed_in(app.clone(), companion_config.clone());
            let signed_out = CompanionAppStrategy::signed_out(app, companion_config.clone());
            strategies.push(Arc::new(signed_in));
            strategies.push(Arc::new(signed_out));
        }
        strategies.push(Arc::new(EmbeddedBrowserStrategy::new(browser, auth.authorize_url())));

        Self::new(strategies)
    }

    /// Use `host` for strategy preconditions
    #[must_use]
    pub fn with_host(mut self, host: Arc<dyn HostEnvironment>) -> Self {
        self.host = host;
        self
    }

    /// Strategy names in priority order
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|strategy| strategy.name()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Run the chain until a strategy produces a terminal outcome
    ///
    /// When `cancel` fires, the pending strategy is asked to cancel and the
    /// run ends as `Canceled`.
    pub async fn run(&self, request: &GrantRequest, cancel: CancellationToken) -> ChainOutcome {
        let run_id = self.runs.fetch_add(1, Ordering::SeqCst);

        for strategy in &self.strategies {
            if cancel.is_cancelled() {
                return ChainOutcome::Canceled(CANCELED_MESSAGE.to_string());
            }

            if strategy.requires_network() && !self.host.network_permitted() {
                return ChainOutcome::Failed(NETWORK_PERMISSION_MESSAGE.to_string());
            }

            let outcome = match strategy.try_acquire(request) {
                Launch::NotApplicable(reason) => {
                    debug!(strategy = strategy.name(), %reason, "Strategy not applicable");
                    continue;
                }
                Launch::Pending(outcome) => {
                    *self.active.lock() = Some((run_id, strategy.clone()));
                    let result = tokio::select! {
                        biased;
                        () = cancel.cancelled() => {
                            strategy.cancel();
                            None
                        }
                        outcome = outcome => Some(outcome),
                    };
                    self.release(run_id);
                    result
                }
            };

            match outcome {
                None => return ChainOutcome::Canceled(CANCELED_MESSAGE.to_string()),
                Some(StrategyOutcome::Success(redirect_url)) => {
                    return ChainOutcome::Granted(redirect_url);
                }
                Some(StrategyOutcome::Cancel(message)) => return ChainOutcome::Canceled(message),
                Some(StrategyOutcome::Error(message)) => return ChainOutcome::Failed(message),
                Some(StrategyOutcome::Pass) => {
                    debug!(strategy = strategy.name(), "Strategy passed to the next one");
                }
            }
        }

        ChainOutcome::Failed(EXHAUSTED_MESSAGE.to_string())
    }

    /// Forward a cancel to the pending strategy, if any
    pub fn cancel(&self) {
        let active = self.active.lock().as_ref().map(|(_, strategy)| strategy.clone());
        if let Some(strategy) = active {
            debug!(strategy = strategy.name(), "Canceling pending strategy");
            strategy.cancel();
        }
    }

    fn release(&self, run_id: u64) {
        let mut active = self.active.lock();
        if active.as_ref().is_some_and(|(id, _)| *id == run_id) {
            *active = None;
        }
    }
}
