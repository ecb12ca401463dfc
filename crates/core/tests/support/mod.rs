//! Shared test helpers for `grantflow-core` integration tests.
//!
//! Wires a session over the standard strategy chain with in-memory doubles
//! so scenarios can focus on behaviour instead of boilerplate.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use grantflow_core::acquisition::CompanionMode;
use grantflow_core::testing::{
    identity, trusted_companion_config, FakeBrowser, FakeCompanionApp, StubExchanger,
};
use grantflow_core::{HostEnvironment, MemoryTokenCache, Session, StrategyChain};
use grantflow_domain::AuthServerConfig;

pub const AUTH_BASE_URL: &str = "https://auth.example.com";

/// Host that records cookie wipes and can go offline
#[derive(Debug)]
pub struct RecordingHost {
    online: AtomicBool,
    cookie_clears: AtomicUsize,
}

impl RecordingHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { online: AtomicBool::new(true), cookie_clears: AtomicUsize::new(0) })
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn cookie_clears(&self) -> usize {
        self.cookie_clears.load(Ordering::SeqCst)
    }
}

impl HostEnvironment for RecordingHost {
    fn network_permitted(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    fn clear_cookies(&self) {
        self.cookie_clears.fetch_add(1, Ordering::SeqCst);
    }
}

/// A session over the standard chain plus handles on every double
pub struct Harness {
    pub session: Session,
    pub cache: MemoryTokenCache,
    pub exchanger: Arc<StubExchanger>,
    pub companion: Arc<FakeCompanionApp>,
    pub browser: Arc<FakeBrowser>,
    pub host: Arc<RecordingHost>,
}

impl Harness {
    /// Session without an installed companion app
    pub fn new(cache: MemoryTokenCache, exchanger: StubExchanger) -> Self {
        Self::with_companion(cache, exchanger, FakeCompanionApp::new())
    }

    /// Session whose companion app serves both modes with a trusted package
    pub fn with_trusted_companion(cache: MemoryTokenCache, exchanger: StubExchanger) -> Self {
        let companion = FakeCompanionApp::new()
            .with_package(CompanionMode::SignedIn, FakeCompanionApp::trusted_package(200))
            .with_package(CompanionMode::SignedOut, FakeCompanionApp::trusted_package(200));
        Self::with_companion(cache, exchanger, companion)
    }

    pub fn with_companion(
        cache: MemoryTokenCache,
        exchanger: StubExchanger,
        companion: FakeCompanionApp,
    ) -> Self {
        let exchanger = Arc::new(exchanger);
        let companion = Arc::new(companion);
        let browser = Arc::new(FakeBrowser::new());
        let host = RecordingHost::new();

        let chain = standard_chain(&companion, &browser).with_host(host.clone());
        let session = Session::builder(identity())
            .token_cache(Arc::new(cache.clone()))
            .exchanger(exchanger.clone())
            .chain(chain)
            .host(host.clone())
            .build()
            .unwrap();

        Self { session, cache, exchanger, companion, browser, host }
    }
}

/// The standard chain over the given doubles
pub fn standard_chain(
    companion: &Arc<FakeCompanionApp>,
    browser: &Arc<FakeBrowser>,
) -> StrategyChain {
    StrategyChain::standard(
        Some(companion.clone()),
        browser.clone(),
        &trusted_companion_config(),
        &AuthServerConfig { base_url: AUTH_BASE_URL.into() },
    )
}
