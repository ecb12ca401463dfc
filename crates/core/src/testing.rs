//! Test doubles for the session and its ports
//!
//! Enabled for unit tests and, through the `test-utils` feature, for
//! downstream integration tests.

// Test helpers; panics are the assertion mechanism
#![allow(clippy::missing_panics_doc)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use futures::future::BoxFuture;
use grantflow_common::crypto::sha256_hex;
use grantflow_domain::{
    AppIdentity, CompanionConfig, ExchangeError, GrantRequest, GrantflowError, Token,
};
use parking_lot::Mutex;
use tokio::sync::{oneshot, Semaphore};
use url::Url;

use crate::acquisition::{
    AcquisitionStrategy, BrowserFlow, BrowserOutcome, CompanionApp, CompanionLaunch, CompanionMode,
    CompanionReply, Launch, PackageInfo, StrategyOutcome,
};
use crate::session::{ExchangeRequest, SessionListener, TokenExchanger};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Certificate the fake companion package is signed with
pub const TRUSTED_CERTIFICATE: &[u8] = b"grantflow-companion-release-certificate";

/// Identity used across tests; redirect target `grantflowtest-app://oauth`
#[must_use]
pub fn identity() -> AppIdentity {
    AppIdentity::new("test-app").unwrap()
}

/// Redirect URL the identity's flows complete with
#[must_use]
pub fn redirect_with_code(code: &str) -> String {
    format!("{}?code={code}", identity().redirect_uri())
}

/// Access token valid for an hour, with a refresh token
#[must_use]
pub fn valid_token() -> Token {
    Token::from_response("access-1", 3600, Some("refresh-1".into()), Some(86_400))
}

/// Expired access token with a usable refresh token
#[must_use]
pub fn expired_token_with_refresh() -> Token {
    let now = Utc::now();
    Token::new("access-0", now - Duration::hours(1), "refresh-0", now + Duration::days(30))
}

/// Refresh token only
#[must_use]
pub fn refresh_only_token() -> Token {
    Token::new("", chrono::DateTime::<Utc>::MIN_UTC, "refresh-0", Utc::now() + Duration::days(30))
}

/// Companion policy trusting [`TRUSTED_CERTIFICATE`]
#[must_use]
pub fn trusted_companion_config() -> CompanionConfig {
    CompanionConfig {
        trusted_fingerprints: vec![sha256_hex(TRUSTED_CERTIFICATE)],
        ..CompanionConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Listener
// ---------------------------------------------------------------------------

/// Notification observed by a [`RecordingListener`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Opened,
    Closed(Option<GrantflowError>),
}

/// Listener that records every notification
#[derive(Debug, Default)]
pub struct RecordingListener {
    events: Mutex<Vec<SessionEvent>>,
}

impl RecordingListener {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    #[must_use]
    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.lock().clone()
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.events.lock().len()
    }

    #[must_use]
    pub fn last(&self) -> Option<SessionEvent> {
        self.events.lock().last().cloned()
    }
}

impl SessionListener for RecordingListener {
    fn on_opened(&self) {
        self.events.lock().push(SessionEvent::Opened);
    }

    fn on_closed(&self, error: Option<&GrantflowError>) {
        self.events.lock().push(SessionEvent::Closed(error.cloned()));
    }
}

// ---------------------------------------------------------------------------
// Strategy
// ---------------------------------------------------------------------------

enum Script {
    Immediate(StrategyOutcome),
    NotApplicable,
    Deferred,
}

/// Strategy with a scripted behaviour
///
/// Deferred strategies stay pending until [`ScriptedStrategy::complete`] or
/// `cancel` is called; `cancel` resolves them to `Cancel`.
pub struct ScriptedStrategy {
    name: &'static str,
    script: Script,
    requires_network: bool,
    pending: Mutex<Option<oneshot::Sender<StrategyOutcome>>>,
    launches: AtomicUsize,
    cancels: AtomicUsize,
}

impl ScriptedStrategy {
    fn with_script(name: &'static str, script: Script) -> Self {
        Self {
            name,
            script,
            requires_network: false,
            pending: Mutex::new(None),
            launches: AtomicUsize::new(0),
            cancels: AtomicUsize::new(0),
        }
    }

    /// Resolves to `outcome` as soon as it is launched
    #[must_use]
    pub fn immediate(name: &'static str, outcome: StrategyOutcome) -> Self {
        Self::with_script(name, Script::Immediate(outcome))
    }

    #[must_use]
    pub fn not_applicable(name: &'static str) -> Self {
        Self::with_script(name, Script::NotApplicable)
    }

    /// Stays pending until completed or canceled
    #[must_use]
    pub fn deferred(name: &'static str) -> Self {
        Self::with_script(name, Script::Deferred)
    }

    #[must_use]
    pub fn requiring_network(mut self) -> Self {
        self.requires_network = true;
        self
    }

    /// Resolve the pending launch; returns `false` if nothing was pending
    pub fn complete(&self, outcome: StrategyOutcome) -> bool {
        self.pending.lock().take().is_some_and(|sender| sender.send(outcome).is_ok())
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.lock().is_some()
    }

    #[must_use]
    pub fn launch_count(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn cancel_count(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

impl AcquisitionStrategy for ScriptedStrategy {
    fn name(&self) -> &'static str {
        self.name
    }

    fn requires_network(&self) -> bool {
        self.requires_network
    }

    fn try_acquire(&self, _request: &GrantRequest) -> Launch {
        match &self.script {
            Script::NotApplicable => {
                Launch::not_applicable(format!("{} is scripted off", self.name))
            }
            Script::Immediate(outcome) => {
                self.launches.fetch_add(1, Ordering::SeqCst);
                Launch::ready(outcome.clone())
            }
            Script::Deferred => {
                self.launches.fetch_add(1, Ordering::SeqCst);
                let (sender, receiver) = oneshot::channel();
                *self.pending.lock() = Some(sender);
                Launch::pending(async move {
                    receiver.await.unwrap_or_else(|_| StrategyOutcome::Cancel("dropped".into()))
                })
            }
        }
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        if let Some(sender) = self.pending.lock().take() {
            let _ = sender.send(StrategyOutcome::Cancel("canceled".into()));
        }
    }
}

// ---------------------------------------------------------------------------
// Exchanger
// ---------------------------------------------------------------------------

/// Exchanger answering from a queue of scripted responses
///
/// A held exchanger blocks every exchange until [`StubExchanger::release`].
#[derive(Default)]
pub struct StubExchanger {
    responses: Mutex<VecDeque<Result<Token, ExchangeError>>>,
    requests: Mutex<Vec<ExchangeRequest>>,
    gate: Option<Semaphore>,
}

impl StubExchanger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Exchanger whose exchanges wait for [`StubExchanger::release`]
    #[must_use]
    pub fn held() -> Self {
        Self { gate: Some(Semaphore::new(0)), ..Self::default() }
    }

    #[must_use]
    pub fn with_response(self, response: Result<Token, ExchangeError>) -> Self {
        self.push_response(response);
        self
    }

    pub fn push_response(&self, response: Result<Token, ExchangeError>) {
        self.responses.lock().push_back(response);
    }

    /// Let one held exchange proceed
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    #[must_use]
    pub fn requests(&self) -> Vec<ExchangeRequest> {
        self.requests.lock().clone()
    }

    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl TokenExchanger for StubExchanger {
    async fn exchange(&self, request: ExchangeRequest) -> Result<Token, ExchangeError> {
        let refresh = request.is_refresh();
        self.requests.lock().push(request);

        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| {
                Err(ExchangeError::invalid_response("no scripted response", refresh))
            })
    }
}

// ---------------------------------------------------------------------------
// Companion app
// ---------------------------------------------------------------------------

/// In-memory companion app
///
/// Launches answer with the next queued reply; with none queued they stay
/// pending until [`FakeCompanionApp::reply`] or `cancel`.
#[derive(Default)]
pub struct FakeCompanionApp {
    packages: Mutex<HashMap<CompanionMode, PackageInfo>>,
    queued: Mutex<VecDeque<Option<CompanionReply>>>,
    pending: Mutex<Option<oneshot::Sender<Option<CompanionReply>>>>,
    launch_error: Mutex<Option<String>>,
    launches: Mutex<Vec<CompanionLaunch>>,
    cancels: AtomicUsize,
}

impl FakeCompanionApp {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Package signed with [`TRUSTED_CERTIFICATE`]
    #[must_use]
    pub fn trusted_package(version_code: u32) -> PackageInfo {
        PackageInfo {
            package_name: "com.example.companion".into(),
            version_code,
            signing_certificates: vec![TRUSTED_CERTIFICATE.to_vec()],
        }
    }

    #[must_use]
    pub fn with_package(self, mode: CompanionMode, package: PackageInfo) -> Self {
        self.packages.lock().insert(mode, package);
        self
    }

    pub fn queue_reply(&self, reply: Option<CompanionReply>) {
        self.queued.lock().push_back(reply);
    }

    /// Answer the pending launch; returns `false` if nothing was pending
    pub fn reply(&self, reply: Option<CompanionReply>) -> bool {
        self.pending.lock().take().is_some_and(|sender| sender.send(reply).is_ok())
    }

    pub fn fail_launches(&self, reason: impl Into<String>) {
        *self.launch_error.lock() = Some(reason.into());
    }

    #[must_use]
    pub fn launches(&self) -> Vec<CompanionLaunch> {
        self.launches.lock().clone()
    }

    #[must_use]
    pub fn cancel_count(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

impl CompanionApp for FakeCompanionApp {
    fn installed_package(&self, mode: CompanionMode) -> Option<PackageInfo> {
        self.packages.lock().get(&mode).cloned()
    }

    fn launch(
        &self,
        launch: CompanionLaunch,
    ) -> Result<BoxFuture<'static, Option<CompanionReply>>, String> {
        if let Some(reason) = self.launch_error.lock().clone() {
            return Err(reason);
        }
        self.launches.lock().push(launch);

        if let Some(reply) = self.queued.lock().pop_front() {
            return Ok(Box::pin(futures::future::ready(reply)));
        }

        let (sender, receiver) = oneshot::channel();
        *self.pending.lock() = Some(sender);
        Ok(Box::pin(async move { receiver.await.ok().flatten() }))
    }

    fn cancel(&self, _mode: CompanionMode) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        if let Some(sender) = self.pending.lock().take() {
            let _ = sender.send(None);
        }
    }
}

// ---------------------------------------------------------------------------
// Browser
// ---------------------------------------------------------------------------

/// In-memory embedded browser
///
/// Flows resolve with the next queued outcome; with none queued they stay
/// open until [`FakeBrowser::redirect`] or `dismiss`.
#[derive(Default)]
pub struct FakeBrowser {
    queued: Mutex<VecDeque<BrowserOutcome>>,
    pending: Mutex<Option<oneshot::Sender<BrowserOutcome>>>,
    opened: Mutex<Vec<Url>>,
    dismisses: AtomicUsize,
}

impl FakeBrowser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_outcome(&self, outcome: BrowserOutcome) {
        self.queued.lock().push_back(outcome);
    }

    /// Complete the open flow with a redirect; returns `false` if none is open
    pub fn redirect(&self, redirect_url: impl Into<String>) -> bool {
        let outcome = BrowserOutcome::Redirected(redirect_url.into());
        self.pending.lock().take().is_some_and(|sender| sender.send(outcome).is_ok())
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.pending.lock().is_some()
    }

    #[must_use]
    pub fn opened_urls(&self) -> Vec<Url> {
        self.opened.lock().clone()
    }

    #[must_use]
    pub fn dismiss_count(&self) -> usize {
        self.dismisses.load(Ordering::SeqCst)
    }
}

impl BrowserFlow for FakeBrowser {
    fn open(
        &self,
        authorize_url: &Url,
        _redirect_uri: &str,
    ) -> Result<BoxFuture<'static, BrowserOutcome>, String> {
        self.opened.lock().push(authorize_url.clone());

        if let Some(outcome) = self.queued.lock().pop_front() {
            return Ok(Box::pin(futures::future::ready(outcome)));
        }

        let (sender, receiver) = oneshot::channel();
        *self.pending.lock() = Some(sender);
        Ok(Box::pin(async move { receiver.await.unwrap_or(BrowserOutcome::Dismissed) }))
    }

    fn dismiss(&self) {
        self.dismisses.fetch_add(1, Ordering::SeqCst);
        if let Some(sender) = self.pending.lock().take() {
            let _ = sender.send(BrowserOutcome::Dismissed);
        }
    }
}
