//! Authorization session state machine
//!
//! `Session` owns the token, the pending grant and the in-flight request
//! marker behind one lock. Strategy runs and token exchanges execute on
//! spawned tasks outside the lock; their completions come back through
//! [`Session::on_grant_acquired`] and [`Session::on_token_acquired`] carrying
//! the ticket they were issued, so a completion that lost a race with
//! `close()` is recognised as stale and dropped.
//!
//! Cache writes, cookie clearing and listener dispatch are collected while
//! the state lock is held and run after it is released.

use std::sync::Arc;

use grantflow_domain::{
    AppIdentity, ExchangeError, Grant, GrantflowError, RequestKind, RequestTicket, Result,
    SessionState, Token, TokenFields,
};
use parking_lot::{Mutex, MutexGuard};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::listener::{ListenerRegistry, Notification, NotificationDispatcher, SessionListener};
use super::ports::{
    Credential, DefaultHost, ExchangeRequest, HostEnvironment, TokenCache, TokenExchanger,
};
use crate::acquisition::{ChainOutcome, StrategyChain};

const NO_CREDENTIAL_MESSAGE: &str =
    "can not request access token because both authorization code and refresh token are invalid";
const INVALID_TOKEN_MESSAGE: &str = "the token endpoint returned an invalid access token";
const EXCHANGE_CANCELED_MESSAGE: &str = "token request was canceled";

struct InFlight {
    ticket: RequestTicket,
    cancel: CancellationToken,
}

struct SessionCore {
    state: SessionState,
    in_flight: Option<InFlight>,
    grant: Grant,
    token: Token,
    initialized: bool,
    epoch: u64,
}

impl SessionCore {
    fn is_current(&self, ticket: RequestTicket) -> bool {
        self.in_flight.as_ref().is_some_and(|in_flight| in_flight.ticket == ticket)
    }

    fn pending_ticket(&self) -> Option<RequestTicket> {
        self.in_flight.as_ref().map(|in_flight| in_flight.ticket)
    }

    /// Passive `OPEN -> ACQUIRING` demotion once the access token expired
    fn demote_if_expired(&mut self) {
        if self.state == SessionState::Open && !self.token.is_valid() {
            debug!("Access token expired; session needs a refresh");
            self.state = SessionState::Acquiring;
            self.in_flight = None;
            self.grant = Grant::empty();
        }
    }
}

enum CacheWrite {
    Save(TokenFields),
    Clear,
}

/// Work left by a transition for after the state lock is released
#[derive(Default)]
struct Effects {
    cache: Option<CacheWrite>,
    clear_cookies: bool,
    notification: Option<Notification>,
}

struct SessionInner {
    identity: AppIdentity,
    cache: Arc<dyn TokenCache>,
    exchanger: Arc<dyn TokenExchanger>,
    chain: Arc<StrategyChain>,
    host: Arc<dyn HostEnvironment>,
    core: Mutex<SessionCore>,
    /// Orders cache writes and dispatch; always taken while `core` is held
    effects: Mutex<()>,
    listeners: ListenerRegistry,
    dispatcher: NotificationDispatcher,
    runtime: Handle,
}

/// Authorization session for one application identity
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    /// Start building a session for `identity`
    #[must_use]
    pub fn builder(identity: AppIdentity) -> SessionBuilder {
        SessionBuilder::new(identity)
    }

    #[must_use]
    pub fn identity(&self) -> &AppIdentity {
        &self.inner.identity
    }

    /// Load the cached token on first call and attempt an implicit open
    ///
    /// Returns `true` iff a silent refresh was started, in which case
    /// `listener` receives its outcome. On `false` the caller has to ask the
    /// user before calling [`Session::open`].
    pub fn initialize(&self, listener: Option<Arc<dyn SessionListener>>) -> bool {
        let mut core = self.inner.core.lock();
        let mut effects = Effects::default();
        if !core.initialized {
            core.initialized = true;
            core.token = self.load_token();

            if core.token.is_valid() {
                core.state = SessionState::Open;
            } else if core.token.has_refresh_token() {
                core.state = SessionState::Acquiring;
            } else {
                effects = self.close_locked(&mut core, None, false);
            }
            info!(
                app_key = %self.inner.identity.app_key(),
                state = %core.state,
                "Session initialized"
            );
        }

        core.demote_if_expired();
        let implicit = core.state == SessionState::Acquiring && core.token.has_refresh_token();
        self.finish(core, effects);

        if implicit {
            self.open(listener);
        }
        implicit
    }

    /// Drive the session towards `OPEN`
    ///
    /// No-op when already open. While a request is in flight the listener is
    /// registered and the call returns; the listener receives the outcome of
    /// that request.
    pub fn open(&self, listener: Option<Arc<dyn SessionListener>>) {
        if self.state().is_open() {
            debug!("Session is already open");
            return;
        }

        if let Some(listener) = listener {
            self.inner.listeners.register(listener);
        }

        let ready = self.inner.host.check_ready();

        let mut core = self.inner.core.lock();
        if let Some(ticket) = core.pending_ticket() {
            debug!(request = %ticket, "Session request is still in progress");
            return;
        }

        if let Err(error) = ready {
            let effects = self.close_locked(&mut core, Some(error), false);
            self.finish(core, effects);
            return;
        }

        match core.state {
            SessionState::Open => {}
            SessionState::Closed => {
                let (ticket, cancel) = Self::begin(&mut core, RequestKind::AcquiringGrant);
                drop(core);
                self.spawn_acquisition(ticket, cancel);
            }
            SessionState::Acquiring => {
                let (kind, credential) = if core.token.has_refresh_token() {
                    (
                        RequestKind::Refreshing,
                        Credential::RefreshToken(core.token.refresh_token().to_string()),
                    )
                } else if core.grant.is_present() {
                    (
                        RequestKind::ExchangingCode,
                        Credential::AuthorizationCode(core.grant.code().to_string()),
                    )
                } else {
                    let error = GrantflowError::AuthorizationFailed(NO_CREDENTIAL_MESSAGE.into());
                    let effects = self.close_locked(&mut core, Some(error), false);
                    self.finish(core, effects);
                    return;
                };

                let (ticket, cancel) = Self::begin(&mut core, kind);
                drop(core);
                self.spawn_exchange(ticket, cancel, credential);
            }
        }
    }

    /// Close the session and wipe stored credentials
    ///
    /// Always accepted; listeners are notified even when already closed.
    pub fn close(&self, listener: Option<Arc<dyn SessionListener>>) {
        if let Some(listener) = listener {
            self.inner.listeners.register(listener);
        }

        let mut core = self.inner.core.lock();
        let effects = self.close_locked(&mut core, None, true);
        self.finish(core, effects);
    }

    /// Ask the in-flight request to stop
    ///
    /// A pending strategy is canceled and the session closes with
    /// `CANCELED_OPERATION`; a canceled refresh keeps the refresh token.
    pub fn cancel(&self) {
        let core = self.inner.core.lock();
        if let Some(in_flight) = &core.in_flight {
            debug!(request = %in_flight.ticket, "Canceling session request");
            in_flight.cancel.cancel();
        }
    }

    /// Current state, after re-validating the access token expiry
    #[must_use]
    pub fn state(&self) -> SessionState {
        let mut core = self.inner.core.lock();
        core.demote_if_expired();
        core.state
    }

    /// Current access token, if still valid
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        let mut core = self.inner.core.lock();
        core.demote_if_expired();
        core.token.is_valid().then(|| core.token.access_token().to_string())
    }

    /// The in-flight request marker
    #[must_use]
    pub fn pending_request(&self) -> Option<RequestTicket> {
        self.inner.core.lock().pending_ticket()
    }

    /// Completion of a strategy chain run
    ///
    /// A granted code is exchanged under the same lock acquisition that
    /// accepted it, so a concurrent `close()` either discards this
    /// completion or cancels the exchange.
    pub fn on_grant_acquired(&self, ticket: RequestTicket, outcome: ChainOutcome) {
        let mut core = self.inner.core.lock();
        if !core.is_current(ticket) {
            debug!(request = %ticket, "Discarding stale grant completion");
            return;
        }

        let failure = match outcome {
            ChainOutcome::Granted(redirect_url) => match self.grant_from_redirect(&redirect_url) {
                Ok(grant) => {
                    let from = core.state;
                    let credential = Credential::AuthorizationCode(grant.code().to_string());
                    core.grant = grant;
                    core.state = SessionState::Acquiring;
                    log_transition(from, SessionState::Acquiring, Some(ticket), None);

                    let (next, cancel) = Self::begin(&mut core, RequestKind::ExchangingCode);
                    drop(core);
                    self.spawn_exchange(next, cancel, credential);
                    return;
                }
                Err(error) => error,
            },
            ChainOutcome::Canceled(message) => GrantflowError::CanceledOperation(message),
            ChainOutcome::Failed(message) => GrantflowError::AuthorizationFailed(message),
        };

        let effects = self.close_locked(&mut core, Some(failure), true);
        self.finish(core, effects);
    }

    /// Completion of a token exchange
    pub fn on_token_acquired(
        &self,
        ticket: RequestTicket,
        result: std::result::Result<Token, ExchangeError>,
    ) {
        let mut core = self.inner.core.lock();
        if !core.is_current(ticket) {
            debug!(request = %ticket, "Discarding stale token completion");
            return;
        }

        let effects = match result {
            Ok(fresh) if fresh.is_valid() => {
                core.token.merge_refreshed(fresh);
                core.grant = Grant::empty();
                core.in_flight = None;

                let from = core.state;
                core.state = SessionState::Open;
                Effects {
                    cache: Some(CacheWrite::Save(core.token.to_fields())),
                    notification: self.notify_transition(
                        from,
                        SessionState::Open,
                        Some(ticket),
                        None,
                        false,
                    ),
                    ..Effects::default()
                }
            }
            Ok(_) => {
                let error = GrantflowError::AuthorizationFailed(INVALID_TOKEN_MESSAGE.into());
                self.close_locked(&mut core, Some(error), true)
            }
            Err(error) if ticket.kind.is_refresh() && error.is_canceled() => {
                core.in_flight = None;
                debug!(request = %ticket, "Refresh canceled; keeping refresh token");
                Effects::default()
            }
            Err(error) => self.close_locked(&mut core, Some(GrantflowError::from(error)), true),
        };
        self.finish(core, effects);
    }

    fn load_token(&self) -> Token {
        match self.inner.cache.load(&self.inner.identity) {
            Ok(fields) => Token::from_fields(&fields),
            Err(e) => {
                warn!(error = %e, "Failed to load cached token; starting without one");
                Token::empty()
            }
        }
    }

    fn grant_from_redirect(&self, redirect_url: &str) -> Result<Grant> {
        let redirect_uri = self.inner.identity.redirect_uri();
        if !redirect_url.starts_with(redirect_uri) {
            return Err(GrantflowError::AuthorizationFailed(format!(
                "mismatched the registered redirect uri. expected={redirect_uri}, \
                 actual={redirect_url}"
            )));
        }

        let grant = Grant::from_redirect_url(redirect_url);
        if !grant.is_present() {
            return Err(GrantflowError::AuthorizationFailed(format!(
                "the redirect url does not have authorization code. url={redirect_url}"
            )));
        }
        Ok(grant)
    }

    fn begin(core: &mut SessionCore, kind: RequestKind) -> (RequestTicket, CancellationToken) {
        core.epoch += 1;
        let ticket = RequestTicket { kind, epoch: core.epoch };
        let cancel = CancellationToken::new();
        core.in_flight = Some(InFlight { ticket, cancel: cancel.clone() });
        debug!(request = %ticket, "Session request started");
        (ticket, cancel)
    }

    fn spawn_acquisition(&self, ticket: RequestTicket, cancel: CancellationToken) {
        let session = self.clone();
        let request = self.inner.identity.grant_request();
        self.inner.runtime.spawn(async move {
            let outcome = session.inner.chain.run(&request, cancel).await;
            session.on_grant_acquired(ticket, outcome);
        });
    }

    fn spawn_exchange(
        &self,
        ticket: RequestTicket,
        cancel: CancellationToken,
        credential: Credential,
    ) {
        let session = self.clone();
        let request = ExchangeRequest { identity: self.inner.identity.clone(), credential };
        self.inner.runtime.spawn(async move {
            let refresh = request.is_refresh();
            let exchanger = session.inner.exchanger.clone();
            let result = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    Err(ExchangeError::canceled(EXCHANGE_CANCELED_MESSAGE, refresh))
                }
                result = exchanger.exchange(request) => result,
            };
            session.on_token_acquired(ticket, result);
        });
    }

    fn close_locked(
        &self,
        core: &mut SessionCore,
        error: Option<GrantflowError>,
        forced: bool,
    ) -> Effects {
        let from = core.state;
        let request = core.in_flight.take().map(|in_flight| {
            in_flight.cancel.cancel();
            in_flight.ticket
        });

        core.state = SessionState::Closed;
        core.grant = Grant::empty();
        core.token = Token::empty();

        Effects {
            cache: Some(CacheWrite::Clear),
            clear_cookies: true,
            notification: self.notify_transition(
                from,
                SessionState::Closed,
                request,
                error,
                forced,
            ),
        }
    }

    /// Release the state lock, then run `effects`
    ///
    /// The effects lock is taken before `core` is released, so cache writes
    /// and notifications keep transition order. Host callbacks run with no
    /// session lock held.
    fn finish(&self, core: MutexGuard<'_, SessionCore>, effects: Effects) {
        let ordered = self.inner.effects.lock();
        drop(core);

        let identity = &self.inner.identity;
        match effects.cache {
            Some(CacheWrite::Save(fields)) => {
                if let Err(e) = self.inner.cache.save(identity, &fields) {
                    warn!(error = %e, "Failed to persist token");
                }
            }
            Some(CacheWrite::Clear) => {
                if let Err(e) = self.inner.cache.clear(identity) {
                    warn!(error = %e, "Failed to clear token cache");
                }
            }
            None => {}
        }
        if let Some(notification) = effects.notification {
            self.inner.dispatcher.dispatch(notification);
        }
        drop(ordered);

        if effects.clear_cookies {
            self.inner.host.clear_cookies();
        }
    }

    /// Log a transition and drain the listeners it notifies
    ///
    /// Unforced transitions that change nothing and carry no error are
    /// silent. `ACQUIRING` is never delivered to listeners.
    fn notify_transition(
        &self,
        from: SessionState,
        to: SessionState,
        request: Option<RequestTicket>,
        error: Option<GrantflowError>,
        forced: bool,
    ) -> Option<Notification> {
        if !forced && from == to && error.is_none() {
            return None;
        }
        log_transition(from, to, request, error.as_ref());

        if to == SessionState::Acquiring {
            return None;
        }

        let listeners = self.inner.listeners.take_all();
        if listeners.is_empty() {
            return None;
        }
        Some(Notification { state: to, error, listeners })
    }
}

/// Builder for [`Session`]
pub struct SessionBuilder {
    identity: AppIdentity,
    cache: Option<Arc<dyn TokenCache>>,
    exchanger: Option<Arc<dyn TokenExchanger>>,
    chain: Option<Arc<StrategyChain>>,
    host: Option<Arc<dyn HostEnvironment>>,
    runtime: Option<Handle>,
}

impl SessionBuilder {
    #[must_use]
    pub fn new(identity: AppIdentity) -> Self {
        Self { identity, cache: None, exchanger: None, chain: None, host: None, runtime: None }
    }

    #[must_use]
    pub fn token_cache(mut self, cache: Arc<dyn TokenCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    #[must_use]
    pub fn exchanger(mut self, exchanger: Arc<dyn TokenExchanger>) -> Self {
        self.exchanger = Some(exchanger);
        self
    }

    #[must_use]
    pub fn chain(mut self, chain: StrategyChain) -> Self {
        self.chain = Some(Arc::new(chain));
        self
    }

    /// Defaults to [`DefaultHost`]
    #[must_use]
    pub fn host(mut self, host: Arc<dyn HostEnvironment>) -> Self {
        self.host = Some(host);
        self
    }

    /// Runtime for request tasks and listener dispatch; defaults to the
    /// current one
    #[must_use]
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Build the session
    ///
    /// # Errors
    /// Returns `MissConfiguration` when the cache, exchanger or chain is
    /// missing, or when no tokio runtime is available.
    pub fn build(self) -> Result<Session> {
        let cache = self.cache.ok_or_else(|| missing("token cache"))?;
        let exchanger = self.exchanger.ok_or_else(|| missing("token exchanger"))?;
        let chain = self.chain.ok_or_else(|| missing("strategy chain"))?;
        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(|e| {
                GrantflowError::MissConfiguration(format!("session needs a tokio runtime: {e}"))
            })?,
        };
        let host = self.host.unwrap_or_else(|| Arc::new(DefaultHost));

        let dispatcher = NotificationDispatcher::spawn(&runtime);

        Ok(Session {
            inner: Arc::new(SessionInner {
                identity: self.identity,
                cache,
                exchanger,
                chain,
                host,
                core: Mutex::new(SessionCore {
                    state: SessionState::Closed,
                    in_flight: None,
                    grant: Grant::empty(),
                    token: Token::empty(),
                    initialized: false,
                    epoch: 0,
                }),
                effects: Mutex::new(()),
                listeners: ListenerRegistry::new(),
                dispatcher,
                runtime,
            }),
        })
    }
}

fn log_transition(
    from: SessionState,
    to: SessionState,
    request: Option<RequestTicket>,
    error: Option<&GrantflowError>,
) {
    let request = request.map_or_else(|| "NONE".to_string(), |ticket| ticket.to_string());
    match error {
        Some(e) => info!(%from, %to, %request, error = %e, "Session state changed"),
        None => info!(%from, %to, %request, "Session state changed"),
    }
}

fn missing(part: &str) -> GrantflowError {
    GrantflowError::MissConfiguration(format!("session builder is missing a {part}"))
}
