//! Session assembly from configuration
//!
//! Turns a [`Config`] plus the host's platform bindings into a ready
//! [`Session`]: identity, token cache backend, HTTP token exchanger and the
//! standard strategy chain.

use std::sync::Arc;

use grantflow_common::KeychainProvider;
use grantflow_core::{
    BrowserFlow, CompanionApp, DefaultHost, HostEnvironment, MemoryTokenCache, Session,
    StrategyChain, TokenCache, TokenExchanger,
};
use grantflow_domain::{CacheBackend, CacheConfig, Config, GrantflowError, Result};
use tokio::runtime::Handle;
use tracing::info;

use crate::auth::HttpTokenExchanger;
use crate::cache::{FileTokenCache, KeychainTokenCache};
use crate::errors::InfraError;
use crate::http::HttpClient;

/// Platform services supplied by the embedding application
#[derive(Clone)]
pub struct PlatformBindings {
    /// Companion app launcher; `None` when the platform has none
    pub companion: Option<Arc<dyn CompanionApp>>,
    pub browser: Arc<dyn BrowserFlow>,
    pub host: Arc<dyn HostEnvironment>,
    /// Runtime for session tasks; the current runtime when `None`
    pub runtime: Option<Handle>,
}

impl PlatformBindings {
    /// Bindings with only a browser flow and the default host
    #[must_use]
    pub fn browser_only(browser: Arc<dyn BrowserFlow>) -> Self {
        Self { companion: None, browser, host: Arc::new(DefaultHost), runtime: None }
    }

    #[must_use]
    pub fn with_companion(mut self, companion: Arc<dyn CompanionApp>) -> Self {
        self.companion = Some(companion);
        self
    }

    #[must_use]
    pub fn with_host(mut self, host: Arc<dyn HostEnvironment>) -> Self {
        self.host = host;
        self
    }

    #[must_use]
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }
}

/// Token cache for the configured backend
///
/// # Errors
/// Returns `GrantflowError::MissConfiguration` when the file backend has no
/// directory
pub fn build_token_cache(config: &CacheConfig) -> Result<Arc<dyn TokenCache>> {
    let cache: Arc<dyn TokenCache> = match config.backend {
        CacheBackend::Keychain => {
            Arc::new(KeychainTokenCache::new(KeychainProvider::new(config.service_name.clone())))
        }
        CacheBackend::File => {
            let directory = config.directory.clone().ok_or_else(|| {
                GrantflowError::MissConfiguration("file token cache needs cache.directory".into())
            })?;
            Arc::new(FileTokenCache::new(directory))
        }
        CacheBackend::Memory => Arc::new(MemoryTokenCache::new()),
    };
    Ok(cache)
}

/// HTTP exchanger against the configured token endpoint
///
/// # Errors
/// Returns `GrantflowError::MissConfiguration` when the HTTP client cannot be
/// built
pub fn build_exchanger(config: &Config) -> Result<Arc<dyn TokenExchanger>> {
    let client = HttpClient::from_config(&config.http)
        .map_err(|err| GrantflowError::from(InfraError::from(err)))?;
    Ok(Arc::new(HttpTokenExchanger::new(client, config.auth.token_url())))
}

/// Assemble a session from configuration and platform bindings
///
/// # Errors
/// Returns `GrantflowError::IllegalArgument` for a blank app key or redirect
/// uri, and `GrantflowError::MissConfiguration` for an incomplete cache
/// configuration or a missing runtime
pub fn build_session(config: &Config, bindings: PlatformBindings) -> Result<Session> {
    let identity = config.app.identity()?;
    let cache = build_token_cache(&config.cache)?;
    let exchanger = build_exchanger(config)?;

    let chain = StrategyChain::standard(
        bindings.companion,
        bindings.browser,
        &config.companion,
        &config.auth,
    )
    .with_host(bindings.host.clone());

    info!(
        app_key = identity.app_key(),
        backend = ?config.cache.backend,
        strategies = ?chain.names(),
        "building session"
    );

    let mut builder = Session::builder(identity)
        .token_cache(cache)
        .exchanger(exchanger)
        .chain(chain)
        .host(bindings.host);
    if let Some(runtime) = bindings.runtime {
        builder = builder.runtime(runtime);
    }
    builder.build()
}
