//! Port interfaces for the session
//!
//! These traits define the boundaries between the session state machine and
//! its infrastructure: token persistence, the token endpoint, and the host
//! application.

use async_trait::async_trait;
use grantflow_domain::{
    AppIdentity, ExchangeError, GrantflowError, Token, TokenCacheError, TokenFields,
};

/// Durable per-identity storage of token fields
///
/// Calls are synchronous and short; the session invokes them while holding
/// its state lock.
pub trait TokenCache: Send + Sync {
    /// Load the stored fields; an identity with nothing stored yields empty
    /// fields
    fn load(&self, identity: &AppIdentity) -> Result<TokenFields, TokenCacheError>;

    /// Replace the stored fields
    fn save(&self, identity: &AppIdentity, fields: &TokenFields) -> Result<(), TokenCacheError>;

    /// Remove everything stored for the identity
    fn clear(&self, identity: &AppIdentity) -> Result<(), TokenCacheError>;
}

/// Credential presented to the token endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    AuthorizationCode(String),
    RefreshToken(String),
}

/// One code-for-token or refresh-for-token exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeRequest {
    pub identity: AppIdentity,
    pub credential: Credential,
}

impl ExchangeRequest {
    #[must_use]
    pub fn with_code(identity: AppIdentity, code: impl Into<String>) -> Self {
        Self { identity, credential: Credential::AuthorizationCode(code.into()) }
    }

    #[must_use]
    pub fn with_refresh_token(identity: AppIdentity, refresh_token: impl Into<String>) -> Self {
        Self { identity, credential: Credential::RefreshToken(refresh_token.into()) }
    }

    /// Whether the exchange is driven by a refresh token
    #[must_use]
    pub const fn is_refresh(&self) -> bool {
        matches!(self.credential, Credential::RefreshToken(_))
    }
}

/// Issues token exchanges against the authorization server
///
/// Failures are completion values, never panics; the error records whether
/// the input was a refresh token.
#[async_trait]
pub trait TokenExchanger: Send + Sync {
    /// Exchange a credential for a new token
    async fn exchange(&self, request: ExchangeRequest) -> Result<Token, ExchangeError>;

    /// Exchange an authorization code
    async fn exchange_with_code(
        &self,
        identity: AppIdentity,
        code: &str,
    ) -> Result<Token, ExchangeError> {
        self.exchange(ExchangeRequest::with_code(identity, code)).await
    }

    /// Exchange a refresh token
    async fn exchange_with_refresh_token(
        &self,
        identity: AppIdentity,
        refresh_token: &str,
    ) -> Result<Token, ExchangeError> {
        self.exchange(ExchangeRequest::with_refresh_token(identity, refresh_token)).await
    }
}

/// Services of the host application the session depends on
pub trait HostEnvironment: Send + Sync {
    /// Verify the host declared what the session needs before a request is
    /// started
    ///
    /// # Errors
    /// Returns the error the session closes with (typically
    /// `MissConfiguration`)
    fn check_ready(&self) -> Result<(), GrantflowError> {
        Ok(())
    }

    /// Whether the host may use the network
    fn network_permitted(&self) -> bool {
        true
    }

    /// Drop any cookies held by embedded browser flows
    fn clear_cookies(&self) {}
}

/// Host with no declarations to check and no cookie jar
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHost;

impl HostEnvironment for DefaultHost {}
