//! Application identity registered with the authorization server

use serde::{Deserialize, Serialize};

use crate::constants::{REDIRECT_SCHEME_PREFIX, REDIRECT_SUFFIX};
use crate::errors::{GrantflowError, Result};

/// Client identity: application key, redirect target, integrity hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppIdentity {
    app_key: String,
    redirect_uri: String,
    client_integrity_hash: Option<String>,
}

impl AppIdentity {
    /// Create an identity with the default redirect target
    /// `grantflow{app_key}://oauth`
    ///
    /// # Errors
    /// Returns `GrantflowError::IllegalArgument` if `app_key` is blank
    pub fn new(app_key: impl Into<String>) -> Result<Self> {
        let app_key = app_key.into().trim().to_string();
        if app_key.is_empty() {
            return Err(GrantflowError::IllegalArgument(
                "cannot create a session identity without an application key".into(),
            ));
        }

        let redirect_uri = format!("{REDIRECT_SCHEME_PREFIX}{app_key}{REDIRECT_SUFFIX}");
        Ok(Self { app_key, redirect_uri, client_integrity_hash: None })
    }

    /// Override the redirect target
    ///
    /// # Errors
    /// Returns `GrantflowError::IllegalArgument` if `redirect_uri` is blank
    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Result<Self> {
        let redirect_uri = redirect_uri.into().trim().to_string();
        if redirect_uri.is_empty() {
            return Err(GrantflowError::IllegalArgument("redirect uri must not be empty".into()));
        }
        self.redirect_uri = redirect_uri;
        Ok(self)
    }

    /// Attach the client integrity hash sent with token exchanges
    #[must_use]
    pub fn with_client_integrity_hash(mut self, hash: impl Into<String>) -> Self {
        let hash = hash.into();
        self.client_integrity_hash = (!hash.is_empty()).then_some(hash);
        self
    }

    #[must_use]
    pub fn app_key(&self) -> &str {
        &self.app_key
    }

    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    #[must_use]
    pub fn client_integrity_hash(&self) -> Option<&str> {
        self.client_integrity_hash.as_deref()
    }

    /// Namespace under which this identity's token is cached
    #[must_use]
    pub fn cache_namespace(&self) -> &str {
        &self.app_key
    }

    /// Request handed to acquisition strategies
    #[must_use]
    pub fn grant_request(&self) -> GrantRequest {
        GrantRequest { app_key: self.app_key.clone(), redirect_uri: self.redirect_uri.clone() }
    }
}

/// Input of one grant acquisition attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantRequest {
    pub app_key: String,
    pub redirect_uri: String,
}
