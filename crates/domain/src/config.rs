//! Configuration management

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::{
    AUTHORIZE_PATH, COMPANION_MIN_VERSION_CODE, DEFAULT_HTTP_MAX_ATTEMPTS,
    DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_KEYCHAIN_SERVICE, DEFAULT_LOG_LEVEL, TOKEN_PATH,
};
use crate::errors::Result;
use crate::types::AppIdentity;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub auth: AuthServerConfig,
    #[serde(default)]
    pub companion: CompanionConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub logging: LogConfig,
}

impl Config {
    /// Minimal configuration for an app key and authorization server
    #[must_use]
    pub fn new(app_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            app: AppConfig {
                app_key: app_key.into(),
                redirect_uri: None,
                client_integrity_hash: None,
            },
            auth: AuthServerConfig { base_url: base_url.into() },
            companion: CompanionConfig::default(),
            cache: CacheConfig::default(),
            http: HttpConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

/// Registered application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub app_key: String,
    #[serde(default)]
    pub redirect_uri: Option<String>,
    #[serde(default)]
    pub client_integrity_hash: Option<String>,
}

impl AppConfig {
    /// Build the session identity described by this section
    ///
    /// # Errors
    /// Returns `GrantflowError::IllegalArgument` if the app key or redirect
    /// uri is blank
    pub fn identity(&self) -> Result<AppIdentity> {
        let mut identity = AppIdentity::new(self.app_key.clone())?;
        if let Some(redirect_uri) = &self.redirect_uri {
            identity = identity.with_redirect_uri(redirect_uri.clone())?;
        }
        if let Some(hash) = &self.client_integrity_hash {
            identity = identity.with_client_integrity_hash(hash.clone());
        }
        Ok(identity)
    }
}

/// Authorization server location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthServerConfig {
    /// Scheme and host, e.g. `https://auth.example.com`
    pub base_url: String,
}

impl AuthServerConfig {
    /// Get the authorization endpoint
    #[must_use]
    pub fn authorize_url(&self) -> String {
        format!("{}/{AUTHORIZE_PATH}", self.base_url.trim_end_matches('/'))
    }

    /// Get the token endpoint
    #[must_use]
    pub fn token_url(&self) -> String {
        format!("{}/{TOKEN_PATH}", self.base_url.trim_end_matches('/'))
    }
}

/// Companion app acceptance policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanionConfig {
    pub enabled: bool,
    pub min_version_code: u32,
    /// Hex SHA-256 fingerprints of trusted signing certificates
    pub trusted_fingerprints: Vec<String>,
}

impl Default for CompanionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_version_code: COMPANION_MIN_VERSION_CODE,
            trusted_fingerprints: Vec::new(),
        }
    }
}

/// Token cache backend selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Keychain,
    File,
    Memory,
}

/// Token cache configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    /// Directory for the file backend
    pub directory: Option<PathBuf>,
    /// Keychain service name
    pub service_name: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            directory: None,
            service_name: DEFAULT_KEYCHAIN_SERVICE.to_string(),
        }
    }
}

/// HTTP transport configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub max_attempts: usize,
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            max_attempts: DEFAULT_HTTP_MAX_ATTEMPTS,
            user_agent: None,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: DEFAULT_LOG_LEVEL.to_string(), format: LogFormat::default() }
    }
}
