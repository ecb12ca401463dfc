//! Platform keychain provider for secret storage
//!
//! Thin wrapper over the platform keychain (Keychain Access on macOS,
//! Credential Manager on Windows, Secret Service on Linux). Every entry lives
//! under one service name; the key is the keyring account.
//!
//! ## Usage
//!
//! ```no_run
//! use grantflow_common::security::{KeychainProvider, SecretStore};
//!
//! let keychain = KeychainProvider::new("grantflow.session");
//! keychain.set_secret("abc123.grantflow.token.AccessToken", "token")?;
//! let secret = keychain.get_secret("abc123.grantflow.token.AccessToken")?;
//! assert_eq!(secret, "token");
//! # Ok::<(), grantflow_common::security::KeychainError>(())
//! ```

use keyring::Entry;
use thiserror::Error;
use tracing::debug;

use super::traits::SecretStore;

/// Keychain-backed [`SecretStore`]
#[derive(Debug, Clone)]
pub struct KeychainProvider {
    service_name: String,
}

impl KeychainProvider {
    /// Create a keychain provider for a specific service
    ///
    /// # Arguments
    /// * `service_name` - Service identifier (e.g., "grantflow.session")
    pub fn new(service_name: impl Into<String>) -> Self {
        Self { service_name: service_name.into() }
    }

    /// Service under which entries are stored
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    fn create_entry(&self, key: &str) -> Result<Entry, KeychainError> {
        Entry::new(&self.service_name, key).map_err(|e| {
            KeychainError::AccessFailed(format!("Failed to create keychain entry: {e}"))
        })
    }
}

impl SecretStore for KeychainProvider {
    fn set_secret(&self, key: &str, value: &str) -> Result<(), KeychainError> {
        debug!(service = %self.service_name, key = %key, "Storing secret in keychain");

        let entry = self.create_entry(key)?;
        entry.set_password(value).map_err(|e| {
            KeychainError::AccessFailed(format!("Failed to store secret for {key}: {e}"))
        })
    }

    fn get_secret(&self, key: &str) -> Result<String, KeychainError> {
        debug!(service = %self.service_name, key = %key, "Retrieving secret from keychain");

        let entry = self.create_entry(key)?;
        entry.get_password().map_err(|e| match e {
            keyring::Error::NoEntry => KeychainError::NotFound,
            other => {
                KeychainError::AccessFailed(format!("Failed to retrieve secret for {key}: {other}"))
            }
        })
    }

    fn delete_secret(&self, key: &str) -> Result<(), KeychainError> {
        debug!(service = %self.service_name, key = %key, "Deleting secret from keychain");

        let entry = self.create_entry(key)?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(KeychainError::AccessFailed(format!(
                "Failed to delete secret for {key}: {e}"
            ))),
        }
    }
}

/// Keychain error types
#[derive(Debug, Error)]
pub enum KeychainError {
    /// Keychain access failed (permission denied, not available, etc.)
    #[error("Keychain access failed: {0}")]
    AccessFailed(String),

    /// Entry not found in keychain
    #[error("Entry not found")]
    NotFound,
}

#[cfg(test)]
mod tests {
    //! Unit tests for security::keychain.
    use super::*;

    /// Validates `KeychainProvider::new` behavior for the provider creation
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms `keychain.service_name()` equals `"grantflow.test"`.
    #[test]
    fn test_keychain_provider_creation() {
        let keychain = KeychainProvider::new("grantflow.test");
        assert_eq!(keychain.service_name(), "grantflow.test");
    }
}
