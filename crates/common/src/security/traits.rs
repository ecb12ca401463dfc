//! Trait abstractions for secret storage
//!
//! Lets token caches run against the platform keychain in production and an
//! in-memory store in tests without changing their code.

use super::keychain::KeychainError;

/// Flat string key/value secret storage
pub trait SecretStore: Send + Sync {
    /// Store `value` under `key`, replacing any previous value
    ///
    /// # Errors
    /// Returns `KeychainError::AccessFailed` if the backend rejects the write
    fn set_secret(&self, key: &str, value: &str) -> Result<(), KeychainError>;

    /// Read the value stored under `key`
    ///
    /// # Errors
    /// Returns `KeychainError::NotFound` if nothing is stored under `key`
    fn get_secret(&self, key: &str) -> Result<String, KeychainError>;

    /// Remove `key`; removing a missing key succeeds
    ///
    /// # Errors
    /// Returns `KeychainError::AccessFailed` if the backend rejects the delete
    fn delete_secret(&self, key: &str) -> Result<(), KeychainError>;

    /// Whether a value is stored under `key`
    fn secret_exists(&self, key: &str) -> bool {
        self.get_secret(key).is_ok()
    }
}
