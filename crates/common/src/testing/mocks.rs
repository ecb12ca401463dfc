//! Mock implementations of platform services
//!
//! Designed for tests: unavailability is injected explicitly, never by the
//! environment.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::security::{KeychainError, SecretStore};

type StorageData = Arc<Mutex<HashMap<String, String>>>;

/// Mock keychain provider that stores secrets in memory
///
/// Clones share storage, so a test can hand one clone to the code under test
/// and inspect the other.
#[derive(Clone, Debug)]
pub struct MockKeychainProvider {
    storage: StorageData,
    service_name: String,
    unavailable: Arc<Mutex<bool>>,
}

impl MockKeychainProvider {
    /// Create a new mock keychain provider with a service name for namespacing
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            storage: Arc::new(Mutex::new(HashMap::new())),
            service_name: service_name.into(),
            unavailable: Arc::new(Mutex::new(false)),
        }
    }

    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Make every subsequent operation fail with `AccessFailed`
    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock() = unavailable;
    }

    /// Snapshot of all stored keys, sorted
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.storage.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Remove every stored secret
    pub fn clear_all(&self) {
        self.storage.lock().clear();
    }

    fn check_available(&self) -> Result<(), KeychainError> {
        if *self.unavailable.lock() {
            return Err(KeychainError::AccessFailed(format!(
                "mock keychain {} is locked",
                self.service_name
            )));
        }
        Ok(())
    }
}

impl Default for MockKeychainProvider {
    fn default() -> Self {
        Self::new("grantflow.mock")
    }
}

impl SecretStore for MockKeychainProvider {
    fn set_secret(&self, key: &str, value: &str) -> Result<(), KeychainError> {
        self.check_available()?;
        self.storage.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get_secret(&self, key: &str) -> Result<String, KeychainError> {
        self.check_available()?;
        self.storage.lock().get(key).cloned().ok_or(KeychainError::NotFound)
    }

    fn delete_secret(&self, key: &str) -> Result<(), KeychainError> {
        self.check_available()?;
        self.storage.lock().remove(key);
        Ok(())
    }
}
