//! Keychain-backed token cache
//!
//! Each token field is a separate secret named `{namespace}.{field}` under the
//! store's service, so a locked or partially written keychain degrades to
//! missing fields rather than an unreadable blob.

use grantflow_common::{KeychainError, SecretStore};
use grantflow_core::TokenCache;
use grantflow_domain::constants::CACHE_KEYS;
use grantflow_domain::{AppIdentity, TokenCacheError, TokenFields};
use tracing::debug;

use crate::errors::conversions::IntoCacheError;

/// [`TokenCache`] over any [`SecretStore`]
///
/// Only the four token keys are persisted; other fields are ignored.
#[derive(Debug, Clone)]
pub struct KeychainTokenCache<S> {
    store: S,
}

impl<S: SecretStore> KeychainTokenCache<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn secret_key(identity: &AppIdentity, field: &str) -> String {
        format!("{}.{field}", identity.cache_namespace())
    }
}

impl<S: SecretStore> TokenCache for KeychainTokenCache<S> {
    fn load(&self, identity: &AppIdentity) -> Result<TokenFields, TokenCacheError> {
        let mut fields = TokenFields::new();
        for field in CACHE_KEYS {
            match self.store.get_secret(&Self::secret_key(identity, field)) {
                Ok(value) => fields.insert(field, value),
                Err(KeychainError::NotFound) => {}
                Err(err) => return Err(err.into_cache_error()),
            }
        }
        debug!(
            namespace = identity.cache_namespace(),
            fields = fields.len(),
            "loaded token from keychain"
        );
        Ok(fields)
    }

    fn save(&self, identity: &AppIdentity, fields: &TokenFields) -> Result<(), TokenCacheError> {
        for field in CACHE_KEYS {
            let key = Self::secret_key(identity, field);
            let written = match fields.get(field) {
                Some(value) => self.store.set_secret(&key, value),
                None => self.store.delete_secret(&key),
            };
            written.map_err(IntoCacheError::into_cache_error)?;
        }
        Ok(())
    }

    fn clear(&self, identity: &AppIdentity) -> Result<(), TokenCacheError> {
        for field in CACHE_KEYS {
            match self.store.delete_secret(&Self::secret_key(identity, field)) {
                Ok(()) | Err(KeychainError::NotFound) => {}
                Err(err) => return Err(err.into_cache_error()),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for cache::keychain.
    use grantflow_common::testing::MockKeychainProvider;
    use grantflow_domain::constants::CACHE_KEY_REFRESH_TOKEN;
    use grantflow_domain::Token;

    use super::*;

    /// Validates `KeychainTokenCache::save` for the secret naming scenario.
    ///
    /// Assertions:
    /// - Confirms each field is stored under `{app_key}.{field}`.
    #[test]
    fn test_fields_are_namespaced_by_app_key() {
        let store = MockKeychainProvider::new("grantflow.test");
        let cache = KeychainTokenCache::new(store.clone());
        let identity = AppIdentity::new("demo").unwrap();

        let token = Token::from_response("A", 60, Some("R".into()), None);
        cache.save(&identity, &token.to_fields()).unwrap();

        let keys = store.keys();
        assert_eq!(keys.len(), 4);
        assert!(keys.contains(&format!("demo.{CACHE_KEY_REFRESH_TOKEN}")));
        assert_eq!(store.get_secret(&format!("demo.{CACHE_KEY_REFRESH_TOKEN}")).unwrap(), "R");
    }

    /// Validates `KeychainTokenCache::load` for the locked keychain scenario.
    ///
    /// Assertions:
    /// - Ensures access failures surface as `Unavailable`.
    #[test]
    fn test_locked_keychain_is_unavailable() {
        let store = MockKeychainProvider::new("grantflow.test");
        let cache = KeychainTokenCache::new(store.clone());
        store.set_unavailable(true);

        let err = cache.load(&AppIdentity::new("demo").unwrap()).unwrap_err();
        assert!(matches!(err, TokenCacheError::Unavailable(_)));
    }
}
