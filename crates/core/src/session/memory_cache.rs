//! In-memory token cache
//!
//! Keeps tokens for the lifetime of the process. Used when no durable backend
//! is configured and in tests.

use std::collections::HashMap;
use std::sync::Arc;

use grantflow_domain::{AppIdentity, TokenCacheError, TokenFields};
use parking_lot::Mutex;

use super::ports::TokenCache;

/// [`TokenCache`] backed by a shared map keyed by cache namespace
///
/// Clones share storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenCache {
    entries: Arc<Mutex<HashMap<String, TokenFields>>>,
}

impl MemoryTokenCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the cache with fields for an identity
    #[must_use]
    pub fn with_entry(self, identity: &AppIdentity, fields: TokenFields) -> Self {
        self.entries.lock().insert(identity.cache_namespace().to_string(), fields);
        self
    }

    /// Stored fields for an identity, if any
    #[must_use]
    pub fn entry(&self, identity: &AppIdentity) -> Option<TokenFields> {
        self.entries.lock().get(identity.cache_namespace()).cloned()
    }
}

impl TokenCache for MemoryTokenCache {
    fn load(&self, identity: &AppIdentity) -> Result<TokenFields, TokenCacheError> {
        Ok(self.entry(identity).unwrap_or_default())
    }

    fn save(&self, identity: &AppIdentity, fields: &TokenFields) -> Result<(), TokenCacheError> {
        self.entries.lock().insert(identity.cache_namespace().to_string(), fields.clone());
        Ok(())
    }

    fn clear(&self, identity: &AppIdentity) -> Result<(), TokenCacheError> {
        self.entries.lock().remove(identity.cache_namespace());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for session::memory_cache.
    use grantflow_domain::Token;

    use super::*;

    /// Validates `MemoryTokenCache` behavior for the per-identity namespace
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms saved fields load back for the same identity.
    /// - Ensures another identity sees nothing.
    /// - Ensures `clear` removes only the target identity.
    #[test]
    fn test_namespaces_are_isolated() {
        let cache = MemoryTokenCache::new();
        let first = AppIdentity::new("first").unwrap();
        let second = AppIdentity::new("second").unwrap();
        let fields = Token::from_response("A", 60, Some("R".into()), None).to_fields();

        cache.save(&first, &fields).unwrap();
        cache.save(&second, &fields).unwrap();
        assert_eq!(cache.load(&first).unwrap(), fields);

        cache.clear(&first).unwrap();
        assert!(cache.load(&first).unwrap().is_empty());
        assert_eq!(cache.load(&second).unwrap(), fields);
    }
}
