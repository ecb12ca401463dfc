//! Secret storage primitives
//!
//! [`SecretStore`] is the seam token caches are written against;
//! [`KeychainProvider`] backs it with the platform keychain and
//! `testing::MockKeychainProvider` with memory.

pub mod keychain;
pub mod traits;

pub use keychain::{KeychainError, KeychainProvider};
pub use traits::SecretStore;
