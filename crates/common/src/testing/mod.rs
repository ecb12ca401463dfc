//! Testing utilities and helpers
//!
//! - **[`async_utils`]**: eventual assertions and polling for async tests
//! - **[`mocks`]**: in-memory stand-ins for platform services
//!
//! ## Usage
//!
//! ```rust
//! # #[cfg(feature = "platform")]
//! # {
//! use grantflow_common::security::SecretStore;
//! use grantflow_common::testing::MockKeychainProvider;
//!
//! let keychain = MockKeychainProvider::new("grantflow.test");
//! keychain.set_secret("key", "value").unwrap();
//! assert!(keychain.secret_exists("key"));
//! # }
//! ```

pub mod async_utils;
#[cfg(feature = "platform")]
pub mod mocks;

// Note: assert_eventually_async! is exported at the crate root
pub use async_utils::{poll_until, settle, timeout_ok};
#[cfg(feature = "platform")]
pub use mocks::MockKeychainProvider;
