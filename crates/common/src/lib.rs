//! Modular common utilities shared across Grantflow crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: digests and certificate fingerprints
//! - `runtime`: async test helpers (tokio-based)
//! - `platform`: platform keychain access
//! - `observability`: tracing for the modules that log
//! - `test-utils`: mocks and assertion macros for downstream tests

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod crypto;

// Platform tier
// -------------------------------------------------------------------
#[cfg(feature = "platform")]
pub mod security;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "runtime", feature = "test-utils", test))]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "foundation")]
pub use crypto::digest::{fingerprint_matches, sha256_hex};
#[cfg(feature = "platform")]
pub use security::{KeychainError, KeychainProvider, SecretStore};
