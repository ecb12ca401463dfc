//! Shared cryptographic helpers used across foundation and platform features.

pub mod digest;

pub use digest::{fingerprint_matches, normalize_fingerprint, sha256_hex};
