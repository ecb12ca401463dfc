//! # Grantflow Infrastructure
//!
//! Infrastructure implementations of the session's ports.
//!
//! This crate contains:
//! - The HTTP token exchanger (reqwest)
//! - Keychain and file token caches
//! - Configuration loading from the environment or TOML/JSON files
//! - Tracing subscriber setup
//! - [`bootstrap::build_session`], wiring a `Session` from a `Config`
//!
//! ## Architecture
//! - Implements traits defined in `grantflow-core`
//! - Contains all "impure" code (network, filesystem, platform keychain)

pub mod auth;
pub mod bootstrap;
pub mod cache;
pub mod config;
pub mod errors;
pub mod http;
pub mod observability;

// Re-export commonly used items
pub use auth::HttpTokenExchanger;
pub use bootstrap::{build_session, PlatformBindings};
pub use cache::{FileTokenCache, KeychainTokenCache};
pub use errors::{HttpError, InfraError};
pub use http::{HttpClient, HttpClientBuilder};
pub use observability::init_tracing;
