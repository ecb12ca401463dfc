//! # Grantflow Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The authorization session state machine and its listener dispatch
//! - Grant acquisition strategies and the chain that orders them
//! - Port interfaces (traits) for token storage, token exchange, the host
//!   application, the companion app and the embedded browser
//!
//! ## Architecture Principles
//! - Only depends on `grantflow-domain` and `grantflow-common`
//! - No HTTP, keychain or file system code
//! - All external dependencies via traits

pub mod acquisition;
pub mod session;

// Test doubles for unit tests and downstream integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-export specific items to avoid ambiguity
pub use acquisition::{
    AcquisitionStrategy, BrowserFlow, ChainOutcome, CompanionApp, CompanionAppStrategy,
    EmbeddedBrowserStrategy, Launch, StrategyChain, StrategyOutcome,
};
pub use session::{
    Credential, DefaultHost, ExchangeRequest, HostEnvironment, MemoryTokenCache, Session,
    SessionBuilder, SessionListener, TokenCache, TokenExchanger,
};
