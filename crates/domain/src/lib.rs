//! # Grantflow Domain
//!
//! Value types and errors for the authorization session.
//!
//! This crate contains:
//! - Credential types (`Token`, `Grant`) and their persisted form
//! - Session state, request markers and application identity
//! - Error taxonomy and Result definitions
//! - Configuration structures and protocol constants
//!
//! ## Architecture
//! - No dependencies on other Grantflow crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
