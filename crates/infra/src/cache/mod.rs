//! Durable token cache backends

pub mod file;
pub mod keychain;

pub use file::FileTokenCache;
pub use keychain::KeychainTokenCache;
