//! Authorization session domain

pub mod listener;
pub mod memory_cache;
pub mod ports;
pub mod service;

pub use listener::{ListenerRegistry, SessionListener};
pub use memory_cache::MemoryTokenCache;
pub use ports::*;
pub use service::{Session, SessionBuilder};
