//! Grant acquisition
//!
//! Strategies obtain an authorization code through one mechanism each; the
//! chain tries them in priority order.

pub mod browser;
pub mod chain;
pub mod companion;
pub mod ports;
pub mod strategy;

pub use browser::EmbeddedBrowserStrategy;
pub use chain::{ChainOutcome, StrategyChain};
pub use companion::CompanionAppStrategy;
pub use ports::{
    BrowserFlow, BrowserOutcome, CompanionApp, CompanionLaunch, CompanionMode, CompanionReply,
    PackageInfo, ReplyStatus,
};
pub use strategy::{AcquisitionStrategy, Launch, StrategyOutcome};
