//! Domain value types

pub mod grant;
pub mod identity;
pub mod session;
pub mod token;

pub use grant::Grant;
pub use identity::{AppIdentity, GrantRequest};
pub use session::{RequestKind, RequestTicket, SessionState};
pub use token::{Token, TokenFields};
