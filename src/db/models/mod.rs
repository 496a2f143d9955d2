//! Database models split into domain-specific modules.

pub mod session;
pub mod stock;
pub mod user;
pub mod watchlist;

pub use session::*;
pub use stock::*;
pub use user::*;
pub use watchlist::*;
