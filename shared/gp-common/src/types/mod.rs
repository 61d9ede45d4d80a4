//! Shared Types

pub mod member;
pub mod role;
pub mod session;

pub use member::*;
pub use role::*;
pub use session::*;
