//! Authentication
//!
//! Validates access tokens issued by the club's login service and turns
//! them into a [`Caller`] for access decisions.

mod error;
pub mod jwt;
mod middleware;

pub use error::{AuthError, AuthResult, ErrorResponse};
pub use middleware::{resolve_caller, AuthMember, Caller};
