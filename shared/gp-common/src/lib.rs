//! Glidepath Common Library
//!
//! Types shared between the access engine and the services that feed it:
//! the role vocabulary, the principal capability snapshot and the session
//! context handed over by the authentication layer.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
