//! Common Error Types

use thiserror::Error;

/// Errors raised while decoding shared vocabulary values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Role name outside the fixed vocabulary.
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// Membership status outside the known set.
    #[error("Unknown membership status: {0}")]
    UnknownStatus(String),
}

/// Result type for common operations.
pub type Result<T> = std::result::Result<T, Error>;
