//! Session Context
//!
//! What the authentication layer knows about the session beyond identity.

/// Session facts handed to the access engine.
///
/// Only the authentication layer constructs a verified context, after it has
/// checked a bound-device credential on its own. No constructor reads a
/// member record or client-supplied data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionContext {
    bypass_verified: bool,
}

impl SessionContext {
    /// A session with no special standing.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            bypass_verified: false,
        }
    }

    /// A session whose shared-device credential has been verified.
    #[must_use]
    pub const fn verified_bypass() -> Self {
        Self {
            bypass_verified: true,
        }
    }

    /// Whether the verified bypass flag is present.
    #[must_use]
    pub const fn has_verified_bypass(&self) -> bool {
        self.bypass_verified
    }
}
