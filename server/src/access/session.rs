//! Session bypass gate.
//!
//! Shared-device accounts can never be active members, so member-only pages
//! would be closed to them. A session the authentication layer has verified
//! through its bound-device flow passes the active-member requirement
//! instead. Nothing else does.

use gp_common::SessionContext;

/// Whether the session carries the verified bypass flag.
///
/// A missing context is never a bypass session.
#[must_use]
pub const fn is_bypass_session(session: Option<&SessionContext>) -> bool {
    match session {
        Some(ctx) => ctx.has_verified_bypass(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_context_is_not_bypass() {
        assert!(!is_bypass_session(None));
    }

    #[test]
    fn test_unflagged_context_is_not_bypass() {
        assert!(!is_bypass_session(Some(&SessionContext::none())));
        assert!(!is_bypass_session(Some(&SessionContext::default())));
    }

    #[test]
    fn test_verified_context_is_bypass() {
        assert!(is_bypass_session(Some(&SessionContext::verified_bypass())));
    }
}
