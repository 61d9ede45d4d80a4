//! Per-page access decisions.
//!
//! Both decisions look at a single page only; ancestors are the
//! [`ancestors`](super::ancestors) module's concern.
//!
//! Edit resolution (context-free, used by back-office tooling):
//! 1. Superuser
//! 2. Officer role (director, secretary, webmaster)
//! 3. Explicit member grant on the page
//!
//! View resolution, first match wins:
//! 1. Public page
//! 2. Caller can edit the page
//! 3. Verified bypass session
//! 4. Caller is not an active member (deny)
//! 5. Page has no role grants
//! 6. Page grants "any active member"
//! 7. Caller holds at least one granted role (else deny)

use std::collections::HashSet;

use gp_common::{Principal, RoleRequirement, SessionContext};
use tracing::debug;
use uuid::Uuid;

use super::models::PageAccess;
use super::session::is_bypass_session;

/// Why an edit was allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditGrant {
    Superuser,
    Officer,
    MemberGrant,
}

/// Which rule settled a view decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewStep {
    /// The page is public.
    Public,
    /// The caller may edit the page.
    Editor,
    /// The session passed the bypass gate.
    BypassSession,
    /// Denied: not an active member.
    NotActiveMember,
    /// Private page without role grants.
    ///
    /// Open to every active member. Whether such pages should instead
    /// require at least one explicit grant is an unresolved policy question;
    /// the current behaviour is kept.
    OpenToActiveMembers,
    /// The page grants any active member.
    AnyActiveMember,
    /// The caller holds one of the granted roles.
    RoleMatched,
    /// Denied: none of the granted roles is held.
    RoleMissing,
}

impl ViewStep {
    /// Whether this step grants access.
    #[must_use]
    pub const fn is_granted(self) -> bool {
        !matches!(self, Self::NotActiveMember | Self::RoleMissing)
    }
}

type GuardKey = (Uuid, Option<Uuid>);

/// Re-entry guard for the edit-implies-view step.
///
/// Lives for one top-level evaluation and is passed down explicitly. Two
/// evaluations never share a guard.
#[derive(Debug, Default)]
pub struct EvalGuard {
    active: HashSet<GuardKey>,
}

impl EvalGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `(page, principal)` as in progress.
    ///
    /// Returns `None` when the pair is already being evaluated further up
    /// the stack. The pair is released when the token drops.
    pub fn enter(&mut self, page_id: Uuid, principal_id: Option<Uuid>) -> Option<GuardToken<'_>> {
        let key = (page_id, principal_id);
        if !self.active.insert(key) {
            return None;
        }
        Some(GuardToken { guard: self, key })
    }

    /// Whether `(page, principal)` is currently in progress.
    #[must_use]
    pub fn is_active(&self, page_id: Uuid, principal_id: Option<Uuid>) -> bool {
        self.active.contains(&(page_id, principal_id))
    }

    /// Whether no pair is in progress.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

/// Held while a `(page, principal)` pair is being evaluated.
#[derive(Debug)]
pub struct GuardToken<'g> {
    guard: &'g mut EvalGuard,
    key: GuardKey,
}

impl GuardToken<'_> {
    /// The guard, for evaluations nested under this one.
    pub fn guard(&mut self) -> &mut EvalGuard {
        self.guard
    }
}

impl Drop for GuardToken<'_> {
    fn drop(&mut self) {
        self.guard.active.remove(&self.key);
    }
}

/// Resolve the edit rule that applies, if any.
#[must_use]
pub fn edit_grant(principal: &Principal, page: &PageAccess) -> Option<EditGrant> {
    if principal.is_anonymous() {
        return None;
    }
    if principal.superuser {
        Some(EditGrant::Superuser)
    } else if principal.is_officer() {
        Some(EditGrant::Officer)
    } else if principal.id.is_some_and(|id| page.has_member_grant(id)) {
        Some(EditGrant::MemberGrant)
    } else {
        None
    }
}

/// Whether `principal` may edit `page` in back-office tooling.
///
/// Independent of the page's public flag.
#[must_use]
pub fn can_edit(principal: &Principal, page: &PageAccess) -> bool {
    let grant = edit_grant(principal, page);
    debug!(
        page_id = %page.id(),
        member_id = ?principal.id,
        grant = ?grant,
        "edit decision"
    );
    grant.is_some()
}

/// Resolve which view rule settles the decision, sharing `guard` with the
/// enclosing evaluation.
pub fn view_step(
    principal: &Principal,
    page: &PageAccess,
    session: Option<&SessionContext>,
    guard: &mut EvalGuard,
) -> ViewStep {
    if page.is_public() {
        return ViewStep::Public;
    }

    if let Some(_token) = guard.enter(page.id(), principal.id) {
        if edit_grant(principal, page).is_some() {
            return ViewStep::Editor;
        }
    }

    if is_bypass_session(session) {
        return ViewStep::BypassSession;
    }

    if !principal.is_active_member() {
        return ViewStep::NotActiveMember;
    }

    if page.role_grants.is_empty() {
        return ViewStep::OpenToActiveMembers;
    }

    if page.role_grants.contains(&RoleRequirement::AnyActiveMember) {
        return ViewStep::AnyActiveMember;
    }

    let matched = page.role_grants.iter().any(|req| match req {
        RoleRequirement::Role(role) => principal.has_role(*role),
        RoleRequirement::AnyActiveMember => true,
    });

    if matched {
        ViewStep::RoleMatched
    } else {
        ViewStep::RoleMissing
    }
}

/// Whether `principal` may view `page`, looking at this page only.
#[must_use]
pub fn can_view(principal: &Principal, page: &PageAccess, session: Option<&SessionContext>) -> bool {
    let mut guard = EvalGuard::new();
    let step = view_step(principal, page, session, &mut guard);
    debug!(
        page_id = %page.id(),
        member_id = ?principal.id,
        step = ?step,
        "view decision"
    );
    step.is_granted()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::models::fixtures::page;
    use gp_common::{MembershipStatus, Role, RoleFlags};

    fn active(roles: RoleFlags) -> Principal {
        Principal::member(Uuid::new_v4(), MembershipStatus::Full, roles)
    }

    fn lapsed(roles: RoleFlags) -> Principal {
        Principal::member(Uuid::new_v4(), MembershipStatus::Inactive, roles)
    }

    #[test]
    fn test_public_page_visible_to_everyone() {
        let p = page("about", None, true);
        assert!(can_view(&Principal::anonymous(), &p, None));
        assert!(can_view(&lapsed(RoleFlags::empty()), &p, None));
    }

    #[test]
    fn test_anonymous_denied_private_page() {
        let p = page("members", None, false);
        let mut guard = EvalGuard::new();
        assert_eq!(
            view_step(&Principal::anonymous(), &p, None, &mut guard),
            ViewStep::NotActiveMember
        );
    }

    #[test]
    fn test_private_page_without_grants_open_to_active_members() {
        let p = page("members", None, false);
        let mut guard = EvalGuard::new();
        assert_eq!(
            view_step(&active(RoleFlags::empty()), &p, None, &mut guard),
            ViewStep::OpenToActiveMembers
        );
        assert!(!can_view(&lapsed(RoleFlags::empty()), &p, None));
    }

    #[test]
    fn test_role_grants_combine_with_or() {
        let p = page("ops", None, false)
            .with_role(Role::Instructor)
            .with_role(Role::Towpilot);

        assert!(can_view(&active(RoleFlags::INSTRUCTOR), &p, None));
        assert!(can_view(&active(RoleFlags::TOWPILOT), &p, None));
        assert!(!can_view(&active(RoleFlags::TREASURER), &p, None));
        assert!(!can_view(&lapsed(RoleFlags::INSTRUCTOR), &p, None));
    }

    #[test]
    fn test_any_active_member_sentinel() {
        let p = page("notices", None, false)
            .with_role(RoleRequirement::AnyActiveMember)
            .with_role(Role::Treasurer);

        let mut guard = EvalGuard::new();
        assert_eq!(
            view_step(&active(RoleFlags::empty()), &p, None, &mut guard),
            ViewStep::AnyActiveMember
        );
        assert!(!can_view(&lapsed(RoleFlags::empty()), &p, None));
    }

    #[test]
    fn test_board_minutes_scenario() {
        let minutes = page("board-minutes", None, false).with_role(Role::Director);

        let a = active(RoleFlags::empty());
        let b = active(RoleFlags::DIRECTOR);

        assert!(!can_view(&a, &minutes, None));
        assert!(can_view(&b, &minutes, None));
    }

    #[test]
    fn test_edit_rules() {
        let grantee = active(RoleFlags::empty());
        let p = page("roster", None, true).with_member(grantee.id.unwrap_or_default());

        assert_eq!(edit_grant(&grantee, &p), Some(EditGrant::MemberGrant));
        assert_eq!(
            edit_grant(&active(RoleFlags::SECRETARY), &p),
            Some(EditGrant::Officer)
        );
        assert_eq!(
            edit_grant(&active(RoleFlags::empty()).with_superuser(true), &p),
            Some(EditGrant::Superuser)
        );
        assert_eq!(edit_grant(&active(RoleFlags::INSTRUCTOR), &p), None);
        assert!(!can_edit(&Principal::anonymous(), &p));
    }

    #[test]
    fn test_editor_sees_restricted_page() {
        let grantee = lapsed(RoleFlags::empty());
        let p = page("treasury", None, false)
            .with_role(Role::Treasurer)
            .with_member(grantee.id.unwrap_or_default());

        let mut guard = EvalGuard::new();
        assert_eq!(view_step(&grantee, &p, None, &mut guard), ViewStep::Editor);
        assert!(guard.is_empty());
    }

    #[test]
    fn test_bypass_session_passes_active_member_check() {
        let kiosk = lapsed(RoleFlags::empty());
        let p = page("ops", None, false).with_role(Role::DutyOfficer);

        assert!(!can_view(&kiosk, &p, None));
        assert!(!can_view(&kiosk, &p, Some(&SessionContext::none())));
        assert!(can_view(&kiosk, &p, Some(&SessionContext::verified_bypass())));
    }

    #[test]
    fn test_guard_blocks_reentry_and_releases() {
        let p = page("x", None, false);
        let who = Some(Uuid::new_v4());
        let mut guard = EvalGuard::new();

        {
            let mut token = guard.enter(p.id(), who).expect("first entry");
            let nested = token.guard();
            assert!(nested.is_active(p.id(), who));
            assert!(nested.enter(p.id(), who).is_none());
            // A different principal on the same page is independent.
            assert!(nested.enter(p.id(), None).is_some());
        }

        assert!(guard.is_empty());
        assert!(guard.enter(p.id(), who).is_some());
    }

    #[test]
    fn test_reentry_skips_edit_step() {
        let officer = lapsed(RoleFlags::DIRECTOR);
        let p = page("board", None, false).with_role(Role::Director);
        let mut guard = EvalGuard::new();

        let mut token = guard.enter(p.id(), officer.id).expect("first entry");
        // Re-entered for the same pair: the edit step is skipped, so the
        // lapsed officer falls through to the active-member check.
        assert_eq!(
            view_step(&officer, &p, None, token.guard()),
            ViewStep::NotActiveMember
        );
        drop(token);

        assert_eq!(view_step(&officer, &p, None, &mut guard), ViewStep::Editor);
    }

    #[test]
    fn test_guard_released_on_panic() {
        let page_id = Uuid::new_v4();
        let mut guard = EvalGuard::new();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _token = guard.enter(page_id, None);
            panic!("evaluation failed");
        }));

        assert!(result.is_err());
        assert!(guard.is_empty());
    }

    #[test]
    fn test_view_step_grant_flags() {
        assert!(ViewStep::Public.is_granted());
        assert!(ViewStep::Editor.is_granted());
        assert!(ViewStep::BypassSession.is_granted());
        assert!(ViewStep::OpenToActiveMembers.is_granted());
        assert!(ViewStep::AnyActiveMember.is_granted());
        assert!(ViewStep::RoleMatched.is_granted());
        assert!(!ViewStep::NotActiveMember.is_granted());
        assert!(!ViewStep::RoleMissing.is_granted());
    }
}
