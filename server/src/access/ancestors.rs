//! Ancestor chain enforcement.
//!
//! A page is reachable only if the caller may view it and every page above
//! it. A public page under a restricted parent stays closed to callers who
//! fail the parent's check.
//!
//! Chains are ordered root first, target last, exactly as
//! [`load_ancestor_chain`](super::queries::load_ancestor_chain) and
//! [`resolve_path`](super::queries::resolve_path) return them.

use gp_common::{Principal, SessionContext};
use tracing::{debug, warn};

use super::evaluator::{view_step, EvalGuard};
use super::models::PageAccess;

/// Whether each element's parent is the element before it, starting at a
/// root page.
#[must_use]
pub fn is_well_formed(chain: &[PageAccess]) -> bool {
    let Some(first) = chain.first() else {
        return false;
    };
    first.parent_id().is_none()
        && chain
            .windows(2)
            .all(|pair| pair[1].parent_id() == Some(pair[0].id()))
}

/// First page in the chain the caller may not view, root first.
#[must_use]
pub fn first_denied<'a>(
    principal: &Principal,
    chain: &'a [PageAccess],
    session: Option<&SessionContext>,
) -> Option<&'a PageAccess> {
    let mut guard = EvalGuard::new();
    chain
        .iter()
        .find(|page| !view_step(principal, page, session, &mut guard).is_granted())
}

/// Whether `principal` may view the last page of `chain` and all of its
/// ancestors.
///
/// Empty or malformed chains are denied.
#[must_use]
pub fn can_view_with_ancestors(
    principal: &Principal,
    chain: &[PageAccess],
    session: Option<&SessionContext>,
) -> bool {
    if !is_well_formed(chain) {
        warn!(len = chain.len(), "refusing malformed ancestor chain");
        return false;
    }

    match first_denied(principal, chain, session) {
        Some(blocked) => {
            debug!(
                target_id = %chain[chain.len() - 1].id(),
                blocked_by = %blocked.id(),
                member_id = ?principal.id,
                "view denied by ancestor chain"
            );
            false
        }
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::evaluator::can_view;
    use crate::access::models::fixtures::page;
    use gp_common::{MembershipStatus, Role, RoleFlags};
    use uuid::Uuid;

    fn member(roles: RoleFlags) -> Principal {
        Principal::member(Uuid::new_v4(), MembershipStatus::Full, roles)
    }

    #[test]
    fn test_public_child_under_restricted_parent() {
        let parent = page("instructors", None, false).with_role(Role::Instructor);
        let child = page("syllabus", Some(&parent), true);
        let chain = vec![parent.clone(), child.clone()];

        let plain = member(RoleFlags::empty());
        assert!(can_view(&plain, &child, None));
        assert!(!can_view_with_ancestors(&plain, &chain, None));
        assert_eq!(
            can_view_with_ancestors(&plain, &chain, None),
            can_view(&plain, &parent, None)
        );

        let cfi = member(RoleFlags::INSTRUCTOR);
        assert!(can_view_with_ancestors(&cfi, &chain, None));
    }

    #[test]
    fn test_first_denied_reports_blocking_ancestor() {
        let root = page("club", None, true);
        let board = page("board", Some(&root), false).with_role(Role::Director);
        let minutes = page("2024", Some(&board), false).with_role(Role::Director);
        let chain = vec![root, board.clone(), minutes];

        let plain = member(RoleFlags::empty());
        let blocked = first_denied(&plain, &chain, None).map(PageAccess::id);
        assert_eq!(blocked, Some(board.id()));
    }

    #[test]
    fn test_board_minutes_child_blocked_by_parent() {
        let board = page("board-minutes", None, false).with_role(Role::Director);
        // Child later stripped of its inherited role grants.
        let year = page("2024", Some(&board), false);
        let chain = vec![board, year.clone()];

        let a = member(RoleFlags::empty());
        assert!(can_view(&a, &year, None));
        assert!(!can_view_with_ancestors(&a, &chain, None));

        let b = member(RoleFlags::DIRECTOR);
        assert!(can_view_with_ancestors(&b, &chain, None));
    }

    #[test]
    fn test_anonymous_needs_public_chain() {
        let root = page("club", None, true);
        let open = page("events", Some(&root), true);
        let members = page("members", Some(&root), false);
        let under = page("bbq", Some(&members), true);

        let anon = Principal::anonymous();
        assert!(can_view_with_ancestors(&anon, &[root.clone(), open], None));
        assert!(!can_view_with_ancestors(&anon, &[root, members, under], None));
    }

    #[test]
    fn test_bypass_session_applies_to_whole_chain() {
        let ops = page("ops", None, false).with_role(Role::DutyOfficer);
        let sheet = page("sheet", Some(&ops), false);
        let chain = vec![ops, sheet];

        let kiosk = Principal::member(Uuid::new_v4(), MembershipStatus::Service, RoleFlags::empty());
        let kiosk = Principal {
            active_member: false,
            ..kiosk
        };

        assert!(!can_view_with_ancestors(&kiosk, &chain, None));
        assert!(can_view_with_ancestors(
            &kiosk,
            &chain,
            Some(&SessionContext::verified_bypass())
        ));
    }

    #[test]
    fn test_malformed_chains_denied() {
        let officer = member(RoleFlags::WEBMASTER);
        assert!(!can_view_with_ancestors(&officer, &[], None));

        let root = page("a", None, true);
        let stray = page("b", None, true);
        assert!(!is_well_formed(&[root.clone(), stray]));

        let orphan_parent = page("c", None, true);
        let child = page("d", Some(&orphan_parent), true);
        assert!(!can_view_with_ancestors(&officer, &[child], None));

        let leaf = page("e", Some(&root), true);
        assert!(is_well_formed(&[root, leaf]));
    }
}
