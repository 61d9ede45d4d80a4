//! Interactive editor policy.
//!
//! Stricter than back-office editing in one respect: public pages are the
//! webmaster's. On private pages anyone who can see a page can edit it.

use gp_common::Principal;
use tracing::debug;

use super::ancestors::can_view_with_ancestors;
use super::evaluator::{edit_grant, view_step, EvalGuard};
use super::models::PageAccess;

/// Whether `principal` may edit `page` from the interactive editor.
#[must_use]
pub fn can_edit_in_editor(principal: &Principal, page: &PageAccess) -> bool {
    if principal.is_anonymous() {
        return false;
    }

    let allowed = if page.is_public() {
        principal.is_site_admin()
    } else {
        let mut guard = EvalGuard::new();
        edit_grant(principal, page).is_some()
            || view_step(principal, page, None, &mut guard).is_granted()
    };

    debug!(
        page_id = %page.id(),
        member_id = ?principal.id,
        public = page.is_public(),
        allowed,
        "editor decision"
    );
    allowed
}

/// Whether `principal` may create a page under `parent` (root when `None`).
#[must_use]
pub fn can_create_under(principal: &Principal, parent: Option<&PageAccess>) -> bool {
    match parent {
        None => principal.is_site_admin(),
        Some(parent) if parent.is_public() => principal.is_site_admin(),
        Some(parent) => can_edit_in_editor(principal, parent),
    }
}

/// [`can_create_under`] for a parent given with its ancestors, root first.
///
/// The caller must also be able to reach the parent. An empty chain means
/// root-level creation.
#[must_use]
pub fn can_create_in_chain(principal: &Principal, parent_chain: &[PageAccess]) -> bool {
    match parent_chain.last() {
        None => can_create_under(principal, None),
        Some(parent) => {
            can_create_under(principal, Some(parent))
                && can_view_with_ancestors(principal, parent_chain, None)
        }
    }
}
