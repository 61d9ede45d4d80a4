//! Property tests for the access decisions.
//!
//! Pages are built in memory; no database is needed.

use std::collections::BTreeSet;

use chrono::Utc;
use gp_common::{MembershipStatus, RoleFlags};
use proptest::prelude::*;
use uuid::Uuid;

use gp_server::access::{
    can_edit, can_edit_in_editor, can_view, can_view_with_ancestors, plan_inherited_grants, Page,
    PageAccess, Principal, Role, RoleRequirement, SessionContext,
};

fn page(parent: Option<&PageAccess>, is_public: bool) -> PageAccess {
    let now = Utc::now();
    PageAccess::new(Page {
        id: Uuid::new_v4(),
        parent_id: parent.map(PageAccess::id),
        slug: "p".to_string(),
        title: "P".to_string(),
        is_public,
        created_by: None,
        created_at: now,
        updated_at: now,
    })
}

// ============================================================================
// Strategies
// ============================================================================

fn arb_status() -> impl Strategy<Value = MembershipStatus> {
    prop::sample::select(MembershipStatus::all())
}

fn arb_flags() -> impl Strategy<Value = RoleFlags> {
    any::<u16>().prop_map(RoleFlags::from_bits_truncate)
}

fn arb_principal() -> impl Strategy<Value = Principal> {
    prop_oneof![
        1 => Just(Principal::anonymous()),
        6 => (arb_status(), arb_flags(), any::<bool>()).prop_map(|(status, roles, superuser)| {
            Principal::member(Uuid::new_v4(), status, roles).with_superuser(superuser)
        }),
    ]
}

/// Members who hold no officer role and are not superusers.
fn arb_plain_member() -> impl Strategy<Value = Principal> {
    (arb_status(), arb_flags()).prop_map(|(status, roles)| {
        Principal::member(Uuid::new_v4(), status, roles - RoleFlags::OFFICERS)
    })
}

fn arb_session() -> impl Strategy<Value = Option<SessionContext>> {
    prop_oneof![
        Just(None),
        Just(Some(SessionContext::none())),
        Just(Some(SessionContext::verified_bypass())),
    ]
}

fn arb_requirements() -> impl Strategy<Value = BTreeSet<RoleRequirement>> {
    prop::collection::btree_set(
        prop_oneof![
            1 => Just(RoleRequirement::AnyActiveMember),
            5 => prop::sample::select(Role::all()).prop_map(RoleRequirement::Role),
        ],
        0..4,
    )
}

/// A page with arbitrary grants, optionally naming `grantee`.
fn arb_page(grantee: Option<Uuid>) -> impl Strategy<Value = PageAccess> {
    (any::<bool>(), arb_requirements(), any::<bool>()).prop_map(move |(public, roles, grant)| {
        let mut access = page(None, public);
        if !public {
            access.role_grants = roles;
        }
        if let (true, Some(id)) = (grant, grantee) {
            access = access.with_member(id);
        }
        access
    })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn public_pages_are_visible_to_everyone(
        principal in arb_principal(),
        session in arb_session(),
    ) {
        let about = page(None, true);
        prop_assert!(can_view(&principal, &about, session.as_ref()));
    }

    #[test]
    fn unrestricted_private_page_follows_active_membership(principal in arb_plain_member()) {
        let ops = page(None, false);
        prop_assert_eq!(can_view(&principal, &ops, None), principal.is_active_member());
    }

    #[test]
    fn role_restricted_page_needs_active_member_with_role(
        principal in arb_plain_member(),
        r1 in prop::sample::select(Role::all()),
        r2 in prop::sample::select(Role::all()),
    ) {
        let restricted = page(None, false).with_role(r1).with_role(r2);
        let expected =
            principal.is_active_member() && (principal.has_role(r1) || principal.has_role(r2));
        prop_assert_eq!(can_view(&principal, &restricted, None), expected);
    }

    #[test]
    fn edit_implies_view(
        principal in arb_principal(),
        session in arb_session(),
        grant in any::<bool>(),
        public in any::<bool>(),
        roles in arb_requirements(),
    ) {
        let mut target = page(None, public);
        if !public {
            target.role_grants = roles;
        }
        if let (true, Some(id)) = (grant, principal.id) {
            target = target.with_member(id);
        }
        if can_edit(&principal, &target) {
            prop_assert!(can_view(&principal, &target, session.as_ref()));
        }
    }

    #[test]
    fn public_child_closed_by_restricted_parent(
        principal in arb_plain_member(),
        role in prop::sample::select(Role::all()),
    ) {
        prop_assume!(!principal.has_role(role));
        let parent = page(None, false).with_role(role);
        let child = page(Some(&parent), true);

        prop_assert!(can_view(&principal, &child, None));
        prop_assert_eq!(
            can_view_with_ancestors(&principal, &[parent.clone(), child], None),
            can_view(&principal, &parent, None)
        );
        prop_assert!(!can_view(&principal, &parent, None));
    }

    #[test]
    fn chain_view_is_conjunction(
        principal in arb_principal(),
        session in arb_session(),
        pages in prop::collection::vec(arb_page(None), 1..5),
    ) {
        let mut chain: Vec<PageAccess> = Vec::with_capacity(pages.len());
        for mut next in pages {
            next.page.parent_id = chain.last().map(PageAccess::id);
            chain.push(next);
        }
        let expected = chain.iter().all(|p| can_view(&principal, p, session.as_ref()));
        prop_assert_eq!(
            can_view_with_ancestors(&principal, &chain, session.as_ref()),
            expected
        );
    }

    #[test]
    fn editor_keeps_public_pages_for_site_admins(
        status in arb_status(),
        roles in arb_flags(),
    ) {
        let id = Uuid::new_v4();
        let grantee = Principal::member(id, status, roles - RoleFlags::OFFICERS);
        let about = page(None, true).with_member(id);

        prop_assert!(can_edit(&grantee, &about));
        prop_assert!(!can_edit_in_editor(&grantee, &about));
    }

    #[test]
    fn bypass_depends_only_on_session_flag(
        roles in arb_flags(),
        page in arb_page(None),
    ) {
        prop_assume!(!page.is_public());
        let kiosk = Principal::member(
            Uuid::new_v4(),
            MembershipStatus::NonMember,
            roles - RoleFlags::OFFICERS,
        );

        prop_assert!(!can_view(&kiosk, &page, Some(&SessionContext::none())));
        prop_assert!(!can_view(&kiosk, &page, None));
        prop_assert!(can_view(&kiosk, &page, Some(&SessionContext::verified_bypass())));
    }

    #[test]
    fn inheritance_plan_is_a_copy(parent in arb_page(Some(Uuid::new_v4()))) {
        let planned = plan_inherited_grants(Some(&parent));
        prop_assert_eq!(&planned.roles, &parent.role_grants);
        prop_assert_eq!(&planned.members, &parent.member_grants);
    }
}

#[test]
fn board_minutes_scenario() {
    let a = Principal::member(Uuid::new_v4(), MembershipStatus::Full, RoleFlags::empty());
    let b = Principal::member(Uuid::new_v4(), MembershipStatus::Full, RoleFlags::DIRECTOR);

    let minutes = page(None, false).with_role(Role::Director);
    assert!(!can_view(&a, &minutes, None));
    assert!(can_view(&b, &minutes, None));

    let inherited = plan_inherited_grants(Some(&minutes));
    assert!(inherited.roles.contains(&RoleRequirement::Role(Role::Director)));

    // The child later loses its own grant; the parent still blocks.
    let child = page(Some(&minutes), false);
    assert!(can_view(&a, &child, None));
    assert!(!can_view_with_ancestors(&a, &[minutes.clone(), child.clone()], None));
    assert!(can_view_with_ancestors(&b, &[minutes, child], None));
}
