//! Permission inheritance on page creation.
//!
//! A new child starts with its parent's role grants and member grants. The
//! copy runs inside the creating transaction and inserts on the grants'
//! natural keys with `ON CONFLICT DO NOTHING`, so a retried creation never
//! duplicates a grant.

use std::collections::BTreeSet;

use gp_common::RoleRequirement;
use sqlx::PgConnection;
use tracing::debug;
use uuid::Uuid;

use super::models::PageAccess;

/// Grants a child page receives from its parent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InheritedGrants {
    pub roles: BTreeSet<RoleRequirement>,
    pub members: BTreeSet<Uuid>,
}

impl InheritedGrants {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty() && self.members.is_empty()
    }
}

/// What a child under `parent` inherits. Root pages inherit nothing.
#[must_use]
pub fn plan_inherited_grants(parent: Option<&PageAccess>) -> InheritedGrants {
    parent.map_or_else(InheritedGrants::default, |parent| InheritedGrants {
        roles: parent.role_grants.clone(),
        members: parent.member_grants.clone(),
    })
}

/// Default `is_public` for a new child. Root pages start private.
///
/// This is only the form default; the creator may override it.
#[must_use]
pub fn default_visibility(parent: Option<&PageAccess>) -> bool {
    parent.is_some_and(PageAccess::is_public)
}

/// Rows written by [`copy_grants_on_create`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopiedGrants {
    pub roles: u64,
    pub members: u64,
}

/// Copy every grant from `parent_id` onto `child_id`.
///
/// Must run on the connection of the transaction that inserted the child.
/// Role names are written in canonical form. Copied member grants record
/// `granted_by`, the member creating the child.
pub async fn copy_grants_on_create(
    conn: &mut PgConnection,
    parent_id: Uuid,
    child_id: Uuid,
    granted_by: Option<Uuid>,
) -> sqlx::Result<CopiedGrants> {
    let roles = sqlx::query(
        r"
        INSERT INTO page_role_grants (page_id, role_name)
        SELECT DISTINCT $2, replace(lower(btrim(role_name)), '-', '_')
        FROM page_role_grants
        WHERE page_id = $1
        ON CONFLICT (page_id, role_name) DO NOTHING
        ",
    )
    .bind(parent_id)
    .bind(child_id)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    let members = sqlx::query(
        r"
        INSERT INTO page_member_grants (page_id, member_id, granted_by)
        SELECT $2, member_id, $3
        FROM page_member_grants
        WHERE page_id = $1
        ON CONFLICT (page_id, member_id) DO NOTHING
        ",
    )
    .bind(parent_id)
    .bind(child_id)
    .bind(granted_by)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    debug!(%parent_id, %child_id, roles, members, "copied grants to new page");
    Ok(CopiedGrants { roles, members })
}
