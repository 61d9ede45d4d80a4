//! Grant store: page tree reads and the mutation entry points.
//!
//! Reads hand the evaluator fully loaded [`PageAccess`] snapshots. Every
//! mutation that touches grants or visibility runs in one transaction with
//! the affected page row locked, so the public/role-grant exclusion holds
//! under concurrent writers.

use std::collections::HashMap;

use gp_common::RoleRequirement;
use sqlx::{PgConnection, PgPool};
use tracing::info;
use uuid::Uuid;

use super::error::{AccessError, AccessResult, Invariant, Missing};
use super::inheritance::{copy_grants_on_create, default_visibility, plan_inherited_grants};
use super::models::{
    Document, NewDocument, NewPage, Page, PageAccess, PageMemberGrant, RoleGrantRow,
};

/// Upper bound on ancestor walks. A longer chain means the tree has a cycle.
const MAX_CHAIN_LEN: i32 = 64;

// ============================================================================
// Page Reads
// ============================================================================

/// Get a page by ID.
pub async fn get_page(pool: &PgPool, page_id: Uuid) -> sqlx::Result<Option<Page>> {
    sqlx::query_as::<_, Page>(
        r"
        SELECT id, parent_id, slug, title, is_public, created_by, created_at, updated_at
        FROM pages
        WHERE id = $1
        ",
    )
    .bind(page_id)
    .fetch_optional(pool)
    .await
}

/// Get the child of `parent_id` (a root page when `None`) with `slug`.
pub async fn get_child_by_slug(
    pool: &PgPool,
    parent_id: Option<Uuid>,
    slug: &str,
) -> sqlx::Result<Option<Page>> {
    sqlx::query_as::<_, Page>(
        r"
        SELECT id, parent_id, slug, title, is_public, created_by, created_at, updated_at
        FROM pages
        WHERE parent_id IS NOT DISTINCT FROM $1 AND slug = $2
        ",
    )
    .bind(parent_id)
    .bind(slug)
    .fetch_optional(pool)
    .await
}

/// List the children of `parent_id` (root pages when `None`), by title.
pub async fn list_children(pool: &PgPool, parent_id: Option<Uuid>) -> sqlx::Result<Vec<Page>> {
    sqlx::query_as::<_, Page>(
        r"
        SELECT id, parent_id, slug, title, is_public, created_by, created_at, updated_at
        FROM pages
        WHERE parent_id IS NOT DISTINCT FROM $1
        ORDER BY title ASC, slug ASC
        ",
    )
    .bind(parent_id)
    .fetch_all(pool)
    .await
}

// ============================================================================
// Grant Reads
// ============================================================================

/// Role grant rows for a batch of pages.
pub async fn list_role_grants(pool: &PgPool, page_ids: &[Uuid]) -> sqlx::Result<Vec<RoleGrantRow>> {
    sqlx::query_as::<_, RoleGrantRow>(
        r"
        SELECT page_id, role_name
        FROM page_role_grants
        WHERE page_id = ANY($1)
        ",
    )
    .bind(page_ids)
    .fetch_all(pool)
    .await
}

/// Member grant rows for a batch of pages.
pub async fn list_member_grants(
    pool: &PgPool,
    page_ids: &[Uuid],
) -> sqlx::Result<Vec<PageMemberGrant>> {
    sqlx::query_as::<_, PageMemberGrant>(
        r"
        SELECT page_id, member_id, granted_by, created_at
        FROM page_member_grants
        WHERE page_id = ANY($1)
        ORDER BY created_at ASC
        ",
    )
    .bind(page_ids)
    .fetch_all(pool)
    .await
}

/// Attach grant rows to their pages, keeping the order of `pages`.
///
/// Rows for pages outside `pages` are ignored.
pub fn assemble_access(
    pages: Vec<Page>,
    roles: Vec<RoleGrantRow>,
    members: Vec<PageMemberGrant>,
) -> AccessResult<Vec<PageAccess>> {
    let mut access: Vec<PageAccess> = pages.into_iter().map(PageAccess::new).collect();
    let index: HashMap<Uuid, usize> = access
        .iter()
        .enumerate()
        .map(|(i, page)| (page.id(), i))
        .collect();

    for row in roles {
        if let Some(&i) = index.get(&row.page_id) {
            let requirement: RoleRequirement = row.role_name.parse()?;
            access[i].role_grants.insert(requirement);
        }
    }
    for grant in members {
        if let Some(&i) = index.get(&grant.page_id) {
            access[i].member_grants.insert(grant.member_id);
        }
    }

    Ok(access)
}

/// Load grants for a batch of pages in two queries.
pub async fn load_access_for_pages(pool: &PgPool, pages: Vec<Page>) -> AccessResult<Vec<PageAccess>> {
    if pages.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = pages.iter().map(|p| p.id).collect();
    let roles = list_role_grants(pool, &ids).await?;
    let members = list_member_grants(pool, &ids).await?;
    assemble_access(pages, roles, members)
}

/// Load a single page with its grants.
pub async fn load_page_access(pool: &PgPool, page_id: Uuid) -> AccessResult<PageAccess> {
    let page = get_page(pool, page_id)
        .await?
        .ok_or(AccessError::NotFound(Missing::Page(page_id)))?;
    let mut loaded = load_access_for_pages(pool, vec![page]).await?;
    loaded
        .pop()
        .ok_or(AccessError::NotFound(Missing::Page(page_id)))
}

// ============================================================================
// Chains and Paths
// ============================================================================

/// Load `page_id` and all of its ancestors, root first.
pub async fn load_ancestor_chain(pool: &PgPool, page_id: Uuid) -> AccessResult<Vec<PageAccess>> {
    let pages = sqlx::query_as::<_, Page>(
        r"
        WITH RECURSIVE chain AS (
            SELECT id, parent_id, slug, title, is_public, created_by,
                   created_at, updated_at, 0 AS depth
            FROM pages
            WHERE id = $1
            UNION ALL
            SELECT p.id, p.parent_id, p.slug, p.title, p.is_public, p.created_by,
                   p.created_at, p.updated_at, c.depth + 1
            FROM pages p
            JOIN chain c ON p.id = c.parent_id
            WHERE c.depth < $2
        )
        SELECT id, parent_id, slug, title, is_public, created_by, created_at, updated_at
        FROM chain
        ORDER BY depth DESC
        ",
    )
    .bind(page_id)
    .bind(MAX_CHAIN_LEN)
    .fetch_all(pool)
    .await?;

    if pages.is_empty() {
        return Err(AccessError::NotFound(Missing::Page(page_id)));
    }
    load_access_for_pages(pool, pages).await
}

/// Split a URL path into slugs, ignoring empty segments.
#[must_use]
pub fn path_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Resolve a slug path from the root, returning the chain root first.
///
/// Paths with more than `max_depth` segments cannot exist and are not found.
pub async fn resolve_path(
    pool: &PgPool,
    path: &str,
    max_depth: usize,
) -> AccessResult<Vec<PageAccess>> {
    let segments = path_segments(path);
    let not_found = || AccessError::NotFound(Missing::Path(segments.join("/")));

    if segments.is_empty() || segments.len() > max_depth {
        return Err(not_found());
    }

    let mut pages = Vec::with_capacity(segments.len());
    let mut parent_id = None;
    for slug in &segments {
        let page = get_child_by_slug(pool, parent_id, slug)
            .await?
            .ok_or_else(not_found)?;
        parent_id = Some(page.id);
        pages.push(page);
    }

    load_access_for_pages(pool, pages).await
}

// ============================================================================
// Page Mutations
// ============================================================================

/// Lock a page row for the rest of the transaction.
async fn lock_page(conn: &mut PgConnection, page_id: Uuid) -> sqlx::Result<Option<Page>> {
    sqlx::query_as::<_, Page>(
        r"
        SELECT id, parent_id, slug, title, is_public, created_by, created_at, updated_at
        FROM pages
        WHERE id = $1
        FOR UPDATE
        ",
    )
    .bind(page_id)
    .fetch_optional(conn)
    .await
}

async fn count_role_grants(conn: &mut PgConnection, page_id: Uuid) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM page_role_grants WHERE page_id = $1")
        .bind(page_id)
        .fetch_one(conn)
        .await
}

/// Number of pages from the root down to `page_id`, inclusive.
async fn page_depth(conn: &mut PgConnection, page_id: Uuid) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>(
        r"
        WITH RECURSIVE chain AS (
            SELECT id, parent_id, 1 AS depth FROM pages WHERE id = $1
            UNION ALL
            SELECT p.id, p.parent_id, c.depth + 1
            FROM pages p
            JOIN chain c ON p.id = c.parent_id
            WHERE c.depth < $2
        )
        SELECT COUNT(*) FROM chain
        ",
    )
    .bind(page_id)
    .bind(MAX_CHAIN_LEN)
    .fetch_one(conn)
    .await
}

/// Load a parent's grants inside the creating transaction.
async fn parent_access(conn: &mut PgConnection, parent: Page) -> AccessResult<PageAccess> {
    let parent_id = parent.id;
    let roles = sqlx::query_as::<_, RoleGrantRow>(
        "SELECT page_id, role_name FROM page_role_grants WHERE page_id = $1",
    )
    .bind(parent_id)
    .fetch_all(&mut *conn)
    .await?;

    let members = sqlx::query_as::<_, PageMemberGrant>(
        r"
        SELECT page_id, member_id, granted_by, created_at
        FROM page_member_grants
        WHERE page_id = $1
        ",
    )
    .bind(parent_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut assembled = assemble_access(vec![parent], roles, members)?;
    assembled
        .pop()
        .ok_or(AccessError::NotFound(Missing::Parent(parent_id)))
}

/// Create a page, copying the parent's grants onto it.
///
/// The insert and the grant copy commit together or not at all. Fails with
/// [`AccessError::SlugTaken`] on a sibling slug clash, with
/// [`AccessError::TooDeep`] past `max_depth`, and with an invariant
/// violation when the page would be public while inheriting role grants.
#[tracing::instrument(skip(pool, new), fields(parent_id = ?new.parent_id, slug = %new.slug))]
pub async fn create_page(pool: &PgPool, new: &NewPage, max_depth: usize) -> AccessResult<PageAccess> {
    let mut tx = pool.begin().await?;

    let parent = match new.parent_id {
        Some(parent_id) => {
            let page = lock_page(&mut tx, parent_id)
                .await?
                .ok_or(AccessError::NotFound(Missing::Parent(parent_id)))?;
            let depth = page_depth(&mut tx, parent_id).await?;
            if usize::try_from(depth).unwrap_or(usize::MAX) >= max_depth {
                return Err(AccessError::TooDeep(max_depth));
            }
            Some(parent_access(&mut tx, page).await?)
        }
        None => None,
    };

    let inherited = plan_inherited_grants(parent.as_ref());
    let is_public = new
        .is_public
        .unwrap_or_else(|| default_visibility(parent.as_ref()));
    if is_public && !inherited.roles.is_empty() {
        return Err(AccessError::InvariantViolation(
            Invariant::PublicPageWithRoleGrants,
        ));
    }

    let page = sqlx::query_as::<_, Page>(
        r"
        INSERT INTO pages (parent_id, slug, title, is_public, created_by)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, parent_id, slug, title, is_public, created_by, created_at, updated_at
        ",
    )
    .bind(new.parent_id)
    .bind(&new.slug)
    .bind(&new.title)
    .bind(is_public)
    .bind(new.created_by)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| AccessError::from_page_insert(e, &new.slug))?;

    if let Some(parent) = &parent {
        copy_grants_on_create(&mut tx, parent.id(), page.id, new.created_by).await?;
    }

    tx.commit().await?;

    info!(page_id = %page.id, is_public, "page created");
    Ok(PageAccess {
        page,
        role_grants: inherited.roles,
        member_grants: inherited.members,
    })
}

/// Change a page's visibility.
///
/// Making a page public fails while it still carries role grants.
#[tracing::instrument(skip(pool))]
pub async fn set_public(pool: &PgPool, page_id: Uuid, is_public: bool) -> AccessResult<Page> {
    let mut tx = pool.begin().await?;

    lock_page(&mut tx, page_id)
        .await?
        .ok_or(AccessError::NotFound(Missing::Page(page_id)))?;

    if is_public && count_role_grants(&mut tx, page_id).await? > 0 {
        return Err(AccessError::InvariantViolation(
            Invariant::PublicPageWithRoleGrants,
        ));
    }

    let page = sqlx::query_as::<_, Page>(
        r"
        UPDATE pages
        SET is_public = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING id, parent_id, slug, title, is_public, created_by, created_at, updated_at
        ",
    )
    .bind(page_id)
    .bind(is_public)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    info!(%page_id, is_public, "page visibility changed");
    Ok(page)
}

/// Update a page's title and visibility together.
///
/// Either both fields are written or neither is. Making the page public
/// fails while it still carries role grants.
#[tracing::instrument(skip(pool))]
pub async fn update_page(
    pool: &PgPool,
    page_id: Uuid,
    title: Option<&str>,
    is_public: Option<bool>,
) -> AccessResult<Page> {
    let mut tx = pool.begin().await?;

    let current = lock_page(&mut tx, page_id)
        .await?
        .ok_or(AccessError::NotFound(Missing::Page(page_id)))?;

    let publishing = is_public == Some(true) && !current.is_public;
    if publishing && count_role_grants(&mut tx, page_id).await? > 0 {
        return Err(AccessError::InvariantViolation(
            Invariant::PublicPageWithRoleGrants,
        ));
    }

    let page = sqlx::query_as::<_, Page>(
        r"
        UPDATE pages
        SET title = COALESCE($2, title),
            is_public = COALESCE($3, is_public),
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, parent_id, slug, title, is_public, created_by, created_at, updated_at
        ",
    )
    .bind(page_id)
    .bind(title)
    .bind(is_public)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    info!(%page_id, is_public = page.is_public, "page updated");
    Ok(page)
}

/// Delete a page with its subtree, grants and documents.
#[tracing::instrument(skip(pool))]
pub async fn delete_page(pool: &PgPool, page_id: Uuid) -> AccessResult<()> {
    let result = sqlx::query("DELETE FROM pages WHERE id = $1")
        .bind(page_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AccessError::NotFound(Missing::Page(page_id)));
    }
    info!(%page_id, "page deleted");
    Ok(())
}

// ============================================================================
// Grant Mutations
// ============================================================================

/// Attach a role grant. Returns `false` when it was already present.
///
/// Public pages never take role grants.
#[tracing::instrument(skip(pool))]
pub async fn add_role_grant(
    pool: &PgPool,
    page_id: Uuid,
    role: RoleRequirement,
) -> AccessResult<bool> {
    let mut tx = pool.begin().await?;

    let page = lock_page(&mut tx, page_id)
        .await?
        .ok_or(AccessError::NotFound(Missing::Page(page_id)))?;
    if page.is_public {
        return Err(AccessError::InvariantViolation(
            Invariant::RoleGrantOnPublicPage,
        ));
    }

    let result = sqlx::query(
        r"
        INSERT INTO page_role_grants (page_id, role_name)
        VALUES ($1, $2)
        ON CONFLICT (page_id, role_name) DO NOTHING
        ",
    )
    .bind(page_id)
    .bind(role.as_str())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(result.rows_affected() > 0)
}

/// Detach a role grant. Returns `false` when it was not present.
#[tracing::instrument(skip(pool))]
pub async fn remove_role_grant(
    pool: &PgPool,
    page_id: Uuid,
    role: RoleRequirement,
) -> AccessResult<bool> {
    let mut tx = pool.begin().await?;

    lock_page(&mut tx, page_id)
        .await?
        .ok_or(AccessError::NotFound(Missing::Page(page_id)))?;

    // Older rows may be stored hyphenated or capitalised.
    let result = sqlx::query(
        r"
        DELETE FROM page_role_grants
        WHERE page_id = $1 AND replace(lower(btrim(role_name)), '-', '_') = $2
        ",
    )
    .bind(page_id)
    .bind(role.as_str())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(result.rows_affected() > 0)
}

/// Give a member an explicit edit grant. Returns `false` when it was
/// already present.
#[tracing::instrument(skip(pool))]
pub async fn add_member_grant(
    pool: &PgPool,
    page_id: Uuid,
    member_id: Uuid,
    granted_by: Option<Uuid>,
) -> AccessResult<bool> {
    let mut tx = pool.begin().await?;

    lock_page(&mut tx, page_id)
        .await?
        .ok_or(AccessError::NotFound(Missing::Page(page_id)))?;

    let result = sqlx::query(
        r"
        INSERT INTO page_member_grants (page_id, member_id, granted_by)
        VALUES ($1, $2, $3)
        ON CONFLICT (page_id, member_id) DO NOTHING
        ",
    )
    .bind(page_id)
    .bind(member_id)
    .bind(granted_by)
    .execute(&mut *tx)
    .await
    .map_err(|e| AccessError::from_member_grant_insert(e, member_id))?;

    tx.commit().await?;
    Ok(result.rows_affected() > 0)
}

/// Revoke a member's edit grant. Returns `false` when it was not present.
#[tracing::instrument(skip(pool))]
pub async fn remove_member_grant(pool: &PgPool, page_id: Uuid, member_id: Uuid) -> AccessResult<bool> {
    let mut tx = pool.begin().await?;

    lock_page(&mut tx, page_id)
        .await?
        .ok_or(AccessError::NotFound(Missing::Page(page_id)))?;

    let result =
        sqlx::query("DELETE FROM page_member_grants WHERE page_id = $1 AND member_id = $2")
            .bind(page_id)
            .bind(member_id)
            .execute(&mut *tx)
            .await?;

    tx.commit().await?;
    Ok(result.rows_affected() > 0)
}

// ============================================================================
// Documents
// ============================================================================

/// Attach a document record to a page.
pub async fn create_document(pool: &PgPool, new: &NewDocument) -> AccessResult<Document> {
    get_page(pool, new.page_id)
        .await?
        .ok_or(AccessError::NotFound(Missing::Page(new.page_id)))?;

    let document = sqlx::query_as::<_, Document>(
        r"
        INSERT INTO documents (page_id, title, file_name, content_type, size_bytes, uploaded_by)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, page_id, title, file_name, content_type, size_bytes, uploaded_by, uploaded_at
        ",
    )
    .bind(new.page_id)
    .bind(&new.title)
    .bind(&new.file_name)
    .bind(&new.content_type)
    .bind(new.size_bytes)
    .bind(new.uploaded_by)
    .fetch_one(pool)
    .await?;

    Ok(document)
}

/// Get a document by ID.
pub async fn get_document(pool: &PgPool, document_id: Uuid) -> sqlx::Result<Option<Document>> {
    sqlx::query_as::<_, Document>(
        r"
        SELECT id, page_id, title, file_name, content_type, size_bytes, uploaded_by, uploaded_at
        FROM documents
        WHERE id = $1
        ",
    )
    .bind(document_id)
    .fetch_optional(pool)
    .await
}

/// List a page's documents, newest first.
pub async fn list_documents(pool: &PgPool, page_id: Uuid) -> sqlx::Result<Vec<Document>> {
    sqlx::query_as::<_, Document>(
        r"
        SELECT id, page_id, title, file_name, content_type, size_bytes, uploaded_by, uploaded_at
        FROM documents
        WHERE page_id = $1
        ORDER BY uploaded_at DESC
        ",
    )
    .bind(page_id)
    .fetch_all(pool)
    .await
}
