//! Back-office handlers.
//!
//! Grant management and the visibility toggle. These use the context-free
//! edit rule, so officers and explicit grantees may manage public pages
//! here even though the interactive editor leaves those to the webmaster.

use axum::extract::{Path, State};
use axum::Json;
use gp_common::RoleRequirement;
use tracing::{info, warn};
use uuid::Uuid;

use super::types::{AdminError, AdminResult, GrantChange, VisibilityRequest};
use crate::access::{can_edit, queries, PageAccess, PageDetail};
use crate::api::AppState;
use crate::auth::Caller;

/// Load a page and check the caller may manage it.
async fn managed_page(state: &AppState, caller: &Caller, page_id: Uuid) -> AdminResult<PageAccess> {
    let page = queries::load_page_access(&state.db, page_id).await?;
    if !can_edit(&caller.principal, &page) {
        warn!(%page_id, member_id = ?caller.principal.id, "back-office change denied");
        return Err(AdminError::Forbidden);
    }
    Ok(page)
}

async fn grant_change(state: &AppState, page_id: Uuid, changed: bool) -> AdminResult<Json<GrantChange>> {
    let page = queries::load_page_access(&state.db, page_id).await?;
    Ok(Json(GrantChange {
        changed,
        page: PageDetail::from(page),
    }))
}

fn parse_role(role: &str) -> AdminResult<RoleRequirement> {
    role.parse()
        .map_err(|_| AdminError::UnknownRole(role.to_string()))
}

/// Show a page with its grants.
#[utoipa::path(
    get,
    path = "/api/admin/pages/{id}",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Page ID")),
    responses(
        (status = 200, description = "Page with grants", body = PageDetail),
        (status = 403, description = "Caller may not manage this page"),
    ),
    security(("bearer_auth" = [])),
)]
#[tracing::instrument(skip(state, caller))]
pub async fn get_page_grants(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> AdminResult<Json<PageDetail>> {
    let page = managed_page(&state, &caller, id).await?;
    Ok(Json(PageDetail::from(page)))
}

/// Require a role to view a page.
#[utoipa::path(
    put,
    path = "/api/admin/pages/{id}/roles/{role}",
    tag = "admin",
    params(
        ("id" = Uuid, Path, description = "Page ID"),
        ("role" = String, Path, description = "Role name or any_active_member"),
    ),
    responses(
        (status = 200, description = "Grant present", body = GrantChange),
        (status = 409, description = "Page is public"),
    ),
    security(("bearer_auth" = [])),
)]
#[tracing::instrument(skip(state, caller))]
pub async fn add_role_grant(
    State(state): State<AppState>,
    caller: Caller,
    Path((id, role)): Path<(Uuid, String)>,
) -> AdminResult<Json<GrantChange>> {
    let role = parse_role(&role)?;
    managed_page(&state, &caller, id).await?;

    let changed = queries::add_role_grant(&state.db, id, role).await?;
    info!(page_id = %id, role = %role, changed, "role grant added");
    grant_change(&state, id, changed).await
}

/// Drop a role requirement.
#[utoipa::path(
    delete,
    path = "/api/admin/pages/{id}/roles/{role}",
    tag = "admin",
    params(
        ("id" = Uuid, Path, description = "Page ID"),
        ("role" = String, Path, description = "Role name or any_active_member"),
    ),
    responses(
        (status = 200, description = "Grant absent", body = GrantChange),
    ),
    security(("bearer_auth" = [])),
)]
#[tracing::instrument(skip(state, caller))]
pub async fn remove_role_grant(
    State(state): State<AppState>,
    caller: Caller,
    Path((id, role)): Path<(Uuid, String)>,
) -> AdminResult<Json<GrantChange>> {
    let role = parse_role(&role)?;
    managed_page(&state, &caller, id).await?;

    let changed = queries::remove_role_grant(&state.db, id, role).await?;
    info!(page_id = %id, role = %role, changed, "role grant removed");
    grant_change(&state, id, changed).await
}

/// Give a member edit rights on a page.
#[utoipa::path(
    put,
    path = "/api/admin/pages/{id}/members/{member_id}",
    tag = "admin",
    params(
        ("id" = Uuid, Path, description = "Page ID"),
        ("member_id" = Uuid, Path, description = "Member ID"),
    ),
    responses(
        (status = 200, description = "Grant present", body = GrantChange),
        (status = 404, description = "Page or member not found"),
    ),
    security(("bearer_auth" = [])),
)]
#[tracing::instrument(skip(state, caller))]
pub async fn add_member_grant(
    State(state): State<AppState>,
    caller: Caller,
    Path((id, member_id)): Path<(Uuid, Uuid)>,
) -> AdminResult<Json<GrantChange>> {
    managed_page(&state, &caller, id).await?;

    let changed = queries::add_member_grant(&state.db, id, member_id, caller.principal.id).await?;
    info!(page_id = %id, %member_id, changed, "member grant added");
    grant_change(&state, id, changed).await
}

/// Revoke a member's edit rights on a page.
#[utoipa::path(
    delete,
    path = "/api/admin/pages/{id}/members/{member_id}",
    tag = "admin",
    params(
        ("id" = Uuid, Path, description = "Page ID"),
        ("member_id" = Uuid, Path, description = "Member ID"),
    ),
    responses(
        (status = 200, description = "Grant absent", body = GrantChange),
    ),
    security(("bearer_auth" = [])),
)]
#[tracing::instrument(skip(state, caller))]
pub async fn remove_member_grant(
    State(state): State<AppState>,
    caller: Caller,
    Path((id, member_id)): Path<(Uuid, Uuid)>,
) -> AdminResult<Json<GrantChange>> {
    managed_page(&state, &caller, id).await?;

    let changed = queries::remove_member_grant(&state.db, id, member_id).await?;
    info!(page_id = %id, %member_id, changed, "member grant removed");
    grant_change(&state, id, changed).await
}

/// Make a page public or private.
#[utoipa::path(
    put,
    path = "/api/admin/pages/{id}/visibility",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Page ID")),
    request_body = VisibilityRequest,
    responses(
        (status = 200, description = "Visibility set", body = GrantChange),
        (status = 409, description = "Page still has role grants"),
    ),
    security(("bearer_auth" = [])),
)]
#[tracing::instrument(skip(state, caller))]
pub async fn set_visibility(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(req): Json<VisibilityRequest>,
) -> AdminResult<Json<GrantChange>> {
    let page = managed_page(&state, &caller, id).await?;
    let changed = page.is_public() != req.is_public;
    if changed {
        queries::set_public(&state.db, id, req.is_public).await?;
    }
    grant_change(&state, id, changed).await
}
