//! API handlers for the page tree.
//!
//! Every read resolves the full ancestor chain first and serves nothing
//! unless the caller passes all of it.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::warn;
use uuid::Uuid;
use validator::Validate;

use crate::access::{
    can_create_in_chain, can_edit, can_edit_in_editor, can_view, can_view_with_ancestors, queries,
    AccessError, Document, Missing, NewDocument, NewPage, Page, PageAccess, PageDetail,
};
use crate::api::AppState;
use crate::auth::{AuthMember, Caller};
use crate::config::Config;

use super::constants::DEFAULT_CONTENT_TYPE;
use super::error::{PageError, PageResult};
use super::slug::{slugify, validate_slug};
use super::types::{
    chain_path, AccessSummary, CreateDocumentRequest, CreatePageRequest, PageView,
    UpdatePageRequest,
};

// ============================================================================
// Helpers
// ============================================================================

/// Map a denied view to the response the caller should see.
fn deny_view(caller: &Caller, config: &Config, chain: &[PageAccess]) -> PageError {
    if caller.principal.is_anonymous() {
        PageError::LoginRequired(config.login_redirect(&chain_path(chain)))
    } else {
        PageError::Forbidden
    }
}

/// Fail unless the caller may view every page of the chain.
fn ensure_visible(caller: &Caller, config: &Config, chain: &[PageAccess]) -> PageResult<()> {
    if can_view_with_ancestors(&caller.principal, chain, Some(&caller.session)) {
        Ok(())
    } else {
        Err(deny_view(caller, config, chain))
    }
}

/// Fail unless the caller may view the chain and edit its last page in the
/// editor.
fn ensure_editable<'a>(caller: &Caller, chain: &'a [PageAccess]) -> PageResult<&'a PageAccess> {
    let target = chain.last().ok_or(PageError::Forbidden)?;
    if can_view_with_ancestors(&caller.principal, chain, Some(&caller.session))
        && can_edit_in_editor(&caller.principal, target)
    {
        Ok(target)
    } else {
        warn!(page_id = %target.id(), member_id = ?caller.principal.id, "editor change denied");
        Err(PageError::Forbidden)
    }
}

/// Build the served view of a chain's last page.
fn view_of(caller: &Caller, chain: &[PageAccess]) -> PageResult<PageView> {
    PageView::build(&caller.principal, chain).ok_or(PageError::Forbidden)
}

// ============================================================================
// Reads
// ============================================================================

/// List the root pages the caller may view.
#[utoipa::path(
    get,
    path = "/api/pages",
    tag = "pages",
    responses(
        (status = 200, description = "Visible root pages", body = Vec<Page>),
    ),
)]
#[tracing::instrument(skip(state, caller))]
pub async fn list_root_pages(
    State(state): State<AppState>,
    caller: Caller,
) -> PageResult<Json<Vec<Page>>> {
    let roots = queries::list_children(&state.db, None).await?;
    let roots = queries::load_access_for_pages(&state.db, roots).await?;

    Ok(Json(
        roots
            .into_iter()
            .filter(|p| can_view(&caller.principal, p, Some(&caller.session)))
            .map(|p| p.page)
            .collect(),
    ))
}

/// Get a page by its slug path.
///
/// Anonymous callers who may not view the page are redirected to sign in.
#[utoipa::path(
    get,
    path = "/api/pages/by-path/{path}",
    tag = "pages",
    params(("path" = String, Path, description = "Slug path, e.g. board/minutes")),
    responses(
        (status = 200, description = "Page", body = PageView),
        (status = 303, description = "Sign in required"),
        (status = 403, description = "Access denied"),
        (status = 404, description = "No page at this path"),
    ),
)]
#[tracing::instrument(skip(state, caller))]
pub async fn get_page_by_path(
    State(state): State<AppState>,
    caller: Caller,
    Path(path): Path<String>,
) -> PageResult<Json<PageView>> {
    let chain = queries::resolve_path(&state.db, &path, state.config.max_page_depth).await?;
    ensure_visible(&caller, &state.config, &chain)?;
    Ok(Json(view_of(&caller, &chain)?))
}

/// Get a page by ID.
#[utoipa::path(
    get,
    path = "/api/pages/{id}",
    tag = "pages",
    params(("id" = Uuid, Path, description = "Page ID")),
    responses(
        (status = 200, description = "Page", body = PageView),
        (status = 303, description = "Sign in required"),
        (status = 403, description = "Access denied"),
        (status = 404, description = "Page not found"),
    ),
)]
#[tracing::instrument(skip(state, caller))]
pub async fn get_page(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> PageResult<Json<PageView>> {
    let chain = queries::load_ancestor_chain(&state.db, id).await?;
    ensure_visible(&caller, &state.config, &chain)?;
    Ok(Json(view_of(&caller, &chain)?))
}

/// List the children of a page that the caller may view.
#[utoipa::path(
    get,
    path = "/api/pages/{id}/children",
    tag = "pages",
    params(("id" = Uuid, Path, description = "Parent page ID")),
    responses(
        (status = 200, description = "Visible child pages", body = Vec<Page>),
        (status = 403, description = "Access denied"),
    ),
)]
#[tracing::instrument(skip(state, caller))]
pub async fn list_children(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> PageResult<Json<Vec<Page>>> {
    let chain = queries::load_ancestor_chain(&state.db, id).await?;
    ensure_visible(&caller, &state.config, &chain)?;

    let children = queries::list_children(&state.db, Some(id)).await?;
    let children = queries::load_access_for_pages(&state.db, children).await?;

    Ok(Json(
        children
            .into_iter()
            .filter(|p| can_view(&caller.principal, p, Some(&caller.session)))
            .map(|p| p.page)
            .collect(),
    ))
}

/// Report the caller's decisions for a page.
#[utoipa::path(
    get,
    path = "/api/pages/{id}/access",
    tag = "pages",
    params(("id" = Uuid, Path, description = "Page ID")),
    responses(
        (status = 200, description = "Access decisions", body = AccessSummary),
        (status = 404, description = "Page not found"),
    ),
)]
#[tracing::instrument(skip(state, caller))]
pub async fn get_page_access(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> PageResult<Json<AccessSummary>> {
    let chain = queries::load_ancestor_chain(&state.db, id).await?;
    let target = chain.last().ok_or(PageError::NotFound(Missing::Page(id)))?;
    let principal = &caller.principal;

    Ok(Json(AccessSummary {
        page_id: id,
        can_view: can_view_with_ancestors(principal, &chain, Some(&caller.session)),
        can_edit: can_edit(principal, target),
        can_edit_in_editor: can_edit_in_editor(principal, target),
        can_create_child: can_create_in_chain(principal, &chain),
    }))
}

// ============================================================================
// Editor Mutations
// ============================================================================

/// Create a page.
#[utoipa::path(
    post,
    path = "/api/pages",
    tag = "pages",
    request_body = CreatePageRequest,
    responses(
        (status = 201, description = "Page created with inherited grants", body = PageDetail),
        (status = 403, description = "Caller may not create pages here"),
        (status = 409, description = "Slug taken or grant invariant violated"),
    ),
    security(("bearer_auth" = [])),
)]
#[tracing::instrument(skip(state, caller, req))]
pub async fn create_page(
    State(state): State<AppState>,
    AuthMember(caller): AuthMember,
    Json(req): Json<CreatePageRequest>,
) -> PageResult<(StatusCode, Json<PageDetail>)> {
    req.validate()?;

    let slug = req.slug.clone().unwrap_or_else(|| slugify(&req.title));
    validate_slug(&slug).map_err(|e| PageError::Validation(e.to_string()))?;

    let parent_chain = match req.parent_id {
        Some(parent_id) => queries::load_ancestor_chain(&state.db, parent_id)
            .await
            .map_err(|e| match e {
                AccessError::NotFound(Missing::Page(id)) => {
                    PageError::NotFound(Missing::Parent(id))
                }
                other => other.into(),
            })?,
        None => Vec::new(),
    };

    if !can_create_in_chain(&caller.principal, &parent_chain) {
        warn!(parent_id = ?req.parent_id, member_id = ?caller.principal.id, "page creation denied");
        return Err(PageError::Forbidden);
    }

    let created = queries::create_page(
        &state.db,
        &NewPage {
            parent_id: req.parent_id,
            slug,
            title: req.title,
            is_public: req.is_public,
            created_by: caller.principal.id,
        },
        state.config.max_page_depth,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(PageDetail::from(created))))
}

/// Update a page's title or visibility.
///
/// Changing visibility makes or unmakes a public page, so it needs the
/// same rights as editing one.
#[utoipa::path(
    patch,
    path = "/api/pages/{id}",
    tag = "pages",
    params(("id" = Uuid, Path, description = "Page ID")),
    request_body = UpdatePageRequest,
    responses(
        (status = 200, description = "Page updated", body = PageDetail),
        (status = 403, description = "Caller may not edit this page"),
        (status = 409, description = "Page still has role grants"),
    ),
    security(("bearer_auth" = [])),
)]
#[tracing::instrument(skip(state, caller, req))]
pub async fn update_page(
    State(state): State<AppState>,
    AuthMember(caller): AuthMember,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdatePageRequest>,
) -> PageResult<Json<PageDetail>> {
    req.validate()?;

    let chain = queries::load_ancestor_chain(&state.db, id).await?;
    let target = ensure_editable(&caller, &chain)?;

    if let Some(is_public) = req.is_public {
        if is_public != target.is_public() && !caller.principal.is_site_admin() {
            warn!(page_id = %id, member_id = ?caller.principal.id, "visibility change denied");
            return Err(PageError::Forbidden);
        }
    }

    // Only site admins write the flag; anyone else could only restate it.
    let is_public = req.is_public.filter(|_| caller.principal.is_site_admin());
    queries::update_page(&state.db, id, req.title.as_deref(), is_public).await?;

    let page = queries::load_page_access(&state.db, id).await?;
    Ok(Json(PageDetail::from(page)))
}

/// Delete a page and everything under it.
#[utoipa::path(
    delete,
    path = "/api/pages/{id}",
    tag = "pages",
    params(("id" = Uuid, Path, description = "Page ID")),
    responses(
        (status = 204, description = "Page deleted"),
        (status = 403, description = "Caller may not edit this page"),
    ),
    security(("bearer_auth" = [])),
)]
#[tracing::instrument(skip(state, caller))]
pub async fn delete_page(
    State(state): State<AppState>,
    AuthMember(caller): AuthMember,
    Path(id): Path<Uuid>,
) -> PageResult<StatusCode> {
    let chain = queries::load_ancestor_chain(&state.db, id).await?;
    ensure_editable(&caller, &chain)?;

    queries::delete_page(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Documents
// ============================================================================

/// Get a document's metadata. Visible when its page is.
#[utoipa::path(
    get,
    path = "/api/documents/{id}",
    tag = "documents",
    params(("id" = Uuid, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Document", body = Document),
        (status = 303, description = "Sign in required"),
        (status = 403, description = "Access denied"),
        (status = 404, description = "Document not found"),
    ),
)]
#[tracing::instrument(skip(state, caller))]
pub async fn get_document(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> PageResult<Json<Document>> {
    let document = queries::get_document(&state.db, id)
        .await?
        .ok_or(PageError::NotFound(Missing::Document(id)))?;

    let chain = queries::load_ancestor_chain(&state.db, document.page_id).await?;
    ensure_visible(&caller, &state.config, &chain)?;
    Ok(Json(document))
}

/// List a page's documents.
#[utoipa::path(
    get,
    path = "/api/pages/{id}/documents",
    tag = "documents",
    params(("id" = Uuid, Path, description = "Page ID")),
    responses(
        (status = 200, description = "Documents", body = Vec<Document>),
        (status = 403, description = "Access denied"),
    ),
)]
#[tracing::instrument(skip(state, caller))]
pub async fn list_documents(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> PageResult<Json<Vec<Document>>> {
    let chain = queries::load_ancestor_chain(&state.db, id).await?;
    ensure_visible(&caller, &state.config, &chain)?;
    Ok(Json(queries::list_documents(&state.db, id).await?))
}

/// Register a document on a page.
#[utoipa::path(
    post,
    path = "/api/pages/{id}/documents",
    tag = "documents",
    params(("id" = Uuid, Path, description = "Page ID")),
    request_body = CreateDocumentRequest,
    responses(
        (status = 201, description = "Document registered", body = Document),
        (status = 403, description = "Caller may not edit this page"),
    ),
    security(("bearer_auth" = [])),
)]
#[tracing::instrument(skip(state, caller, req))]
pub async fn create_document(
    State(state): State<AppState>,
    AuthMember(caller): AuthMember,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateDocumentRequest>,
) -> PageResult<(StatusCode, Json<Document>)> {
    req.validate()?;

    let chain = queries::load_ancestor_chain(&state.db, id).await?;
    ensure_editable(&caller, &chain)?;

    let document = queries::create_document(
        &state.db,
        &NewDocument {
            page_id: id,
            title: req.title,
            file_name: req.file_name,
            content_type: req
                .content_type
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            size_bytes: req.size_bytes,
            uploaded_by: caller.principal.id,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(document)))
}
