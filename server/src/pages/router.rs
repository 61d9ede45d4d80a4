//! Router configuration for the page tree.

use axum::routing::get;
use axum::Router;

use super::handlers;
use crate::api::AppState;

/// Router for pages (mounted at /api/pages).
pub fn pages_router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_root_pages).post(handlers::create_page),
        )
        .route("/by-path/{*path}", get(handlers::get_page_by_path))
        .route(
            "/{id}",
            get(handlers::get_page)
                .patch(handlers::update_page)
                .delete(handlers::delete_page),
        )
        .route("/{id}/children", get(handlers::list_children))
        .route("/{id}/access", get(handlers::get_page_access))
        .route(
            "/{id}/documents",
            get(handlers::list_documents).post(handlers::create_document),
        )
}

/// Router for documents (mounted at /api/documents).
pub fn documents_router() -> Router<AppState> {
    Router::new().route("/{id}", get(handlers::get_document))
}
