//! Back-office Module
//!
//! Grant management for officers and page grantees:
//! - Role grants (view restrictions) and member grants (edit rights)
//! - Visibility toggle
//!
//! Every route requires a signed-in member; each handler then checks the
//! context-free edit rule for the page it touches.

pub mod handlers;
pub mod middleware;
pub mod types;

use axum::{
    middleware::from_fn,
    routing::{get, put},
    Router,
};

use crate::api::AppState;

pub use middleware::require_member;
pub use types::{AdminError, AdminResult, GrantChange, VisibilityRequest};

/// Create the back-office router (mounted at /api/admin).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pages/{id}", get(handlers::get_page_grants))
        .route(
            "/pages/{id}/roles/{role}",
            put(handlers::add_role_grant).delete(handlers::remove_role_grant),
        )
        .route(
            "/pages/{id}/members/{member_id}",
            put(handlers::add_member_grant).delete(handlers::remove_member_grant),
        )
        .route("/pages/{id}/visibility", put(handlers::set_visibility))
        .layer(from_fn(require_member))
}
