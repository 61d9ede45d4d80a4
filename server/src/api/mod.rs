//! API Router and Application State
//!
//! Central routing configuration and shared state.

use axum::{
    extract::State, middleware::from_fn_with_state, routing::get, Json, Router,
};
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::{admin, auth, config::Config, pages};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,
    /// Server configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }
}

/// OpenAPI document for the page and back-office routes.
#[derive(OpenApi)]
#[openapi(
    paths(
        pages::handlers::list_root_pages,
        pages::handlers::get_page_by_path,
        pages::handlers::get_page,
        pages::handlers::list_children,
        pages::handlers::get_page_access,
        pages::handlers::create_page,
        pages::handlers::update_page,
        pages::handlers::delete_page,
        pages::handlers::get_document,
        pages::handlers::list_documents,
        pages::handlers::create_document,
        admin::handlers::get_page_grants,
        admin::handlers::add_role_grant,
        admin::handlers::remove_role_grant,
        admin::handlers::add_member_grant,
        admin::handlers::remove_member_grant,
        admin::handlers::set_visibility,
    ),
    components(schemas(auth::ErrorResponse)),
    modifiers(&BearerAuth),
    tags(
        (name = "pages", description = "Page tree"),
        (name = "documents", description = "Documents attached to pages"),
        (name = "admin", description = "Back-office grant management"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by member-only routes.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .nest("/api/pages", pages::pages_router())
        .nest("/api/documents", pages::documents_router())
        .nest("/api/admin", admin::router())
        .layer(from_fn_with_state(state.clone(), auth::resolve_caller));

    Router::new()
        // Health check
        .route("/health", get(health_check))
        .merge(api_routes)
        // API documentation
        .route("/api/openapi.json", get(openapi_json))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // State
        .with_state(state)
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    /// Service status
    status: &'static str,
    /// Whether the database answered
    database: bool,
}

/// Health check endpoint.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = sqlx::query("SELECT 1").execute(&state.db).await.is_ok();
    Json(HealthResponse {
        status: if database { "ok" } else { "degraded" },
        database,
    })
}

/// Serve the OpenAPI document.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
