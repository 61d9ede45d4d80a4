//! Reusable test helpers for HTTP integration tests.
//!
//! Provides `TestApp` for sending requests through the full axum router,
//! plus utilities for member creation, page setup and JWT generation.
#![allow(dead_code)]

use axum::body::Body;
use axum::http::{self, Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use gp_server::access::{queries, NewPage, PageAccess, Role, RoleRequirement};
use gp_server::api::{create_router, AppState};
use gp_server::auth::jwt;
use gp_server::config::Config;

// ============================================================================
// TestApp
// ============================================================================

/// The full router over a test database.
pub struct TestApp {
    pub router: Router,
    pub pool: PgPool,
    pub config: Config,
}

impl TestApp {
    /// Build the router over `pool` with the test configuration.
    pub fn new(pool: PgPool) -> Self {
        let config = Config::default_for_test();
        let state = AppState::new(pool.clone(), config.clone());
        Self {
            router: create_router(state),
            pool,
            config,
        }
    }

    /// Start a request builder.
    pub fn request(method: Method, uri: &str) -> http::request::Builder {
        Request::builder().method(method).uri(uri)
    }

    /// Send a request through the router.
    pub async fn oneshot(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    /// GET `uri`, optionally as `token`'s holder.
    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response<Body> {
        let mut builder = Self::request(Method::GET, uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        self.oneshot(builder.body(Body::empty()).expect("valid request"))
            .await
    }

    /// Send a JSON body with `token`'s credentials.
    pub async fn send_json(
        &self,
        method: Method,
        uri: &str,
        token: &str,
        body: &serde_json::Value,
    ) -> Response<Body> {
        let request = Self::request(method, uri)
            .header("Authorization", format!("Bearer {token}"))
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("valid request");
        self.oneshot(request).await
    }

    /// Send an empty-bodied request with `token`'s credentials.
    pub async fn send(&self, method: Method, uri: &str, token: &str) -> Response<Body> {
        let request = Self::request(method, uri)
            .header("Authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .expect("valid request");
        self.oneshot(request).await
    }

    /// Access token for `member_id`.
    pub fn token_for(&self, member_id: Uuid) -> String {
        jwt::generate_access_token(member_id, &self.config.jwt_secret, 900, false)
            .expect("Failed to generate token")
    }

    /// Access token carrying the verified bound-device claim.
    pub fn device_token_for(&self, member_id: Uuid) -> String {
        jwt::generate_access_token(member_id, &self.config.jwt_secret, 900, true)
            .expect("Failed to generate token")
    }
}

/// Read a response body as JSON.
pub async fn body_to_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}

// ============================================================================
// Fixtures
// ============================================================================

/// Insert a member with `status` and `roles`.
pub async fn create_member(pool: &PgPool, status: &str, roles: &[Role]) -> Uuid {
    let username = format!("m{}", &Uuid::new_v4().simple().to_string()[..12]);
    let id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO members (username, display_name, membership_status) VALUES ($1, $1, $2) RETURNING id",
    )
    .bind(&username)
    .bind(status)
    .fetch_one(pool)
    .await
    .expect("Failed to create member");

    for role in roles {
        // Role names double as column names.
        sqlx::query(&format!("UPDATE members SET {} = TRUE WHERE id = $1", role.as_str()))
            .bind(id)
            .execute(pool)
            .await
            .expect("Failed to grant role");
    }
    id
}

/// Flag a member as superuser.
pub async fn make_superuser(pool: &PgPool, member_id: Uuid) {
    sqlx::query("UPDATE members SET is_superuser = TRUE WHERE id = $1")
        .bind(member_id)
        .execute(pool)
        .await
        .expect("Failed to flag superuser");
}

/// Flag a member as a shared-device service account.
pub async fn make_service_account(pool: &PgPool, member_id: Uuid) {
    sqlx::query("UPDATE members SET is_service_account = TRUE WHERE id = $1")
        .bind(member_id)
        .execute(pool)
        .await
        .expect("Failed to flag service account");
}

/// Create a page directly, bypassing the editor policy.
pub async fn create_page(
    pool: &PgPool,
    parent: Option<Uuid>,
    slug: &str,
    is_public: bool,
) -> PageAccess {
    queries::create_page(
        pool,
        &NewPage {
            parent_id: parent,
            slug: slug.to_string(),
            title: slug.to_string(),
            is_public: Some(is_public),
            created_by: None,
        },
        10,
    )
    .await
    .expect("Failed to create page")
}

/// Require `role` to view `page_id`.
pub async fn require_role(pool: &PgPool, page_id: Uuid, role: impl Into<RoleRequirement>) {
    queries::add_role_grant(pool, page_id, role.into())
        .await
        .expect("Failed to add role grant");
}
