//! Back-office types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::access::{AccessError, PageDetail};
use crate::pages::PageError;

/// Back-office API error type.
#[derive(Debug, Error)]
pub enum AdminError {
    /// No signed-in member.
    #[error("Sign in required")]
    SignInRequired,

    /// Caller may not manage this page.
    #[error("You may not manage this page")]
    Forbidden,

    /// Role name outside the vocabulary.
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// Grant store error.
    #[error(transparent)]
    Access(#[from] AccessError),
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::SignInRequired => (StatusCode::UNAUTHORIZED, serde_json::json!({"error": "sign_in_required", "message": "Sign in required"})),
            Self::Forbidden => (StatusCode::FORBIDDEN, serde_json::json!({"error": "forbidden", "message": "You may not manage this page"})),
            Self::UnknownRole(role) => (StatusCode::BAD_REQUEST, serde_json::json!({"error": "unknown_role", "message": format!("Unknown role: {role}")})),
            Self::Access(e) => return PageError::from(e).into_response(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for back-office handlers.
pub type AdminResult<T> = Result<T, AdminError>;

/// Request body for the visibility toggle.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct VisibilityRequest {
    pub is_public: bool,
}

/// A page's grants after a back-office change.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct GrantChange {
    /// Whether the call changed anything.
    pub changed: bool,
    pub page: PageDetail,
}
