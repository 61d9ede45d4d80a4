//! Page Route Error Types

use axum::http::{header::LOCATION, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use crate::access::{AccessError, Invariant, Missing};

#[derive(Debug, thiserror::Error)]
pub enum PageError {
    /// Anonymous caller denied; carries the login redirect target.
    #[error("Sign in to view this page")]
    LoginRequired(String),

    #[error("You do not have access to this page")]
    Forbidden,

    #[error("Not found: {0}")]
    NotFound(Missing),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Slug '{0}' is already used under this parent")]
    SlugTaken(String),

    #[error("Pages cannot be nested deeper than {0} levels")]
    TooDeep(usize),

    #[error("{0}")]
    Invariant(Invariant),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt role grant: {0}")]
    CorruptGrant(gp_common::Error),
}

impl From<AccessError> for PageError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::InvariantViolation(invariant) => Self::Invariant(invariant),
            AccessError::NotFound(missing) => Self::NotFound(missing),
            AccessError::SlugTaken(slug) => Self::SlugTaken(slug),
            AccessError::TooDeep(depth) => Self::TooDeep(depth),
            AccessError::Vocabulary(e) => Self::CorruptGrant(e),
            AccessError::Database(e) => Self::Database(e),
        }
    }
}

impl From<validator::ValidationErrors> for PageError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::LoginRequired(_) => (StatusCode::SEE_OTHER, "login_required"),
            Self::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            Self::SlugTaken(_) => (StatusCode::CONFLICT, "slug_taken"),
            Self::TooDeep(_) => (StatusCode::BAD_REQUEST, "too_deep"),
            Self::Invariant(invariant) => (StatusCode::CONFLICT, invariant.code()),
            Self::Database(_) | Self::CorruptGrant(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };

        let message = match &self {
            Self::Database(e) => {
                error!(error = %e, "page request failed");
                "Internal server error".to_string()
            }
            Self::CorruptGrant(e) => {
                error!(error = %e, "stored role grant is outside the role vocabulary");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(serde_json::json!({
            "error": code,
            "message": message,
        }));

        match self {
            Self::LoginRequired(location) => {
                (status, [(LOCATION, location)], body).into_response()
            }
            _ => (status, body).into_response(),
        }
    }
}

/// Result type for page handlers.
pub type PageResult<T> = Result<T, PageError>;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_login_required_redirects() {
        let response = PageError::LoginRequired("/login?next=/board".into()).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(LOCATION).and_then(|v| v.to_str().ok()),
            Some("/login?next=/board")
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            PageError::Forbidden.into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            PageError::from(AccessError::NotFound(Missing::Page(Uuid::new_v4())))
                .into_response()
                .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            PageError::from(AccessError::InvariantViolation(
                Invariant::RoleGrantOnPublicPage
            ))
            .into_response()
            .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            PageError::from(AccessError::SlugTaken("board".into()))
                .into_response()
                .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            PageError::from(AccessError::Database(sqlx::Error::RowNotFound))
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
