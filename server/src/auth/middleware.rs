//! Authentication Middleware
//!
//! Every request gets a [`Caller`]. Requests without a bearer token are
//! anonymous; a token that is present but invalid is rejected outright.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use gp_common::{Principal, SessionContext};
use tracing::warn;

use crate::api::AppState;
use crate::db::{find_member_by_id, Member};

use super::error::AuthError;
use super::jwt::{validate_access_token, Claims};

/// Who is making the request, injected into request extensions.
#[derive(Debug, Clone, Default)]
pub struct Caller {
    /// Capability snapshot used for every access decision.
    pub principal: Principal,
    /// Session flags set by the authentication layer.
    pub session: SessionContext,
}

impl Caller {
    /// Caller for a request without credentials.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Build the caller for a validated token and its member record.
    ///
    /// The device flag is only honoured for service accounts.
    #[must_use]
    pub fn from_member(member: &Member, claims: &Claims) -> Self {
        let session = match (claims.device_verified, member.is_service_account) {
            (true, true) => SessionContext::verified_bypass(),
            (true, false) => {
                warn!(
                    member_id = %member.id,
                    "ignoring device verification claim on a non-service account"
                );
                SessionContext::none()
            }
            (false, _) => SessionContext::none(),
        };

        Self {
            principal: member.principal(),
            session,
        }
    }
}

/// Bearer token from the Authorization header, if any.
fn bearer_token(request: &Request) -> Result<Option<&str>, AuthError> {
    let Some(header) = request.headers().get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = header.to_str().map_err(|_| AuthError::InvalidAuthHeader)?;
    value
        .strip_prefix("Bearer ")
        .map(Some)
        .ok_or(AuthError::InvalidAuthHeader)
}

/// Middleware to resolve the caller.
///
/// Validates a Bearer token when one is sent, loads the member, and
/// injects a [`Caller`] into request extensions. Without a token the caller
/// is anonymous.
///
/// # Usage
///
/// ```ignore
/// Router::new()
///     .route("/pages/{id}", get(handler))
///     .layer(axum::middleware::from_fn_with_state(state, resolve_caller))
/// ```
pub async fn resolve_caller(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(&request)?.map(str::to_owned);
    let caller = match token {
        None => Caller::anonymous(),
        Some(token) => {
            let claims = validate_access_token(&token, &state.config.jwt_secret)?;
            let member_id = claims.member_id()?;
            let member = find_member_by_id(&state.db, member_id)
                .await?
                .ok_or(AuthError::MemberNotFound)?;
            Caller::from_member(&member, &claims)
        }
    };

    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}

/// Extractor for the caller in handlers.
///
/// Falls back to anonymous when the middleware did not run.
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Self>()
            .cloned()
            .unwrap_or_default())
    }
}

/// A caller that is signed in.
///
/// Use for routes that make no sense anonymously, such as the back office.
#[derive(Debug, Clone)]
pub struct AuthMember(pub Caller);

impl<S> FromRequestParts<S> for AuthMember
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let caller = Caller::from_request_parts(parts, state).await?;
        if caller.principal.is_anonymous() {
            return Err(AuthError::MissingAuthHeader);
        }
        Ok(Self(caller))
    }
}
