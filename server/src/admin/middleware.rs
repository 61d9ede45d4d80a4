//! Back-office middleware.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

use super::types::AdminError;
use crate::auth::Caller;

/// Middleware that turns away anonymous callers before any back-office
/// handler runs.
///
/// Must be layered inside [`crate::auth::resolve_caller`].
#[tracing::instrument(skip(request, next))]
pub async fn require_member(request: Request, next: Next) -> Result<Response, AdminError> {
    let signed_in = request
        .extensions()
        .get::<Caller>()
        .is_some_and(|caller| !caller.principal.is_anonymous());

    if !signed_in {
        return Err(AdminError::SignInRequired);
    }
    Ok(next.run(request).await)
}
