use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::context::ApiContext;
use super::error::ApiError;

/// Token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Resolves the bearer token to an `AuthUser` and attaches it to the request.
/// Every route behind this layer requires a valid session.
pub async fn require_session(
    State(context): State<ApiContext>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = bearer_token(req.headers());

    let user = context
        .services
        .auth
        .verify_session(token)
        .await
        .map_err(|e| {
            tracing::trace!(error = ?e, "unable to verify session");
            ApiError::from(e).into_response()
        })?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
