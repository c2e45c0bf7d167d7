use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::auth::AuthService;
use crate::error::AppError;
use crate::store::UserStore;
use crate::AppState;

/// Middleware guarding protected routes.
///
/// Extracts the bearer access token, verifies signature and expiry
/// (no store access), and injects the decoded claims into request
/// extensions for handlers downstream.
pub async fn require_access<S: UserStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers()).ok_or(AppError::TokenInvalid)?;
    let claims = state.auth.verify_access(token)?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Pull the token out of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
