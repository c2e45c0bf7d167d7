// ============================
// crates/backend-lib/src/handlers/users.rs
// ============================
//! Identity endpoints: register, login, token renewal, logout.
//!
//! Handlers translate wire DTOs into `AuthService` calls and map every
//! failure through `AppError`'s response conversion. Plaintext
//! passwords and raw tokens never reach a log line here.
use axum::{
    extract::{Extension, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use vidstream_common::{
    AuthResponse, CurrentUser, LoginRequest, MessageResponse, RegisterRequest, RenewRequest,
};

use crate::auth::{AccessClaims, AuthService, IssuedTokens, NewIdentity};
use crate::error::AppError;
use crate::store::UserStore;
use crate::AppState;

/// `POST /api/v1/users/register`
pub async fn register<S: UserStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let record = state
        .auth
        .register(NewIdentity {
            username: body.username,
            email: body.email,
            fullname: body.fullname,
            password: body.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(record.profile())))
}

/// `POST /api/v1/users/login`
///
/// Failed attempts count against the client's lockout budget; a
/// lockout rejects the attempt before any credential work happens.
pub async fn login<S: UserStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let client = client_key(&headers);
    if !state.rate_limiter.check_rate_limit(&client) {
        return Err(AppError::AuthRateLimited);
    }

    match state.auth.login(&body.identifier, &body.password).await {
        Ok(tokens) => {
            state.rate_limiter.record_success(&client);
            Ok(Json(auth_response(tokens)))
        },
        Err(err @ AppError::InvalidCredentials) => {
            state.rate_limiter.record_failed_attempt(&client);
            Err(err)
        },
        Err(err) => Err(err),
    }
}

/// `POST /api/v1/users/refresh-token`
pub async fn renew<S: UserStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(body): Json<RenewRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let tokens = state.auth.renew(&body.renewal_token).await?;
    Ok(Json(auth_response(tokens)))
}

/// `POST /api/v1/users/logout` (protected)
pub async fn logout<S: UserStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Extension(claims): Extension<AccessClaims>,
) -> Result<Json<MessageResponse>, AppError> {
    state.auth.logout(claims.sub).await?;
    Ok(Json(MessageResponse {
        message: "logged out".to_string(),
    }))
}

/// `GET /api/v1/users/current-user` (protected)
///
/// Answered entirely from the access token's denormalized claims; no
/// store round-trip on the hot path.
pub async fn current_user(
    Extension(claims): Extension<AccessClaims>,
) -> Json<CurrentUser> {
    Json(CurrentUser {
        id: claims.sub,
        username: claims.username,
        email: claims.email,
    })
}

fn auth_response(tokens: IssuedTokens) -> AuthResponse {
    AuthResponse {
        user: tokens.user.profile(),
        access_token: tokens.access_token,
        renewal_token: tokens.renewal_token,
    }
}

// Client key for lockout accounting, as forwarded by the proxy.
fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}
