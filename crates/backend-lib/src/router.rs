// ============================
// crates/backend-lib/src/router.rs
// ============================
//! HTTP router wiring.
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::users;
use crate::middleware::require_access;
use crate::store::UserStore;
use crate::AppState;

/// Create the API router
pub fn create_router<S: UserStore + Clone + 'static>(state: Arc<AppState<S>>) -> Router {
    let protected = Router::new()
        .route("/api/v1/users/logout", post(users::logout::<S>))
        .route("/api/v1/users/current-user", get(users::current_user))
        .route_layer(from_fn_with_state(state.clone(), require_access::<S>));

    Router::new()
        .route("/api/v1/users/register", post(users::register::<S>))
        .route("/api/v1/users/login", post(users::login::<S>))
        .route("/api/v1/users/refresh-token", post(users::renew::<S>))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
