// ============================
// crates/backend-lib/src/lib.rs
// ============================
//! Core library for the `vidstream` identity backend.
//!
//! Credential verification and session-token issuance/renewal live in
//! [`auth`]; the credential store seam is [`store::UserStore`]. The
//! HTTP surface in [`router`] and [`handlers`] is thin plumbing over
//! those two.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod router;
pub mod store;
pub mod validation;

use std::sync::Arc;

use crate::auth::{AuthRateLimiter, SessionManager};
use crate::config::Settings;
use crate::store::UserStore;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState<S> {
    /// Session manager: the only component that combines the
    /// credential store with the token issuer
    pub auth: Arc<SessionManager<S>>,
    /// Settings
    pub settings: Arc<Settings>,
    /// Failed-login lockout tracking
    pub rate_limiter: Arc<AuthRateLimiter>,
}

impl<S: UserStore + Clone> AppState<S> {
    /// Create a new application state
    pub fn new(store: S, settings: Settings) -> Self {
        let auth = Arc::new(SessionManager::new(store, &settings));
        let rate_limiter = Arc::new(AuthRateLimiter::from_settings(&settings.auth_rate_limit));

        Self {
            auth,
            settings: Arc::new(settings),
            rate_limiter,
        }
    }
}
