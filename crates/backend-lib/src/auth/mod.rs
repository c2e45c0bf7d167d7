// ============================
// crates/backend-lib/src/auth/mod.rs
// ============================
//! Authentication module.

pub mod password;
pub mod rate_limit;
mod service;
mod session;
pub mod token;

pub use password::{
    hash_password, validate_password_strength, verify_password, PasswordRequirements,
    MIN_PASSWORD_LENGTH,
};
pub use rate_limit::AuthRateLimiter;
pub use service::{AuthService, IssuedTokens, NewIdentity};
pub use session::SessionManager;
pub use token::{token_fingerprint, AccessClaims, RenewalClaims, TokenIssuer, TokenVerifier};
