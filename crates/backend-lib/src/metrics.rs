// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys
pub const USER_REGISTERED: &str = "auth.user_registered";
pub const LOGIN_SUCCESS: &str = "auth.login.success";
pub const LOGIN_FAILURE: &str = "auth.login.failure";
pub const TOKEN_RENEWED: &str = "auth.token.renewed";
pub const TOKEN_REUSE_DETECTED: &str = "auth.token.reuse_detected";
pub const LOGOUT: &str = "auth.logout";
