// ============================
// crates/backend-lib/src/config.rs
// ============================
//! Configuration management.
//!
//! Signing secrets and token horizons are deployment configuration and
//! are injected into the token issuer/verifier at construction; nothing
//! in the auth core reads process environment state directly.
use crate::auth::password::PasswordRequirements;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Log level
    pub log_level: String,
    /// Secret used to sign access tokens
    pub access_token_secret: String,
    /// Secret used to sign renewal tokens. Must differ from the access
    /// secret so a leak of one cannot forge the other kind.
    pub renewal_token_secret: String,
    /// Access token horizon in seconds (short)
    pub access_ttl_secs: u64,
    /// Renewal token horizon in seconds (long)
    pub renewal_ttl_secs: u64,
    /// Clear the stored renewal hash when a superseded token is
    /// presented, ending the session chain outright
    pub revoke_on_reuse: bool,
    /// Password requirements
    pub password_requirements: PasswordRequirements,
    /// Failed-login lockout policy
    pub auth_rate_limit: RateLimitSettings,
}

/// Failed-login lockout policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    /// Failed attempts tolerated before lockout
    pub max_attempts: u32,
    /// Lockout duration in seconds
    pub lockout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8000".parse().unwrap(),
            log_level: "info".to_string(),
            access_token_secret: "dev-access-secret-change-me".to_string(),
            renewal_token_secret: "dev-renewal-secret-change-me".to_string(),
            access_ttl_secs: 60 * 15,              // 15 minutes
            renewal_ttl_secs: 60 * 60 * 24 * 10,   // 10 days
            revoke_on_reuse: true,
            password_requirements: PasswordRequirements::default(),
            auth_rate_limit: RateLimitSettings::default(),
        }
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lockout_secs: 5 * 60,
        }
    }
}

impl Settings {
    /// Load settings: defaults, overridden by `config.toml`, overridden
    /// by `VIDSTREAM_*` environment variables.
    pub fn load() -> Result<Settings> {
        Self::load_from("config.toml")
    }

    /// Load settings with an explicit config file path.
    pub fn load_from(path: &str) -> Result<Settings> {
        let settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("VIDSTREAM_"))
            .extract()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sane() {
        let settings = Settings::default();
        assert_eq!(settings.bind_addr.port(), 8000);
        // Access horizon must be much shorter than the renewal horizon.
        assert!(settings.access_ttl_secs < settings.renewal_ttl_secs);
        // The two signing secrets must never collapse into one.
        assert_ne!(settings.access_token_secret, settings.renewal_token_secret);
        assert!(settings.revoke_on_reuse);
    }

    #[test]
    fn test_load_without_config_file_falls_back_to_defaults() {
        let settings = Settings::load_from("does-not-exist.toml").unwrap();
        assert_eq!(settings.log_level, "info");
        assert_eq!(settings.auth_rate_limit.max_attempts, 5);
    }
}
