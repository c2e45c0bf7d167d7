// ============================
// crates/backend-lib/src/auth/rate_limit.rs
// ============================
//! Rate limiting for authentication attempts.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::RateLimitSettings;

/// Entry in the rate limit map
#[derive(Debug, Clone)]
struct RateLimitEntry {
    /// Number of failed attempts
    failed_attempts: u32,
    /// Time of the last failed attempt
    last_failure: Instant,
    /// When the lockout expires, if locked out
    lockout_expiry: Option<Instant>,
}

/// Rate limiter for login attempts, keyed by client address.
///
/// Failed logins accumulate per client; once the limit is hit the
/// client is locked out for the configured window. A successful login
/// clears the slate.
#[derive(Debug, Clone)]
pub struct AuthRateLimiter {
    attempts: Arc<DashMap<String, RateLimitEntry>>,
    max_attempts: u32,
    lockout_duration: Duration,
}

impl Default for AuthRateLimiter {
    fn default() -> Self {
        Self::from_settings(&RateLimitSettings::default())
    }
}

impl AuthRateLimiter {
    pub fn new(max_attempts: u32, lockout_duration: Duration) -> Self {
        Self {
            attempts: Arc::new(DashMap::new()),
            max_attempts,
            lockout_duration,
        }
    }

    pub fn from_settings(settings: &RateLimitSettings) -> Self {
        Self::new(
            settings.max_attempts,
            Duration::from_secs(settings.lockout_secs),
        )
    }

    /// Record a failed authentication attempt
    pub fn record_failed_attempt(&self, client: &str) {
        let now = Instant::now();

        let mut entry = self
            .attempts
            .entry(client.to_string())
            .or_insert_with(|| RateLimitEntry {
                failed_attempts: 0,
                last_failure: now,
                lockout_expiry: None,
            });

        // An expired lockout resets the counter
        if let Some(expiry) = entry.lockout_expiry {
            if now > expiry {
                entry.failed_attempts = 0;
                entry.lockout_expiry = None;
            }
        }

        entry.failed_attempts += 1;
        entry.last_failure = now;

        if entry.failed_attempts >= self.max_attempts {
            entry.lockout_expiry = Some(now + self.lockout_duration);
            tracing::warn!(client, "client locked out after repeated login failures");
        }
    }

    /// Record a successful authentication
    pub fn record_success(&self, client: &str) {
        self.attempts.remove(client);
    }

    /// Check if a client is allowed to attempt authentication
    pub fn check_rate_limit(&self, client: &str) -> bool {
        if let Some(entry) = self.attempts.get(client) {
            if let Some(expiry) = entry.lockout_expiry {
                if Instant::now() < expiry {
                    return false;
                }
            }
        }

        true
    }

    /// Clean up expired lockouts and stale failure records
    pub fn cleanup(&self) {
        let now = Instant::now();

        self.attempts.retain(|_, entry| {
            if let Some(expiry) = entry.lockout_expiry {
                return now < expiry;
            }
            now.duration_since(entry.last_failure) < Duration::from_secs(24 * 60 * 60)
        });
    }
}
