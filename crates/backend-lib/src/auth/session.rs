// ============================
// crates/backend-lib/src/auth/session.rs
// ============================
//! Session orchestration: login, renewal, logout.
//!
//! This is the only component that touches the credential store and the
//! token issuer together. Access-token verification stays store-free.
use async_trait::async_trait;
use metrics::counter;
use tokio::task;
use uuid::Uuid;

use crate::auth::password::{
    hash_password_secure, validate_password_strength, verify_password, PasswordRequirements,
};
use crate::auth::service::{AuthService, IssuedTokens, NewIdentity};
use crate::auth::token::{
    fingerprint_eq, token_fingerprint, AccessClaims, TokenIssuer, TokenVerifier,
};
use crate::config::Settings;
use crate::error::AppError;
use crate::store::{NewUser, SwapOutcome, UserRecord, UserStore};
use crate::validation::{normalize_identifier, validate_email, validate_fullname, validate_username};

/// Session manager implementing the `AuthService` contract over a
/// credential store.
pub struct SessionManager<S> {
    store: S,
    issuer: TokenIssuer,
    verifier: TokenVerifier,
    requirements: PasswordRequirements,
    revoke_on_reuse: bool,
}

impl<S: UserStore> SessionManager<S> {
    pub fn new(store: S, settings: &Settings) -> Self {
        Self {
            store,
            issuer: TokenIssuer::from_settings(settings),
            verifier: TokenVerifier::from_settings(settings),
            requirements: settings.password_requirements.clone(),
            revoke_on_reuse: settings.revoke_on_reuse,
        }
    }

    /// Issue a fresh pair and persist the renewal fingerprint via CAS.
    ///
    /// Login contention (two logins, or a login racing a renewal) is
    /// resolved by one reload-and-retry; tokens minted by a losing
    /// attempt are discarded before anything durable happens.
    async fn issue_for_login(&self, mut record: UserRecord) -> Result<IssuedTokens, AppError> {
        for _ in 0..2 {
            let access_token = self.issuer.issue_access(&record)?;
            let renewal_token = self.issuer.issue_renewal(record.id)?;
            let fingerprint = token_fingerprint(&renewal_token);

            let outcome = self
                .store
                .swap_renewal_hash(
                    record.id,
                    record.current_renewal_hash.as_deref(),
                    Some(fingerprint),
                )
                .await?;

            match outcome {
                SwapOutcome::Swapped => {
                    counter!(crate::metrics::LOGIN_SUCCESS).increment(1);
                    tracing::info!(user_id = %record.id, "login succeeded");
                    return Ok(IssuedTokens {
                        user: record,
                        access_token,
                        renewal_token,
                    });
                },
                SwapOutcome::Conflict => {
                    record = self
                        .store
                        .find_by_id(record.id)
                        .await?
                        .ok_or(AppError::InvalidCredentials)?;
                },
            }
        }

        Err(AppError::Internal(
            "renewal hash contention during login".to_string(),
        ))
    }

    /// Reject a superseded renewal token. Optionally ends the whole
    /// session chain so a possibly stolen token family goes dead.
    async fn reject_reuse(&self, id: Uuid) -> Result<IssuedTokens, AppError> {
        counter!(crate::metrics::TOKEN_REUSE_DETECTED).increment(1);
        tracing::warn!(user_id = %id, "superseded renewal token presented");
        if self.revoke_on_reuse {
            self.store.clear_renewal_hash(id).await?;
        }
        Err(AppError::TokenReuse)
    }
}

#[async_trait]
impl<S: UserStore> AuthService for SessionManager<S> {
    async fn register(&self, identity: NewIdentity) -> Result<UserRecord, AppError> {
        let username = normalize_identifier(&identity.username);
        let email = normalize_identifier(&identity.email);
        let fullname = identity.fullname.trim().to_string();

        validate_username(&username)?;
        validate_email(&email)?;
        validate_fullname(&fullname)?;

        if !validate_password_strength(&identity.password, &self.requirements) {
            return Err(AppError::InvalidInput(
                "password does not meet the requirements".to_string(),
            ));
        }

        // scrypt is CPU-bound; keep it off the request executor.
        let mut plain = identity.password;
        let password_hash = task::spawn_blocking(move || hash_password_secure(&mut plain))
            .await
            .map_err(|e| AppError::Internal(format!("hashing task failed: {e}")))?
            .map_err(|_| AppError::Internal("password hashing failed".to_string()))?;

        let record = self
            .store
            .create(NewUser {
                username,
                email,
                fullname,
                password_hash,
            })
            .await?;

        counter!(crate::metrics::USER_REGISTERED).increment(1);
        tracing::info!(user_id = %record.id, "identity registered");
        Ok(record)
    }

    async fn login(&self, identifier: &str, password: &str) -> Result<IssuedTokens, AppError> {
        let identifier = normalize_identifier(identifier);

        // Unknown identifier and wrong password fail identically, so
        // callers cannot probe which identities exist.
        let Some(record) = self.store.find_by_identifier(&identifier).await? else {
            counter!(crate::metrics::LOGIN_FAILURE).increment(1);
            return Err(AppError::InvalidCredentials);
        };

        let stored_hash = record.password_hash.clone();
        let plain = password.to_owned();
        let password_ok = task::spawn_blocking(move || verify_password(&stored_hash, &plain))
            .await
            .map_err(|e| AppError::Internal(format!("hashing task failed: {e}")))?;

        if !password_ok {
            counter!(crate::metrics::LOGIN_FAILURE).increment(1);
            tracing::debug!(user_id = %record.id, "password mismatch");
            return Err(AppError::InvalidCredentials);
        }

        self.issue_for_login(record).await
    }

    async fn renew(&self, renewal_token: &str) -> Result<IssuedTokens, AppError> {
        let claims = self.verifier.verify_renewal(renewal_token)?;

        // A structurally valid token for a vanished identity has
        // nothing to rotate and nothing left to revoke.
        let record = self
            .store
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::TokenInvalid)?;

        let presented = token_fingerprint(renewal_token);
        let stored = match record.current_renewal_hash.as_deref() {
            Some(stored) => stored,
            None => return self.reject_reuse(record.id).await,
        };
        if !fingerprint_eq(stored, &presented) {
            return self.reject_reuse(record.id).await;
        }

        let access_token = self.issuer.issue_access(&record)?;
        let renewal_token = self.issuer.issue_renewal(record.id)?;
        let new_fingerprint = token_fingerprint(&renewal_token);

        match self
            .store
            .swap_renewal_hash(record.id, Some(stored), Some(new_fingerprint))
            .await?
        {
            SwapOutcome::Swapped => {
                counter!(crate::metrics::TOKEN_RENEWED).increment(1);
                tracing::debug!(user_id = %record.id, "renewal token rotated");
                Ok(IssuedTokens {
                    user: record,
                    access_token,
                    renewal_token,
                })
            },
            SwapOutcome::Conflict => {
                // A concurrent renewal won the swap; this presentation
                // is a replay of an already-consumed token. The minted
                // pair is dropped here. The stored fingerprint now
                // belongs to the winner, so it is NOT cleared.
                counter!(crate::metrics::TOKEN_REUSE_DETECTED).increment(1);
                tracing::warn!(user_id = %record.id, "renewal lost the rotation race");
                Err(AppError::TokenReuse)
            },
        }
    }

    async fn logout(&self, id: Uuid) -> Result<(), AppError> {
        self.store.clear_renewal_hash(id).await?;
        counter!(crate::metrics::LOGOUT).increment(1);
        tracing::info!(user_id = %id, "session chain ended");
        Ok(())
    }

    fn verify_access(&self, token: &str) -> Result<AccessClaims, AppError> {
        self.verifier.verify_access(token)
    }
}
