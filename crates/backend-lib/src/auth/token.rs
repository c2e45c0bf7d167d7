// ============================
// crates/backend-lib/src/auth/token.rs
// ============================
//! Access and renewal token issuance/verification.
//!
//! Both kinds are HS256-signed with *independent* secrets: a leaked
//! access secret cannot be used to mint renewal tokens, and vice versa.
//! Verification is store-free; expiry is checked only after the
//! signature holds.
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::Settings;
use crate::error::AppError;
use crate::store::UserRecord;

/// Entropy of the renewal token's `jti` (32 bytes = 256 bits)
const JTI_BYTES: usize = 32;

/// Clock skew tolerance in seconds
const LEEWAY_SECS: u64 = 30;

/// Claims carried by a short-lived access token. Username and email are
/// denormalized so protected routes can answer without a store read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject: identity id
    pub sub: Uuid,
    pub username: String,
    pub email: String,
    /// Issued at (unix timestamp)
    pub iat: i64,
    /// Expiry (unix timestamp)
    pub exp: i64,
}

/// Claims carried by a long-lived renewal token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenewalClaims {
    /// Subject: identity id
    pub sub: Uuid,
    /// Fresh randomness per issue; keeps back-to-back rotations within
    /// the same second from producing an identical token
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

/// Mints signed, expiring tokens of both kinds.
pub struct TokenIssuer {
    access_key: EncodingKey,
    renewal_key: EncodingKey,
    access_ttl_secs: u64,
    renewal_ttl_secs: u64,
}

impl TokenIssuer {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            access_key: EncodingKey::from_secret(settings.access_token_secret.as_bytes()),
            renewal_key: EncodingKey::from_secret(settings.renewal_token_secret.as_bytes()),
            access_ttl_secs: settings.access_ttl_secs,
            renewal_ttl_secs: settings.renewal_ttl_secs,
        }
    }

    pub fn issue_access(&self, user: &UserRecord) -> Result<String, AppError> {
        let now = Utc::now().timestamp();
        let claims = AccessClaims {
            sub: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            iat: now,
            exp: now + self.access_ttl_secs as i64,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.access_key)
            .map_err(|e| AppError::Internal(format!("access token encoding failed: {e}")))
    }

    pub fn issue_renewal(&self, id: Uuid) -> Result<String, AppError> {
        let now = Utc::now().timestamp();
        let claims = RenewalClaims {
            sub: id,
            jti: new_jti(),
            iat: now,
            exp: now + self.renewal_ttl_secs as i64,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.renewal_key)
            .map_err(|e| AppError::Internal(format!("renewal token encoding failed: {e}")))
    }
}

/// Validates token signature and expiry; never consults the store.
pub struct TokenVerifier {
    access_key: DecodingKey,
    renewal_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn from_settings(settings: &Settings) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = LEEWAY_SECS;

        Self {
            access_key: DecodingKey::from_secret(settings.access_token_secret.as_bytes()),
            renewal_key: DecodingKey::from_secret(settings.renewal_token_secret.as_bytes()),
            validation,
        }
    }

    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, AppError> {
        decode::<AccessClaims>(token, &self.access_key, &self.validation)
            .map(|data| data.claims)
            .map_err(map_jwt_error)
    }

    pub fn verify_renewal(&self, token: &str) -> Result<RenewalClaims, AppError> {
        decode::<RenewalClaims>(token, &self.renewal_key, &self.validation)
            .map(|data| data.claims)
            .map_err(map_jwt_error)
    }
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> AppError {
    use jsonwebtoken::errors::ErrorKind;
    match err.kind() {
        ErrorKind::ExpiredSignature => AppError::TokenExpired,
        _ => AppError::TokenInvalid,
    }
}

/// SHA-256 hex fingerprint of a token's text. Only this fingerprint is
/// ever persisted; the renewal token itself lives with the client.
pub fn token_fingerprint(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Constant-time fingerprint comparison.
pub fn fingerprint_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes().zip(b.bytes()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn new_jti() -> String {
    let mut buffer = [0u8; JTI_BYTES];
    OsRng.fill_bytes(&mut buffer);
    URL_SAFE_NO_PAD.encode(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_settings() -> Settings {
        Settings {
            access_token_secret: "access-secret-at-least-32-bytes!!".to_string(),
            renewal_token_secret: "renewal-secret-at-least-32-bytes!".to_string(),
            access_ttl_secs: 900,
            renewal_ttl_secs: 86400,
            ..Settings::default()
        }
    }

    fn test_user() -> UserRecord {
        UserRecord {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            fullname: "Alice Example".to_string(),
            password_hash: "unused".to_string(),
            current_renewal_hash: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_access_token_round_trip() {
        let settings = test_settings();
        let issuer = TokenIssuer::from_settings(&settings);
        let verifier = TokenVerifier::from_settings(&settings);
        let user = test_user();

        let token = issuer.issue_access(&user).unwrap();
        let claims = verifier.verify_access(&token).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.email, "alice@example.com");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_renewal_token_round_trip() {
        let settings = test_settings();
        let issuer = TokenIssuer::from_settings(&settings);
        let verifier = TokenVerifier::from_settings(&settings);
        let id = Uuid::new_v4();

        let token = issuer.issue_renewal(id).unwrap();
        let claims = verifier.verify_renewal(&token).unwrap();

        assert_eq!(claims.sub, id);
        assert!(!claims.jti.is_empty());
    }

    #[test]
    fn test_secrets_are_not_interchangeable() {
        // An access token must not pass renewal verification and
        // vice versa: the two kinds are signed with different secrets.
        let settings = test_settings();
        let issuer = TokenIssuer::from_settings(&settings);
        let verifier = TokenVerifier::from_settings(&settings);
        let user = test_user();

        let access = issuer.issue_access(&user).unwrap();
        assert!(matches!(
            verifier.verify_renewal(&access),
            Err(AppError::TokenInvalid)
        ));

        let renewal = issuer.issue_renewal(user.id).unwrap();
        assert!(matches!(
            verifier.verify_access(&renewal),
            Err(AppError::TokenInvalid)
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let settings = test_settings();
        let issuer = TokenIssuer::from_settings(&settings);
        let user = test_user();
        let token = issuer.issue_access(&user).unwrap();

        let mut other = test_settings();
        other.access_token_secret = "a-completely-different-secret!!!!".to_string();
        let verifier = TokenVerifier::from_settings(&other);

        assert!(matches!(
            verifier.verify_access(&token),
            Err(AppError::TokenInvalid)
        ));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let settings = test_settings();
        let issuer = TokenIssuer::from_settings(&settings);
        let verifier = TokenVerifier::from_settings(&settings);
        let token = issuer.issue_access(&test_user()).unwrap();

        // Flip a character in the payload segment.
        let mut tampered: Vec<String> = token.split('.').map(str::to_string).collect();
        tampered[1] = format!("x{}", &tampered[1][1..]);
        let tampered = tampered.join(".");

        assert!(matches!(
            verifier.verify_access(&tampered),
            Err(AppError::TokenInvalid)
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let settings = test_settings();
        let verifier = TokenVerifier::from_settings(&settings);
        let now = Utc::now().timestamp();

        // Expired well past the verifier's leeway.
        let claims = AccessClaims {
            sub: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(settings.access_token_secret.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            verifier.verify_access(&token),
            Err(AppError::TokenExpired)
        ));
    }

    #[test]
    fn test_consecutive_renewal_tokens_differ() {
        let settings = test_settings();
        let issuer = TokenIssuer::from_settings(&settings);
        let id = Uuid::new_v4();

        // Same subject, same second: jti keeps the tokens distinct.
        let first = issuer.issue_renewal(id).unwrap();
        let second = issuer.issue_renewal(id).unwrap();
        assert_ne!(first, second);
        assert_ne!(token_fingerprint(&first), token_fingerprint(&second));
    }

    #[test]
    fn test_fingerprint_is_stable_and_discriminating() {
        assert_eq!(token_fingerprint("abc"), token_fingerprint("abc"));
        assert_ne!(token_fingerprint("abc"), token_fingerprint("abd"));
        assert!(fingerprint_eq(
            &token_fingerprint("abc"),
            &token_fingerprint("abc")
        ));
        assert!(!fingerprint_eq(
            &token_fingerprint("abc"),
            &token_fingerprint("abd")
        ));
    }
}
