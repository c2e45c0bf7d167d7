use async_trait::async_trait;
use uuid::Uuid;

use crate::auth::token::AccessClaims;
use crate::error::AppError;
use crate::store::UserRecord;

/// New identity input. Carries the plaintext password; hashing happens
/// inside the service, never before.
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub username: String,
    pub email: String,
    pub fullname: String,
    pub password: String,
}

/// Token pair handed back after a successful login or renewal.
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub user: UserRecord,
    pub access_token: String,
    pub renewal_token: String,
}

#[async_trait]
pub trait AuthService: Send + Sync {
    async fn register(&self, identity: NewIdentity) -> Result<UserRecord, AppError>;
    async fn login(&self, identifier: &str, password: &str) -> Result<IssuedTokens, AppError>;
    async fn renew(&self, renewal_token: &str) -> Result<IssuedTokens, AppError>;
    async fn logout(&self, id: Uuid) -> Result<(), AppError>;
    fn verify_access(&self, token: &str) -> Result<AccessClaims, AppError>;
}
