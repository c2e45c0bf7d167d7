// ============================
// crates/backend-lib/src/store.rs
// ============================
//! Credential store abstraction with an in-memory implementation.
//!
//! The store holds the durable identity records: the salted password
//! hash and the fingerprint of the currently valid renewal token. The
//! compare-and-swap write on that fingerprint is what serializes
//! concurrent renewal attempts (exactly one rotation wins).
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;
use vidstream_common::UserProfile;

use crate::error::AppError;
use crate::validation::normalize_identifier;

/// Durable identity record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: Uuid,
    /// Unique, stored case-normalized and trimmed
    pub username: String,
    /// Unique, stored case-normalized and trimmed
    pub email: String,
    pub fullname: String,
    /// scrypt PHC string; never the plaintext
    pub password_hash: String,
    /// SHA-256 fingerprint of the active renewal token, if any.
    /// `None` means no active session chain.
    pub current_renewal_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// Public view, safe to put on the wire.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            fullname: self.fullname.clone(),
            created_at: self.created_at,
        }
    }
}

/// Input for creating a record. Username and email must already be
/// normalized; the password must already be hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub fullname: String,
    pub password_hash: String,
}

/// Outcome of a compare-and-swap write on the renewal fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapOutcome {
    /// The stored value matched `expected` and was replaced
    Swapped,
    /// The stored value had already moved on; nothing was written
    Conflict,
}

/// Trait for credential store backends
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create a record; fails with `DuplicateIdentity` when the
    /// username or email is already taken (case-insensitively).
    async fn create(&self, new_user: NewUser) -> Result<UserRecord, AppError>;

    /// Look up by username or email, case-insensitively.
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<UserRecord>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, AppError>;

    /// Compare-and-swap the renewal fingerprint: writes `new` only if
    /// the stored value still equals `expected` at write time.
    async fn swap_renewal_hash(
        &self,
        id: Uuid,
        expected: Option<&str>,
        new: Option<String>,
    ) -> Result<SwapOutcome, AppError>;

    /// Unconditionally empty the renewal fingerprint (logout).
    async fn clear_renewal_hash(&self, id: Uuid) -> Result<(), AppError>;
}

/// In-memory implementation of the `UserStore` trait
#[derive(Clone, Default)]
pub struct MemoryUserStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, UserRecord>,
    by_username: HashMap<String, Uuid>,
    by_email: HashMap<String, Uuid>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, new_user: NewUser) -> Result<UserRecord, AppError> {
        let mut inner = self.inner.write().await;

        // Uniqueness is checked and the indexes written under one
        // guard, so two racing registrations cannot both succeed.
        if inner.by_username.contains_key(&new_user.username) {
            return Err(AppError::DuplicateIdentity("username".to_string()));
        }
        if inner.by_email.contains_key(&new_user.email) {
            return Err(AppError::DuplicateIdentity("email".to_string()));
        }

        let now = Utc::now();
        let record = UserRecord {
            id: Uuid::new_v4(),
            username: new_user.username,
            email: new_user.email,
            fullname: new_user.fullname,
            password_hash: new_user.password_hash,
            current_renewal_hash: None,
            created_at: now,
            updated_at: now,
        };

        inner.by_username.insert(record.username.clone(), record.id);
        inner.by_email.insert(record.email.clone(), record.id);
        inner.users.insert(record.id, record.clone());

        Ok(record)
    }

    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<UserRecord>, AppError> {
        let identifier = normalize_identifier(identifier);
        let inner = self.inner.read().await;
        let id = inner
            .by_username
            .get(&identifier)
            .or_else(|| inner.by_email.get(&identifier));
        Ok(id.and_then(|id| inner.users.get(id)).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(&id).cloned())
    }

    async fn swap_renewal_hash(
        &self,
        id: Uuid,
        expected: Option<&str>,
        new: Option<String>,
    ) -> Result<SwapOutcome, AppError> {
        let mut inner = self.inner.write().await;
        let record = inner
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("user {id}")))?;

        if record.current_renewal_hash.as_deref() != expected {
            return Ok(SwapOutcome::Conflict);
        }

        record.current_renewal_hash = new;
        record.updated_at = Utc::now();
        Ok(SwapOutcome::Swapped)
    }

    async fn clear_renewal_hash(&self, id: Uuid) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        let record = inner
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("user {id}")))?;
        record.current_renewal_hash = None;
        record.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> NewUser {
        NewUser {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            fullname: "Alice Example".to_string(),
            password_hash: "phc-string".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let store = MemoryUserStore::new();
        let record = store.create(alice()).await.unwrap();
        assert!(record.current_renewal_hash.is_none());

        let by_username = store.find_by_identifier("alice").await.unwrap().unwrap();
        assert_eq!(by_username.id, record.id);

        let by_email = store
            .find_by_identifier("alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id, record.id);

        // Lookups normalize case and whitespace.
        let shouty = store.find_by_identifier("  ALICE ").await.unwrap().unwrap();
        assert_eq!(shouty.id, record.id);

        assert!(store.find_by_identifier("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_identity_rejected() {
        let store = MemoryUserStore::new();
        store.create(alice()).await.unwrap();

        let same_username = NewUser {
            email: "other@example.com".to_string(),
            ..alice()
        };
        assert!(matches!(
            store.create(same_username).await,
            Err(AppError::DuplicateIdentity(field)) if field == "username"
        ));

        let same_email = NewUser {
            username: "alice2".to_string(),
            ..alice()
        };
        assert!(matches!(
            store.create(same_email).await,
            Err(AppError::DuplicateIdentity(field)) if field == "email"
        ));
    }

    #[tokio::test]
    async fn test_swap_renewal_hash_cas() {
        let store = MemoryUserStore::new();
        let record = store.create(alice()).await.unwrap();

        // None -> Some(first) succeeds.
        let outcome = store
            .swap_renewal_hash(record.id, None, Some("first".to_string()))
            .await
            .unwrap();
        assert_eq!(outcome, SwapOutcome::Swapped);

        // A stale expectation loses.
        let outcome = store
            .swap_renewal_hash(record.id, None, Some("second".to_string()))
            .await
            .unwrap();
        assert_eq!(outcome, SwapOutcome::Conflict);

        // The current value wins.
        let outcome = store
            .swap_renewal_hash(record.id, Some("first"), Some("second".to_string()))
            .await
            .unwrap();
        assert_eq!(outcome, SwapOutcome::Swapped);

        let stored = store.find_by_id(record.id).await.unwrap().unwrap();
        assert_eq!(stored.current_renewal_hash.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_clear_renewal_hash() {
        let store = MemoryUserStore::new();
        let record = store.create(alice()).await.unwrap();
        store
            .swap_renewal_hash(record.id, None, Some("fp".to_string()))
            .await
            .unwrap();

        store.clear_renewal_hash(record.id).await.unwrap();
        let stored = store.find_by_id(record.id).await.unwrap().unwrap();
        assert!(stored.current_renewal_hash.is_none());

        // CAS against the cleared field with the old value must lose.
        let outcome = store
            .swap_renewal_hash(record.id, Some("fp"), Some("new".to_string()))
            .await
            .unwrap();
        assert_eq!(outcome, SwapOutcome::Conflict);
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let store = MemoryUserStore::new();
        assert!(matches!(
            store.clear_renewal_hash(Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }
}
