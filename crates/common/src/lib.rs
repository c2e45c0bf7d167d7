// ================
// common/src/lib.rs
// ================
//! Shared wire types for the `vidstream` identity backend.
//! Request and response bodies exchanged between clients and the HTTP API.
//! Field names are camelCase on the wire, matching the original API contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body of `POST /api/v1/users/register`.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Desired username, unique across all identities
    pub username: String,
    /// Email address, unique across all identities
    pub email: String,
    /// Display name
    pub fullname: String,
    /// Plaintext password; hashed server-side, never stored
    pub password: String,
}

/// Body of `POST /api/v1/users/login`.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Username or email address
    pub identifier: String,
    /// Plaintext password
    pub password: String,
}

/// Body of `POST /api/v1/users/refresh-token`.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RenewRequest {
    /// The long-lived renewal token issued at login or last rotation
    pub renewal_token: String,
}

/// Public view of an identity record. Never carries hashes.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub fullname: String,
    pub created_at: DateTime<Utc>,
}

/// Successful login or renewal: the profile plus a fresh token pair.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: UserProfile,
    /// Short-lived, stateless access token
    pub access_token: String,
    /// Long-lived renewal token; exactly one valid instance per identity
    pub renewal_token: String,
}

/// Identity as seen by a protected route, decoded from access-token
/// claims without a store round-trip.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

/// Plain acknowledgement body (logout etc).
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MessageResponse {
    pub message: String,
}
