//! Data models
//!
//! Rust structs representing persisted user records.
//! Record IDs are ULIDs and timestamps use chrono.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Entity ID wrapper (ULID format, 26 characters)
///
/// Example: "01ARZ3NDEKTSV4RRFFQ69G5FAV"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new ULID
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

/// A persisted user account
///
/// `username` and `email` are unique across all records. Accounts
/// created through an OAuth provider have no password hash and carry
/// the provider's identifier in `external_id`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    /// bcrypt hash; None for accounts created via OAuth login
    pub hashed_password: Option<String>,
    /// Disabled accounts cannot obtain a session
    pub disabled: bool,
    /// Identity provider's own user identifier (account linking)
    pub external_id: Option<String>,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating a new user record
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub hashed_password: Option<String>,
    pub disabled: bool,
    pub external_id: Option<String>,
    pub is_superuser: bool,
}

impl NewUser {
    /// A locally registered user with a password hash
    pub fn local(username: String, email: String, hashed_password: String) -> Self {
        Self {
            username,
            email,
            hashed_password: Some(hashed_password),
            disabled: false,
            external_id: None,
            is_superuser: false,
        }
    }

    /// A user created by first OAuth login; no local password
    pub fn external(username: String, email: String, external_id: String) -> Self {
        Self {
            username,
            email,
            hashed_password: None,
            disabled: false,
            external_id: Some(external_id),
            is_superuser: false,
        }
    }
}

/// Partial update applied to an existing user record
///
/// An all-`None` patch is a silent no-op at the store level.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub email: Option<String>,
    pub hashed_password: Option<String>,
    pub disabled: Option<bool>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.hashed_password.is_none() && self.disabled.is_none()
    }
}
