//! User store contract
//!
//! The narrow persistence interface the authentication core depends
//! on. The backend behind it is opaque; implementations must only
//! honor the uniqueness and no-op semantics documented per method.

use async_trait::async_trait;

use super::models::{NewUser, User, UserPatch};
use crate::error::AppError;

/// Persistence adapter for user records
///
/// Constructed once at startup and injected into every component that
/// needs it, which also makes it swappable for a test double.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<User>, AppError>;

    /// Insert a new record.
    ///
    /// A backend unique-index violation on `username` or `email`
    /// surfaces as [`AppError::Conflict`]; callers pre-check but the
    /// index is the only hard guarantee under concurrent writes.
    async fn create(&self, user: NewUser) -> Result<User, AppError>;

    /// Apply a partial update by username.
    ///
    /// Returns `false` (not an error) when the patch is empty or the
    /// backend reports zero matched documents.
    async fn update(&self, username: &str, patch: UserPatch) -> Result<bool, AppError>;

    /// Hard-delete a record by username.
    ///
    /// Returns `false` when no matching record existed.
    async fn delete(&self, username: &str) -> Result<bool, AppError>;
}
