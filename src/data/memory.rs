//! In-memory user store
//!
//! Test double for [`UserStore`] with the same uniqueness semantics
//! as the SQLite backend. Also useful for ephemeral deployments.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::models::{EntityId, NewUser, User, UserPatch};
use super::store::UserStore;
use crate::error::{AppError, UniqueField};

/// Volatile user store keyed by username.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.read().await.get(username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.external_id.as_deref() == Some(external_id))
            .cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        let mut users = self.users.write().await;

        // Username index first, then email, matching the error a
        // dual-conflict insert observes against the SQLite backend.
        if users.contains_key(&user.username) {
            return Err(AppError::Conflict(UniqueField::Username));
        }
        if users.values().any(|existing| existing.email == user.email) {
            return Err(AppError::Conflict(UniqueField::Email));
        }

        let now = Utc::now();
        let record = User {
            id: EntityId::new().0,
            username: user.username.clone(),
            email: user.email,
            hashed_password: user.hashed_password,
            disabled: user.disabled,
            external_id: user.external_id,
            is_superuser: user.is_superuser,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.username, record.clone());

        Ok(record)
    }

    async fn update(&self, username: &str, patch: UserPatch) -> Result<bool, AppError> {
        if patch.is_empty() {
            return Ok(false);
        }

        let mut users = self.users.write().await;

        if let Some(email) = &patch.email {
            let taken = users
                .values()
                .any(|other| other.username != username && &other.email == email);
            if taken {
                return Err(AppError::Conflict(UniqueField::Email));
            }
        }

        let Some(user) = users.get_mut(username) else {
            return Ok(false);
        };

        if let Some(email) = patch.email {
            user.email = email;
        }
        if let Some(hashed_password) = patch.hashed_password {
            user.hashed_password = Some(hashed_password);
        }
        if let Some(disabled) = patch.disabled {
            user.disabled = disabled;
        }
        user.updated_at = Utc::now();

        Ok(true)
    }

    async fn delete(&self, username: &str) -> Result<bool, AppError> {
        Ok(self.users.write().await.remove(username).is_some())
    }
}
