//! Account lifecycle service
//!
//! Registration and self-service mutations. All writes go through the
//! injected store; the user read cache is invalidated synchronously on
//! every mutation so no request observes a stale snapshot after its
//! own write.

use std::sync::Arc;

use crate::auth::password::hash_password;
use crate::data::{NewUser, User, UserCache, UserPatch, UserStore};
use crate::error::{AppError, UniqueField};

/// Account lifecycle service
pub struct AccountService {
    store: Arc<dyn UserStore>,
    cache: Arc<UserCache>,
    bcrypt_cost: u32,
}

impl AccountService {
    /// Create new account service
    pub fn new(store: Arc<dyn UserStore>, cache: Arc<UserCache>, bcrypt_cost: u32) -> Self {
        Self {
            store,
            cache,
            bcrypt_cost,
        }
    }

    /// Register a local account.
    ///
    /// Username availability is checked before email availability, so
    /// a request conflicting on both reports the username. The store's
    /// unique indexes remain the hard guarantee when two registrations
    /// race past the checks.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AppError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::Validation("username cannot be empty".to_string()));
        }
        let email = email.trim();
        if email.is_empty() {
            return Err(AppError::Validation("email cannot be empty".to_string()));
        }

        if self.store.find_by_username(username).await?.is_some() {
            return Err(AppError::UsernameTaken);
        }
        if self.store.find_by_email(email).await?.is_some() {
            return Err(AppError::EmailTaken);
        }

        let hashed = hash_password(password, self.bcrypt_cost)?;

        let created = self
            .store
            .create(NewUser::local(
                username.to_string(),
                email.to_string(),
                hashed,
            ))
            .await
            .map_err(|e| match e {
                AppError::Conflict(UniqueField::Username) => AppError::UsernameTaken,
                AppError::Conflict(UniqueField::Email) => AppError::EmailTaken,
                other => other,
            })?;

        tracing::info!(username = %created.username, "Registered new account");
        Ok(created)
    }

    /// Read the profile for `username`, memoized in the user cache.
    ///
    /// Cache fills always come from a store read performed here, never
    /// from a snapshot resolved earlier in the request. A fill racing
    /// a mutation can therefore only shadow the record state at fill
    /// time, not a pre-mutation copy.
    pub async fn current_profile(&self, username: &str) -> Result<User, AppError> {
        if let Some(cached) = self.cache.get(username).await {
            return Ok(cached.as_ref().clone());
        }

        let user = self
            .store
            .find_by_username(username)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        self.cache.insert(user.clone()).await;
        Ok(user)
    }

    /// Change the account email address.
    ///
    /// Submitting the current address is reported as a no-op before
    /// the store is touched.
    pub async fn change_email(&self, user: &User, new_email: &str) -> Result<(), AppError> {
        let new_email = new_email.trim();
        if new_email.is_empty() {
            return Err(AppError::Validation("email cannot be empty".to_string()));
        }
        if new_email == user.email {
            return Err(AppError::NoOpChange("email"));
        }

        let updated = self
            .store
            .update(
                &user.username,
                UserPatch {
                    email: Some(new_email.to_string()),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| match e {
                AppError::Conflict(_) => AppError::EmailTaken,
                other => other,
            })?;
        if !updated {
            return Err(AppError::UpdateFailed);
        }

        self.cache.invalidate(&user.username).await;
        Ok(())
    }

    /// Change the account password.
    ///
    /// Only the hash is persisted, so there is no same-value check;
    /// the new password is always hashed and written.
    pub async fn change_password(&self, user: &User, new_password: &str) -> Result<(), AppError> {
        let hashed = hash_password(new_password, self.bcrypt_cost)?;

        let updated = self
            .store
            .update(
                &user.username,
                UserPatch {
                    hashed_password: Some(hashed),
                    ..Default::default()
                },
            )
            .await?;
        if !updated {
            return Err(AppError::UpdateFailed);
        }

        self.cache.invalidate(&user.username).await;
        Ok(())
    }

    /// Hard-delete the account.
    pub async fn delete(&self, user: &User) -> Result<(), AppError> {
        let deleted = self.store.delete(&user.username).await?;
        if !deleted {
            return Err(AppError::AccountNotFound);
        }

        self.cache.invalidate(&user.username).await;
        tracing::info!(username = %user.username, "Deleted account");
        Ok(())
    }
}
