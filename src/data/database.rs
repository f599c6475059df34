//! SQLite-backed user store
//!
//! All database access goes through this module.

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, QueryBuilder, Sqlite, SqlitePool};

use super::models::{EntityId, NewUser, User, UserPatch};
use super::store::UserStore;
use crate::error::{AppError, UniqueField};

/// Database connection pool wrapper implementing [`UserStore`].
pub struct SqliteUserStore {
    pool: Pool<Sqlite>,
}

/// Translate a backend unique-index violation into the store-level
/// conflict error, keyed to whichever index was hit.
fn map_unique_violation(error: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(ref db_error) = error {
        if db_error.is_unique_violation() {
            let message = db_error.message().to_string();
            let field = if message.contains("users.email") {
                UniqueField::Email
            } else {
                UniqueField::Username
            };
            return AppError::Conflict(field);
        }
    }
    AppError::Database(error)
}

impl SqliteUserStore {
    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Arguments
    /// * `path` - Path to SQLite database file
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let connection_string = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&connection_string).await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!("Database connected and migrated successfully");

        Ok(Self { pool })
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE external_id = ?")
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        let now = Utc::now();
        let record = User {
            id: EntityId::new().0,
            username: user.username,
            email: user.email,
            hashed_password: user.hashed_password,
            disabled: user.disabled,
            external_id: user.external_id,
            is_superuser: user.is_superuser,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO users (
                id, username, email, hashed_password, disabled,
                external_id, is_superuser, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.username)
        .bind(&record.email)
        .bind(&record.hashed_password)
        .bind(record.disabled)
        .bind(&record.external_id)
        .bind(record.is_superuser)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        Ok(record)
    }

    async fn update(&self, username: &str, patch: UserPatch) -> Result<bool, AppError> {
        if patch.is_empty() {
            return Ok(false);
        }

        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE users SET ");
        let mut fields = builder.separated(", ");
        if let Some(email) = &patch.email {
            fields.push("email = ").push_bind_unseparated(email);
        }
        if let Some(hashed_password) = &patch.hashed_password {
            fields
                .push("hashed_password = ")
                .push_bind_unseparated(hashed_password);
        }
        if let Some(disabled) = patch.disabled {
            fields.push("disabled = ").push_bind_unseparated(disabled);
        }
        fields
            .push("updated_at = ")
            .push_bind_unseparated(Utc::now());
        builder.push(" WHERE username = ").push_bind(username);

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(map_unique_violation)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, username: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE username = ?")
            .bind(username)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_test_store() -> (SqliteUserStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("store-test.db");
        let store = SqliteUserStore::connect(&db_path).await.unwrap();
        (store, temp_dir)
    }

    fn alice() -> NewUser {
        NewUser::local(
            "alice".to_string(),
            "alice@example.com".to_string(),
            "$2b$04$fakehash".to_string(),
        )
    }

    #[tokio::test]
    async fn create_and_find_roundtrip() {
        let (store, _temp_dir) = create_test_store().await;

        let created = store.create(alice()).await.unwrap();
        assert_eq!(created.username, "alice");
        assert!(!created.disabled);

        let by_username = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(by_username.id, created.id);

        let by_email = store
            .find_by_email("alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id, created.id);

        assert!(store.find_by_username("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_maps_unique_violations_to_conflict() {
        let (store, _temp_dir) = create_test_store().await;
        store.create(alice()).await.unwrap();

        let same_username = NewUser::local(
            "alice".to_string(),
            "other@example.com".to_string(),
            "$2b$04$fakehash".to_string(),
        );
        let error = store.create(same_username).await.unwrap_err();
        assert!(matches!(error, AppError::Conflict(UniqueField::Username)));

        let same_email = NewUser::local(
            "bob".to_string(),
            "alice@example.com".to_string(),
            "$2b$04$fakehash".to_string(),
        );
        let error = store.create(same_email).await.unwrap_err();
        assert!(matches!(error, AppError::Conflict(UniqueField::Email)));
    }

    #[tokio::test]
    async fn update_applies_patch_and_reports_no_match() {
        let (store, _temp_dir) = create_test_store().await;
        store.create(alice()).await.unwrap();

        let updated = store
            .update(
                "alice",
                UserPatch {
                    email: Some("new@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated);

        let user = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(user.email, "new@example.com");

        // Empty patch is a silent no-op
        let noop = store.update("alice", UserPatch::default()).await.unwrap();
        assert!(!noop);

        // Unknown username reports false, not an error
        let missing = store
            .update(
                "nobody",
                UserPatch {
                    disabled: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!missing);
    }

    #[tokio::test]
    async fn delete_reports_whether_record_existed() {
        let (store, _temp_dir) = create_test_store().await;
        store.create(alice()).await.unwrap();

        assert!(store.delete("alice").await.unwrap());
        assert!(!store.delete("alice").await.unwrap());
        assert!(store.find_by_username("alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn external_id_lookup_links_oauth_accounts() {
        let (store, _temp_dir) = create_test_store().await;

        let external = NewUser::external(
            "octocat".to_string(),
            "octocat@example.com".to_string(),
            "583231".to_string(),
        );
        let created = store.create(external).await.unwrap();
        assert!(created.hashed_password.is_none());

        let linked = store.find_by_external_id("583231").await.unwrap().unwrap();
        assert_eq!(linked.id, created.id);
        assert!(store.find_by_external_id("999999").await.unwrap().is_none());
    }
}
