//! Session/identity resolution
//!
//! Recovers the current user from a bearer token or a username and
//! password pair. The disabled check runs on every resolution: a
//! valid-signature token for a since-disabled account is rejected.

use crate::auth::password::verify_password;
use crate::auth::token::TokenService;
use crate::data::{User, UserStore};
use crate::error::AppError;
use crate::metrics::AUTH_ATTEMPTS_TOTAL;

/// Resolve a bearer token to its active user.
///
/// # Errors
/// * token verification failures (generic 401 at the boundary)
/// * `InvalidCredentials` when the subject no longer exists
/// * `InactiveAccount` when the account is disabled
pub async fn resolve(
    tokens: &TokenService,
    store: &dyn UserStore,
    token: &str,
) -> Result<User, AppError> {
    let claims = tokens.verify(token)?;

    let user = store
        .find_by_username(&claims.sub)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if user.disabled {
        AUTH_ATTEMPTS_TOTAL
            .with_label_values(&["resolve", "inactive"])
            .inc();
        return Err(AppError::InactiveAccount);
    }

    Ok(user)
}

/// Check a username/password pair against the store.
///
/// Returns `None` for an unknown username, a wrong password, or an
/// account with no local password (OAuth-only accounts).
pub async fn authenticate(
    store: &dyn UserStore,
    username: &str,
    password: &str,
) -> Result<Option<User>, AppError> {
    let Some(user) = store.find_by_username(username).await? else {
        AUTH_ATTEMPTS_TOTAL
            .with_label_values(&["login", "unknown_user"])
            .inc();
        return Ok(None);
    };

    let Some(hashed) = user.hashed_password.as_deref() else {
        AUTH_ATTEMPTS_TOTAL
            .with_label_values(&["login", "no_password"])
            .inc();
        return Ok(None);
    };

    if !verify_password(password, hashed) {
        AUTH_ATTEMPTS_TOTAL
            .with_label_values(&["login", "bad_password"])
            .inc();
        return Ok(None);
    }

    AUTH_ATTEMPTS_TOTAL
        .with_label_values(&["login", "success"])
        .inc();
    Ok(Some(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::hash_password;
    use crate::config::AuthConfig;
    use crate::data::{MemoryUserStore, NewUser, UserPatch};

    fn test_tokens() -> TokenService {
        TokenService::new(&AuthConfig {
            secret: "test-secret-key-32-bytes-long!!!".to_string(),
            algorithm: "HS256".to_string(),
            access_token_ttl_minutes: 30,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        })
        .unwrap()
    }

    async fn store_with_alice() -> MemoryUserStore {
        let store = MemoryUserStore::new();
        let hashed = hash_password("secret-pw", 4).unwrap();
        store
            .create(NewUser::local(
                "alice".into(),
                "alice@example.com".into(),
                hashed,
            ))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn resolve_returns_active_user() {
        let tokens = test_tokens();
        let store = store_with_alice().await;
        let token = tokens.issue("alice").unwrap();

        let user = resolve(&tokens, &store, &token).await.unwrap();
        assert_eq!(user.username, "alice");
    }

    #[tokio::test]
    async fn resolve_rejects_unknown_subject() {
        let tokens = test_tokens();
        let store = MemoryUserStore::new();
        let token = tokens.issue("ghost").unwrap();

        let error = resolve(&tokens, &store, &token).await.unwrap_err();
        assert!(matches!(error, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn resolve_rejects_disabled_account_with_valid_token() {
        let tokens = test_tokens();
        let store = store_with_alice().await;
        let token = tokens.issue("alice").unwrap();

        store
            .update(
                "alice",
                UserPatch {
                    disabled: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let error = resolve(&tokens, &store, &token).await.unwrap_err();
        assert!(matches!(error, AppError::InactiveAccount));
    }

    #[tokio::test]
    async fn authenticate_checks_password() {
        let store = store_with_alice().await;

        let user = authenticate(&store, "alice", "secret-pw").await.unwrap();
        assert!(user.is_some());

        assert!(
            authenticate(&store, "alice", "wrong-pw")
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            authenticate(&store, "nobody", "secret-pw")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn authenticate_rejects_oauth_only_account() {
        let store = MemoryUserStore::new();
        store
            .create(NewUser::external(
                "octocat".into(),
                "octocat@example.com".into(),
                "583231".into(),
            ))
            .await
            .unwrap();

        assert!(
            authenticate(&store, "octocat", "anything")
                .await
                .unwrap()
                .is_none()
        );
    }
}
