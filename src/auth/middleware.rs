//! Authentication middleware
//!
//! Protects routes that require authentication. The routing layer
//! invokes this guard before any handler runs; the resolved user is
//! a read-only snapshot carried in request extensions.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, State},
    http::{HeaderMap, Request, request::Parts},
    middleware::Next,
    response::Response,
};

use super::session;
use crate::AppState;
use crate::data::User;
use crate::error::AppError;

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(ToOwned::to_owned)
}

/// Middleware to require authentication
///
/// Extracts and verifies the bearer token from the Authorization
/// header, then re-checks the account against the store. Adds the
/// resolved `User` snapshot to request extensions.
///
/// # Usage
/// ```ignore
/// let protected_routes = Router::new()
///     .route("/api/v1/...", ...)
///     .layer(middleware::from_fn_with_state(state, require_auth));
/// ```
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(request.headers()).ok_or(AppError::Unauthorized)?;

    let user = session::resolve(&state.tokens, state.store.as_ref(), &token).await?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Extractor for the current authenticated user
///
/// Use in handlers to get the resolved user snapshot.
///
/// # Usage
/// ```ignore
/// async fn handler(
///     CurrentUser(user): CurrentUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {}", user.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    /// Extract the current user from request extensions, falling back
    /// to resolving the bearer token directly when the middleware has
    /// not already run for this route.
    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<User>().cloned() {
            return Ok(CurrentUser(user));
        }

        let state = AppState::from_ref(state);
        let token = extract_bearer_token(&parts.headers).ok_or(AppError::Unauthorized)?;
        let user = session::resolve(&state.tokens, state.store.as_ref(), &token).await?;
        parts.extensions.insert(user.clone());

        Ok(CurrentUser(user))
    }
}
