//! Authenticated user endpoints
//!
//! Everything here runs behind the auth middleware; handlers receive
//! the resolved user snapshot through the `CurrentUser` extractor.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, put},
};

use crate::AppState;
use crate::api::dto::{
    EmailUpdateRequest, MessageResponse, PasswordUpdateRequest, UserIdResponse, UserResponse,
};
use crate::auth::CurrentUser;
use crate::error::AppError;

/// `GET /api/v1/users/me`
///
/// The response is memoized in the user cache. The cache only ever
/// shortcuts this read; authorization already happened in the
/// middleware against the live store.
async fn read_users_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<UserResponse>, AppError> {
    let profile = state.accounts.current_profile(&user.username).await?;

    Ok(Json(UserResponse::from(&profile)))
}

/// `GET /api/v1/users/me/id`
async fn read_users_me_id(CurrentUser(user): CurrentUser) -> Json<UserIdResponse> {
    Json(UserIdResponse { id: user.id })
}

/// `GET /api/v1/welcome/{username}`
///
/// Greets the authenticated caller; the path segment is decorative.
async fn welcome(
    Path(_username): Path<String>,
    CurrentUser(user): CurrentUser,
) -> Json<MessageResponse> {
    Json(MessageResponse::new(format!("Welcome {}!", user.username)))
}

/// `PUT /api/v1/users/me/email`
async fn update_email(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<EmailUpdateRequest>,
) -> Result<Json<UserResponse>, AppError> {
    state.accounts.change_email(&user, &body.email).await?;

    Ok(Json(UserResponse {
        username: user.username,
        email: body.email.trim().to_string(),
        disabled: false,
    }))
}

/// `PUT /api/v1/users/me/password`
async fn update_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<PasswordUpdateRequest>,
) -> Result<Json<UserResponse>, AppError> {
    state.accounts.change_password(&user, &body.password).await?;

    Ok(Json(UserResponse::from(&user)))
}

/// `DELETE /api/v1/users/me`
async fn delete_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<MessageResponse>, AppError> {
    state.accounts.delete(&user).await?;

    Ok(Json(MessageResponse::new("User deleted successfully")))
}

/// Create the authenticated user API router (mounted under `/api/v1`)
///
/// The auth middleware is layered on by the top-level router
/// composition.
pub fn user_api_router() -> Router<AppState> {
    Router::new()
        .route("/users/me", get(read_users_me).delete(delete_me))
        .route("/users/me/id", get(read_users_me_id))
        .route("/users/me/email", put(update_email))
        .route("/users/me/password", put(update_password))
        .route("/welcome/:username", get(welcome))
}
