//! Authentication endpoints
//!
//! Password login, registration, and the OAuth redirect/callback pair.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};

use crate::AppState;
use crate::api::dto::{
    LoginForm, OauthCallbackQuery, RegisterRequest, TokenResponse, UserResponse,
};
use crate::auth::{OauthProvider, session};
use crate::error::AppError;
use crate::metrics::TOKENS_ISSUED_TOTAL;

/// `POST /auth/token`
///
/// Password login. Returns a bearer token, or a generic 401 for any
/// credential failure.
async fn login(
    State(state): State<AppState>,
    axum::Form(form): axum::Form<LoginForm>,
) -> Result<Json<TokenResponse>, AppError> {
    let user = session::authenticate(state.store.as_ref(), &form.username, &form.password)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let token = state.tokens.issue(&user.username)?;
    TOKENS_ISSUED_TOTAL.with_label_values(&["password"]).inc();

    Ok(Json(TokenResponse::bearer(token)))
}

/// `POST /auth/register`
async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state
        .accounts
        .register(&body.username, &body.email, &body.password)
        .await?;

    Ok(Json(UserResponse::from(&user)))
}

/// `GET /auth/{provider}/login`
///
/// Sends a 302 to the provider's authorization page. Unknown or
/// disabled providers are a 404.
async fn oauth_login(
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> Result<Response, AppError> {
    let provider = OauthProvider::parse(&provider).ok_or(AppError::NotFound)?;
    let url = state.oauth.authorize_redirect_url(provider)?;

    let location = HeaderValue::from_str(&url)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("unusable redirect URL: {e}")))?;

    // 302 Found, not 307: callers are expected to re-request with GET
    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}

/// `GET /auth/{provider}/callback?code=...`
///
/// Terminates the authorization-code flow and returns a local bearer
/// token.
async fn oauth_callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(query): Query<OauthCallbackQuery>,
) -> Result<Json<TokenResponse>, AppError> {
    let provider = OauthProvider::parse(&provider).ok_or(AppError::NotFound)?;

    let (token, _user) = state
        .oauth
        .login(provider, &query.code, state.store.as_ref(), &state.tokens)
        .await?;

    Ok(Json(TokenResponse::bearer(token)))
}

/// Create the authentication router (mounted under `/auth`)
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/token", post(login))
        .route("/register", post(register))
        .route("/:provider/login", get(oauth_login))
        .route("/:provider/callback", get(oauth_callback))
}
