//! Error types for Gatehouse
//!
//! All errors in the application are converted to `AppError`,
//! which implements `IntoResponse` for proper HTTP error responses.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::auth::token::TokenError;

/// Which unique index a store write collided with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Username,
    Email,
}

/// OAuth exchange errors
#[derive(Debug, Error)]
pub enum OAuthError {
    /// Provider responded without an access token field
    #[error("Failed to fetch access token from provider")]
    TokenExchangeFailed,

    /// Provider profile response is missing required fields
    #[error("Provider profile response is invalid: {0}")]
    ProfileInvalid(String),
}

/// Application-wide error type
///
/// This enum represents all possible errors that can occur
/// in the application. It implements `IntoResponse` to
/// automatically convert errors to appropriate HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found (404)
    #[error("Resource not found")]
    NotFound,

    /// Missing or unusable bearer credentials (401)
    #[error("Could not validate credentials")]
    Unauthorized,

    /// Token failed verification (401); the specific reason is
    /// never distinguished to the caller
    #[error("Could not validate credentials")]
    Token(#[from] TokenError),

    /// Username/password pair did not match a user (401)
    #[error("Incorrect username or password")]
    InvalidCredentials,

    /// Account exists but is disabled (400)
    #[error("Inactive user")]
    InactiveAccount,

    /// Registration username collision (400)
    #[error("Username already registered")]
    UsernameTaken,

    /// Registration email collision (400)
    #[error("Email already registered")]
    EmailTaken,

    /// Update request would not change anything (400)
    #[error("Cannot update {0} to the same value")]
    NoOpChange(&'static str),

    /// Store reported zero modified documents (400)
    #[error("Failed to update user")]
    UpdateFailed,

    /// Deletion target no longer exists (400)
    #[error("User not found")]
    AccountNotFound,

    /// Store-level uniqueness violation (400)
    #[error("Duplicate value for unique field")]
    Conflict(UniqueField),

    /// OAuth exchange error (400)
    #[error("{0}")]
    OAuth(#[from] OAuthError),

    /// Validation error (400)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error (500, fatal at startup)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database error (500)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// HTTP client error (502)
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Rate limit exceeded (429)
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl IntoResponse for AppError {
    /// Convert error to HTTP response
    ///
    /// Maps each error variant to the appropriate HTTP status code
    /// and JSON error body. 401 responses carry `WWW-Authenticate: Bearer`.
    fn into_response(self) -> Response {
        use axum::Json;

        let (status, error_message, error_type) = match &self {
            AppError::NotFound => (StatusCode::NOT_FOUND, self.to_string(), "not_found"),
            AppError::Unauthorized | AppError::Token(_) => {
                (StatusCode::UNAUTHORIZED, self.to_string(), "unauthorized")
            }
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                self.to_string(),
                "invalid_credentials",
            ),
            AppError::InactiveAccount => {
                (StatusCode::BAD_REQUEST, self.to_string(), "inactive_account")
            }
            AppError::UsernameTaken => {
                (StatusCode::BAD_REQUEST, self.to_string(), "username_taken")
            }
            AppError::EmailTaken => (StatusCode::BAD_REQUEST, self.to_string(), "email_taken"),
            AppError::NoOpChange(_) => (StatusCode::BAD_REQUEST, self.to_string(), "noop_change"),
            AppError::UpdateFailed => {
                (StatusCode::BAD_REQUEST, self.to_string(), "update_failed")
            }
            AppError::AccountNotFound => {
                (StatusCode::BAD_REQUEST, self.to_string(), "account_not_found")
            }
            AppError::Conflict(field) => {
                let message = match field {
                    UniqueField::Username => "Username already registered",
                    UniqueField::Email => "Email already registered",
                };
                (StatusCode::BAD_REQUEST, message.to_string(), "conflict")
            }
            AppError::OAuth(err) => (StatusCode::BAD_REQUEST, err.to_string(), "oauth"),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone(), "validation"),
            AppError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                self.to_string(),
                "rate_limited",
            ),
            AppError::HttpClient(_) => (StatusCode::BAD_GATEWAY, self.to_string(), "http_client"),
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
                "database",
            ),
            AppError::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone(), "config"),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                "internal",
            ),
        };

        // Record error metric
        use crate::metrics::ERRORS_TOTAL;
        ERRORS_TOTAL.with_label_values(&[error_type]).inc();

        let body = Json(serde_json::json!({
            "error": error_message,
        }));

        if status == StatusCode::UNAUTHORIZED {
            (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
