//! Request and response bodies

use serde::{Deserialize, Serialize};

use crate::data::User;

/// Public view of a user record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub username: String,
    pub email: String,
    pub disabled: bool,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            email: user.email.clone(),
            disabled: user.disabled,
        }
    }
}

/// Issued bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

/// Generic message body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Login form (username + password)
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Registration request body
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// OAuth callback query parameters
#[derive(Debug, Deserialize)]
pub struct OauthCallbackQuery {
    pub code: String,
}

/// Email update request body
#[derive(Debug, Deserialize)]
pub struct EmailUpdateRequest {
    pub email: String,
}

/// Password update request body
#[derive(Debug, Deserialize)]
pub struct PasswordUpdateRequest {
    pub password: String,
}

/// Record id of the authenticated user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserIdResponse {
    pub id: String,
}
