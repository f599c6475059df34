//! Bearer token service
//!
//! Issues and verifies signed, time-limited JWTs carrying the subject
//! username (`sub`) and expiry (`exp`, Unix epoch seconds).
//!
//! The signing secret and algorithm are process-wide configuration,
//! validated once at construction. Expiry comparison uses wall-clock
//! time at verification; clock skew is not compensated.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AuthConfig;
use crate::error::AppError;

/// Token verification failures.
///
/// The boundary layer collapses every variant into one generic 401 so
/// callers learn nothing about verification internals.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// Structurally invalid token
    #[error("malformed token")]
    Malformed,
    /// Token is past its expiry claim
    #[error("token expired")]
    Expired,
    /// Signature does not match
    #[error("bad token signature")]
    BadSignature,
}

/// Claims carried in every issued token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject identity (username)
    pub sub: String,
    /// Expiry, Unix epoch seconds
    pub exp: i64,
}

/// Signed-token issue/verify service.
///
/// Pure and stateless after construction; cheap to share behind an Arc.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    ttl: Duration,
}

impl TokenService {
    /// Build the service from startup configuration.
    ///
    /// Fails fast with a configuration error on an unusable secret or
    /// algorithm so a broken process never starts serving.
    pub fn new(auth: &AuthConfig) -> Result<Self, AppError> {
        if auth.secret.is_empty() {
            return Err(AppError::Config("auth.secret is not set".to_string()));
        }

        let algorithm = match auth.algorithm.as_str() {
            "HS256" => Algorithm::HS256,
            "HS384" => Algorithm::HS384,
            "HS512" => Algorithm::HS512,
            other => {
                return Err(AppError::Config(format!(
                    "unsupported auth.algorithm: {other}"
                )));
            }
        };

        if auth.access_token_ttl_minutes <= 0 {
            return Err(AppError::Config(
                "auth.access_token_ttl_minutes must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(auth.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(auth.secret.as_bytes()),
            algorithm,
            ttl: Duration::minutes(auth.access_token_ttl_minutes),
        })
    }

    /// Issue a token for `subject` with the configured TTL.
    pub fn issue(&self, subject: &str) -> Result<String, AppError> {
        self.issue_with_ttl(subject, self.ttl)
    }

    /// Issue a token for `subject` expiring `ttl` from now.
    pub fn issue_with_ttl(&self, subject: &str, ttl: Duration) -> Result<String, AppError> {
        let claims = Claims {
            sub: subject.to_string(),
            exp: (Utc::now() + ttl).timestamp(),
        };

        jsonwebtoken::encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(e.into()))
    }

    /// Verify a token and return its claims.
    ///
    /// # Errors
    /// * `TokenError::Malformed` - not a structurally valid token
    /// * `TokenError::Expired` - past the `exp` claim (zero leeway)
    /// * `TokenError::BadSignature` - signature mismatch
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;

        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|error| {
                use jsonwebtoken::errors::ErrorKind;
                match error.kind() {
                    ErrorKind::ExpiredSignature => TokenError::Expired,
                    ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                        TokenError::BadSignature
                    }
                    _ => TokenError::Malformed,
                }
            })?;

        // `exp == now` counts as expired: a zero-TTL token is never valid.
        if data.claims.exp <= Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(data.claims)
    }
}
