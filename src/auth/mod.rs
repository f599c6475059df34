//! Authentication core
//!
//! Handles:
//! - Password hashing and verification
//! - Signed bearer token issuance and verification
//! - Session/identity resolution with active-account enforcement
//! - Third-party OAuth login flow
//! - Authentication middleware

mod middleware;
pub mod oauth;
pub mod password;
pub mod session;
pub mod token;

pub use middleware::{CurrentUser, require_auth};
pub use oauth::{OauthProvider, OauthService};
pub use token::{TokenError, TokenService};
