//! API layer
//!
//! HTTP handlers for:
//! - Authentication (login, registration, OAuth)
//! - User self-service endpoints
//! - Health / about
//! - Metrics (Prometheus)

mod auth;
mod dto;
mod health;
pub mod metrics;
mod users;

pub use dto::*;

pub use auth::auth_router;
pub use health::health_router;
pub use metrics::metrics_router;
pub use users::user_api_router;
