//! Gatehouse - a user-account and authentication backend
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      API Layer (Axum)                        │
//! │  - Login / registration / OAuth endpoints                   │
//! │  - Authenticated user endpoints                             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Service Layer                            │
//! │  - Account lifecycle                                        │
//! │  - Token issue/verify, session resolution                   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Data Layer                              │
//! │  - UserStore trait (SQLite via sqlx)                        │
//! │  - Moka read cache                                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: HTTP handlers
//! - `auth`: passwords, tokens, sessions, OAuth, middleware
//! - `service`: account lifecycle logic
//! - `data`: user store and cache
//! - `rate_limit`: sliding-window request limiter
//! - `config`: configuration management
//! - `error`: error types

pub mod api;
pub mod auth;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod rate_limit;
pub mod service;

use std::sync::Arc;

use rate_limit::RateLimiter;

/// Application state shared across all handlers
///
/// This struct is cloned for each request and contains shared
/// resources like the user store, token service, and caches.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// User store (SQLite-backed in production)
    pub store: Arc<dyn data::UserStore>,

    /// Bearer token issue/verify
    pub tokens: Arc<auth::TokenService>,

    /// OAuth provider flows
    pub oauth: Arc<auth::OauthService>,

    /// Read-through cache of user snapshots
    pub user_cache: Arc<data::UserCache>,

    /// Account lifecycle service
    pub accounts: Arc<service::AccountService>,

    /// Limiter for the /auth route group
    pub auth_limiter: Arc<RateLimiter>,

    /// Limiter for the /api route group
    pub api_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Steps
    /// 1. Connect the SQLite-backed user store (runs migrations)
    /// 2. Construct the token service (fail-fast on bad auth config)
    /// 3. Build the outbound HTTP client and OAuth flows
    /// 4. Initialize caches, services, and limiters
    ///
    /// # Errors
    /// Returns error if any initialization step fails
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        let store = data::SqliteUserStore::connect(&config.database.path).await?;
        tracing::info!("Database connected");

        let tokens = auth::TokenService::new(&config.auth)?;

        let http_client = reqwest::Client::builder()
            .user_agent("Gatehouse/0.1.0")
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| error::AppError::Internal(e.into()))?;
        let oauth = auth::OauthService::from_config(&config.oauth, http_client);

        let user_cache = Arc::new(data::UserCache::new(
            config.cache.user_ttl_seconds,
            config.cache.user_max_entries,
        ));

        let store: Arc<dyn data::UserStore> = Arc::new(store);
        let accounts = service::AccountService::new(
            store.clone(),
            user_cache.clone(),
            config.auth.bcrypt_cost,
        );

        let auth_limiter = RateLimiter::per_minute("auth", config.rate_limit.auth_per_minute);
        let api_limiter = RateLimiter::per_minute("api", config.rate_limit.api_per_minute);

        tracing::info!("Application state initialized successfully");

        Ok(Self {
            config: Arc::new(config),
            store,
            tokens: Arc::new(tokens),
            oauth: Arc::new(oauth),
            user_cache,
            accounts: Arc::new(accounts),
            auth_limiter: Arc::new(auth_limiter),
            api_limiter: Arc::new(api_limiter),
        })
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::Router;
    use tower_http::{compression::CompressionLayer, trace::TraceLayer};

    let cors_layer = build_cors_layer(&state.config.server);

    let auth_limiter = state.auth_limiter.clone();
    let auth_routes = api::auth_router().layer(axum::middleware::from_fn(
        move |req: axum::extract::Request, next: axum::middleware::Next| {
            let limiter = auth_limiter.clone();
            async move { rate_limit::enforce(limiter, req, next).await }
        },
    ));

    let api_limiter = state.api_limiter.clone();
    let user_routes = api::user_api_router()
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ))
        .layer(axum::middleware::from_fn(
            move |req: axum::extract::Request, next: axum::middleware::Next| {
                let limiter = api_limiter.clone();
                async move { rate_limit::enforce(limiter, req, next).await }
            },
        ));

    Router::new()
        .nest("/auth", auth_routes)
        .nest("/api/v1", user_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
        .merge(api::health_router())
        .merge(api::metrics_router())
}

fn build_cors_layer(server: &config::ServerConfig) -> tower_http::cors::CorsLayer {
    use axum::http::HeaderValue;
    use tower_http::cors::{Any, CorsLayer};

    if !server.protocol.eq_ignore_ascii_case("https") {
        return CorsLayer::permissive();
    }

    let allowed_origin = server.base_url();
    match HeaderValue::from_str(&allowed_origin) {
        Ok(origin) => CorsLayer::new()
            .allow_origin([origin])
            .allow_methods(Any)
            .allow_headers(Any),
        Err(error) => {
            tracing::error!(
                %error,
                origin = %allowed_origin,
                "Failed to parse CORS origin from server base URL; denying cross-origin requests"
            );
            CorsLayer::new().allow_methods(Any).allow_headers(Any)
        }
    }
}
