//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub oauth: OauthConfig,
    pub cache: CacheConfig,
    pub rate_limit: RateLimitConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 8080)
    pub port: u16,
    /// Public domain (e.g., "auth.example.com")
    pub domain: String,
    /// Protocol ("http" or "https")
    pub protocol: String,
}

impl ServerConfig {
    /// Get the base URL for the instance
    ///
    /// # Returns
    /// Full URL like "https://auth.example.com"
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.protocol, self.domain)
    }
}

/// Database configuration (SQLite only)
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub path: PathBuf,
}

/// Token signing configuration
///
/// The signing secret and algorithm are required at startup;
/// `validate` rejects a process that cannot issue tokens.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Token signing secret (32+ bytes)
    pub secret: String,
    /// Signing algorithm: HS256, HS384 or HS512
    pub algorithm: String,
    /// Access token time-to-live in minutes
    pub access_token_ttl_minutes: i64,
    /// bcrypt cost factor for password hashing
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

const SUPPORTED_ALGORITHMS: &[&str] = &["HS256", "HS384", "HS512"];

/// Third-party login configuration, one section per provider
#[derive(Debug, Clone, Deserialize, Default)]
pub struct OauthConfig {
    #[serde(default)]
    pub github: ProviderConfig,
    #[serde(default)]
    pub microsoft: ProviderConfig,
    #[serde(default)]
    pub google: ProviderConfig,
}

/// Single OAuth provider configuration
///
/// Endpoint URLs default to the provider's public endpoints and only
/// need to be set for self-hosted deployments (or tests).
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProviderConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    pub authorize_url: Option<String>,
    pub token_url: Option<String>,
    pub profile_url: Option<String>,
}

/// Cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// TTL in seconds for the current-user read cache
    pub user_ttl_seconds: u64,
    /// Maximum entries in the current-user read cache
    pub user_max_entries: u64,
}

/// Per-route-group request quotas (sliding one-minute window)
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Requests per minute on /auth routes
    pub auth_per_minute: u32,
    /// Requests per minute on /api routes
    pub api_per_minute: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (GATEHOUSE_*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.domain", "localhost")?
            .set_default("server.protocol", "http")?
            .set_default("auth.algorithm", "HS256")?
            .set_default("auth.access_token_ttl_minutes", 30)?
            .set_default("cache.user_ttl_seconds", 60)?
            .set_default("cache.user_max_entries", 10_000)?
            .set_default("rate_limit.auth_per_minute", 60)?
            .set_default("rate_limit.api_per_minute", 300)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            // Load from config/default.toml if it exists
            .add_source(File::with_name("config/default").required(false))
            // Load from config/local.toml if it exists (overrides default)
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables (GATEHOUSE_*)
            .add_source(
                Environment::with_prefix("GATEHOUSE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    /// Fail-fast startup validation.
    ///
    /// A process with an unusable signing secret or algorithm must not
    /// start; the token service would fail on every request otherwise.
    pub fn validate(&self) -> Result<(), crate::error::AppError> {
        const MIN_SECRET_BYTES: usize = 32;

        if self.auth.secret.as_bytes().len() < MIN_SECRET_BYTES {
            return Err(crate::error::AppError::Config(format!(
                "auth.secret must be at least {} bytes",
                MIN_SECRET_BYTES
            )));
        }

        if !SUPPORTED_ALGORITHMS.contains(&self.auth.algorithm.as_str()) {
            return Err(crate::error::AppError::Config(format!(
                "auth.algorithm must be one of {}",
                SUPPORTED_ALGORITHMS.join(", ")
            )));
        }

        if self.auth.access_token_ttl_minutes <= 0 {
            return Err(crate::error::AppError::Config(
                "auth.access_token_ttl_minutes must be greater than 0".to_string(),
            ));
        }

        // bcrypt only accepts cost factors in this range
        const MIN_BCRYPT_COST: u32 = 4;
        const MAX_BCRYPT_COST: u32 = 31;
        if self.auth.bcrypt_cost < MIN_BCRYPT_COST || self.auth.bcrypt_cost > MAX_BCRYPT_COST {
            return Err(crate::error::AppError::Config(format!(
                "auth.bcrypt_cost must be between {} and {}",
                MIN_BCRYPT_COST, MAX_BCRYPT_COST
            )));
        }

        for (name, provider) in [
            ("github", &self.oauth.github),
            ("microsoft", &self.oauth.microsoft),
            ("google", &self.oauth.google),
        ] {
            if provider.enabled
                && (provider.client_id.trim().is_empty()
                    || provider.client_secret.trim().is_empty())
            {
                return Err(crate::error::AppError::Config(format!(
                    "oauth.{}.client_id and oauth.{}.client_secret are required when enabled",
                    name, name
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                domain: "localhost".to_string(),
                protocol: "http".to_string(),
            },
            database: DatabaseConfig {
                path: PathBuf::from("/tmp/gatehouse-test.db"),
            },
            auth: AuthConfig {
                secret: "x".repeat(32),
                algorithm: "HS256".to_string(),
                access_token_ttl_minutes: 30,
                bcrypt_cost: bcrypt::DEFAULT_COST,
            },
            oauth: OauthConfig {
                github: ProviderConfig {
                    enabled: true,
                    client_id: "github-client-id".to_string(),
                    client_secret: "github-client-secret".to_string(),
                    authorize_url: None,
                    token_url: None,
                    profile_url: None,
                },
                microsoft: ProviderConfig::default(),
                google: ProviderConfig::default(),
            },
            cache: CacheConfig {
                user_ttl_seconds: 60,
                user_max_entries: 10_000,
            },
            rate_limit: RateLimitConfig {
                auth_per_minute: 60,
                api_per_minute: 300,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }

    #[test]
    fn validate_accepts_valid_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_short_secret() {
        let mut config = valid_config();
        config.auth.secret = "short-secret".to_string();

        let error = config
            .validate()
            .expect_err("secret shorter than 32 bytes must fail");
        assert!(matches!(
            error,
            crate::error::AppError::Config(message)
                if message.contains("auth.secret")
        ));
    }

    #[test]
    fn validate_rejects_unknown_algorithm() {
        let mut config = valid_config();
        config.auth.algorithm = "RS256".to_string();

        let error = config
            .validate()
            .expect_err("unsupported algorithm must fail");
        assert!(matches!(
            error,
            crate::error::AppError::Config(message)
                if message.contains("auth.algorithm")
        ));
    }

    #[test]
    fn validate_rejects_non_positive_ttl() {
        let mut config = valid_config();
        config.auth.access_token_ttl_minutes = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_enabled_provider_without_credentials() {
        let mut config = valid_config();
        config.oauth.microsoft.enabled = true;

        let error = config
            .validate()
            .expect_err("enabled provider without credentials must fail");
        assert!(matches!(
            error,
            crate::error::AppError::Config(message)
                if message.contains("oauth.microsoft")
        ));
    }
}
