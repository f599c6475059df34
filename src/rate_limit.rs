//! Request rate limiting
//!
//! Sliding-window limiter keyed by client address, mounted as
//! middleware with a per-route-group quota. The map is bounded: when
//! the key cap is reached, expired windows are pruned and, failing
//! that, the oldest window is evicted.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::Request;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use tokio::sync::RwLock;

use crate::error::AppError;
use crate::metrics::RATE_LIMITED_TOTAL;

const DEFAULT_MAX_TRACKED_KEYS: usize = 10_000;

/// Rate limiter entry
#[derive(Debug, Clone)]
struct RateLimitEntry {
    /// Number of requests in current window
    count: u32,
    /// Window start time
    window_start: Instant,
}

impl RateLimitEntry {
    fn is_new_window(&self, window_duration: Duration) -> bool {
        self.window_start.elapsed() >= window_duration
    }

    fn increment(&mut self, window_duration: Duration) {
        if self.is_new_window(window_duration) {
            self.count = 1;
            self.window_start = Instant::now();
        } else {
            self.count += 1;
        }
    }
}

/// Sliding-window rate limiter, one entry per client key.
pub struct RateLimiter {
    entries: Arc<RwLock<HashMap<String, RateLimitEntry>>>,
    /// Maximum requests per window
    max_requests: u32,
    /// Window duration
    window_duration: Duration,
    /// Maximum number of tracked keys in memory
    max_tracked_keys: usize,
    /// Route-group name used in logs and metrics
    group: &'static str,
}

impl RateLimiter {
    /// Create a limiter allowing `max_requests` per minute.
    pub fn per_minute(group: &'static str, max_requests: u32) -> Self {
        Self::with_max_tracked_keys(
            group,
            max_requests,
            Duration::from_secs(60),
            DEFAULT_MAX_TRACKED_KEYS,
        )
    }

    /// Create a limiter with an explicit window and in-memory key cap.
    pub fn with_max_tracked_keys(
        group: &'static str,
        max_requests: u32,
        window_duration: Duration,
        max_tracked_keys: usize,
    ) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            max_requests,
            window_duration,
            max_tracked_keys: max_tracked_keys.max(1),
            group,
        }
    }

    fn prune_expired_locked(
        entries: &mut HashMap<String, RateLimitEntry>,
        window_duration: Duration,
    ) -> usize {
        let before = entries.len();
        entries.retain(|_, value| !value.is_new_window(window_duration));
        before - entries.len()
    }

    fn evict_oldest_locked(entries: &mut HashMap<String, RateLimitEntry>) -> bool {
        let Some(oldest_key) = entries
            .iter()
            .min_by_key(|(_, value)| value.window_start)
            .map(|(key, _)| key.clone())
        else {
            return false;
        };
        entries.remove(&oldest_key);
        true
    }

    /// Check if a request should be allowed
    ///
    /// # Returns
    /// Ok if allowed, Err if rate limited
    pub async fn check_and_increment(&self, key: &str) -> Result<(), AppError> {
        let mut entries = self.entries.write().await;

        if !entries.contains_key(key) && entries.len() >= self.max_tracked_keys {
            Self::prune_expired_locked(&mut entries, self.window_duration);
            if entries.len() >= self.max_tracked_keys {
                let _ = Self::evict_oldest_locked(&mut entries);
            }
        }

        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| RateLimitEntry {
                count: 0,
                window_start: Instant::now(),
            });

        if !entry.is_new_window(self.window_duration) && entry.count >= self.max_requests {
            RATE_LIMITED_TOTAL.with_label_values(&[self.group]).inc();
            tracing::debug!(key, group = self.group, "Rate limit exceeded");
            Err(AppError::RateLimited)
        } else {
            entry.increment(self.window_duration);
            Ok(())
        }
    }

    /// Get current count for a key
    pub async fn get_count(&self, key: &str) -> u32 {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|e| !e.is_new_window(self.window_duration))
            .map(|e| e.count)
            .unwrap_or(0)
    }

    /// Prune old entries
    ///
    /// Should be called periodically to clean up expired entries.
    pub async fn prune_old(&self) {
        let mut entries = self.entries.write().await;
        let removed = Self::prune_expired_locked(&mut entries, self.window_duration);

        if removed > 0 {
            tracing::debug!("Pruned {} old rate limit entries", removed);
        }
    }
}

/// Derive the limiter key for a request.
///
/// The first address in `X-Forwarded-For` when present (the server is
/// expected to sit behind a proxy), otherwise a shared fallback key.
pub fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "anonymous".to_string())
}

/// Middleware body enforcing a limiter; mount via
/// `axum::middleware::from_fn` with the limiter captured.
pub async fn enforce(
    limiter: Arc<RateLimiter>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let key = client_key(request.headers());
    limiter.check_and_increment(&key).await?;
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rate_limit() {
        let limiter =
            RateLimiter::with_max_tracked_keys("test", 3, Duration::from_secs(1), 10_000);

        assert!(limiter.check_and_increment("client-a").await.is_ok());
        assert!(limiter.check_and_increment("client-a").await.is_ok());
        assert!(limiter.check_and_increment("client-a").await.is_ok());

        // 4th request should be rate limited
        assert!(limiter.check_and_increment("client-a").await.is_err());

        // Wait for window to reset
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(limiter.check_and_increment("client-a").await.is_ok());
    }

    #[tokio::test]
    async fn test_different_keys() {
        let limiter =
            RateLimiter::with_max_tracked_keys("test", 2, Duration::from_secs(1), 10_000);

        assert!(limiter.check_and_increment("client-a").await.is_ok());
        assert!(limiter.check_and_increment("client-a").await.is_ok());
        assert!(limiter.check_and_increment("client-b").await.is_ok());
        assert!(limiter.check_and_increment("client-b").await.is_ok());

        assert!(limiter.check_and_increment("client-a").await.is_err());
        assert!(limiter.check_and_increment("client-b").await.is_err());
    }

    #[tokio::test]
    async fn test_max_tracked_keys_evicts_oldest_entry() {
        let limiter = RateLimiter::with_max_tracked_keys("test", 10, Duration::from_secs(60), 2);

        assert!(limiter.check_and_increment("client-a").await.is_ok());
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(limiter.check_and_increment("client-b").await.is_ok());
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(limiter.check_and_increment("client-c").await.is_ok());

        assert_eq!(limiter.get_count("client-a").await, 0);
        assert_eq!(limiter.get_count("client-b").await, 1);
        assert_eq!(limiter.get_count("client-c").await, 1);
    }

    #[test]
    fn test_client_key_prefers_forwarded_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_key(&headers), "anonymous");

        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
        assert_eq!(client_key(&headers), "203.0.113.7");
    }
}
