//! In-memory read cache
//!
//! Volatile, cleared on restart. Uses Moka for concurrent caching.
//!
//! The user cache memoizes the current-user read. It is a performance
//! hint only: every mutation to a user invalidates the entry
//! synchronously, so a stale entry never outlives a change to the
//! record it shadows.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use super::models::User;

/// Read-through cache for resolved user snapshots, keyed by username.
pub struct UserCache {
    users: Cache<String, Arc<User>>,
}

impl UserCache {
    /// Create new user cache
    ///
    /// # Arguments
    /// * `ttl_seconds` - Entry time-to-live
    /// * `max_entries` - Maximum cached users (LRU eviction)
    pub fn new(ttl_seconds: u64, max_entries: u64) -> Self {
        let users = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(Duration::from_secs(ttl_seconds))
            .build();

        Self { users }
    }

    /// Get cached user by username
    pub async fn get(&self, username: &str) -> Option<Arc<User>> {
        let result = self.users.get(username).await;

        use crate::metrics::{CACHE_HITS_TOTAL, CACHE_MISSES_TOTAL};
        if result.is_some() {
            CACHE_HITS_TOTAL.with_label_values(&["user"]).inc();
        } else {
            CACHE_MISSES_TOTAL.with_label_values(&["user"]).inc();
        }

        result
    }

    /// Insert or refresh a user snapshot
    pub async fn insert(&self, user: User) {
        let username = user.username.clone();
        self.users.insert(username, Arc::new(user)).await;
    }

    /// Drop the entry for a username.
    ///
    /// Called synchronously from every mutation path.
    pub async fn invalidate(&self, username: &str) {
        self.users.invalidate(username).await;
    }
}
