//! Unauthorized access log throttling
//!
//! Denied senders never get a reply. Every attempt is still visible in the
//! logs, but a sender that keeps writing only produces one full log line per
//! cooldown period.

use moka::future::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Tracks when a denied sender was last logged in full.
#[derive(Clone)]
pub struct UnauthorizedCache {
    /// user_id -> () with automatic TTL
    cache: Cache<i64, ()>,
    cooldown: Duration,
    /// Attempts that were not logged in full
    silenced_count: Arc<AtomicU64>,
}

impl UnauthorizedCache {
    /// Creates a new `UnauthorizedCache`
    ///
    /// # Arguments
    ///
    /// * `cooldown_secs` - Seconds between full log lines for the same user
    /// * `ttl_secs` - Time-to-live for cache entries (auto-cleanup)
    /// * `max_capacity` - Maximum number of entries in cache
    ///
    /// # Examples
    ///
    /// ```
    /// use expense_bot_transport_telegram::bot::UnauthorizedCache;
    ///
    /// let cache = UnauthorizedCache::new(1200, 7200, 10_000);
    /// assert_eq!(cache.silenced_count(), 0);
    /// ```
    #[must_use]
    pub fn new(cooldown_secs: u64, ttl_secs: u64, max_capacity: u64) -> Self {
        // Expiry of an entry ends its cooldown
        let ttl = ttl_secs.min(cooldown_secs);
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(ttl))
            .build();

        Self {
            cache,
            cooldown: Duration::from_secs(cooldown_secs),
            silenced_count: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Returns `true` if this attempt should be logged in full.
    ///
    /// The first attempt of a user starts the cooldown. Attempts inside it are
    /// counted, and every 100th of them is summarized at debug level.
    pub async fn should_log(&self, user_id: i64, user_name: &str) -> bool {
        if self.cache.get(&user_id).await.is_none() {
            self.cache.insert(user_id, ()).await;
            return true;
        }

        let count = self.silenced_count.fetch_add(1, Ordering::Relaxed) + 1;
        if count.is_multiple_of(100) {
            debug!(
                "⛔️ Silenced {} unauthorized attempts (recent: user {} - {})",
                count, user_id, user_name
            );
        }

        false
    }

    /// Returns the current number of entries in the cache
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Returns the total number of silenced unauthorized attempts
    #[must_use]
    pub fn silenced_count(&self) -> u64 {
        self.silenced_count.load(Ordering::Relaxed)
    }

    /// Returns the configured cooldown duration
    #[must_use]
    pub const fn cooldown(&self) -> Duration {
        self.cooldown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_attempt_is_logged() {
        let cache = UnauthorizedCache::new(60, 120, 100);
        assert!(cache.should_log(12345, "TestUser").await);
    }

    #[tokio::test]
    async fn test_cooldown_silences_repeat_attempts() {
        let cache = UnauthorizedCache::new(60, 120, 100);

        assert!(cache.should_log(12345, "TestUser").await);
        assert!(!cache.should_log(12345, "TestUser").await);
        assert!(!cache.should_log(12345, "TestUser").await);
        assert_eq!(cache.silenced_count(), 2);
    }

    #[tokio::test]
    async fn test_different_users_independent() {
        let cache = UnauthorizedCache::new(60, 120, 100);

        assert!(cache.should_log(111, "User1").await);
        assert!(cache.should_log(222, "User2").await);
        assert_eq!(cache.silenced_count(), 0);
    }

    #[tokio::test]
    async fn test_entry_count() {
        let cache = UnauthorizedCache::new(60, 120, 100);

        cache.should_log(111, "User1").await;
        cache.should_log(222, "User2").await;
        cache.should_log(222, "User2").await;

        // Run pending tasks to update the entry count
        cache.cache.run_pending_tasks().await;

        assert_eq!(cache.entry_count(), 2);
        assert_eq!(cache.cooldown(), Duration::from_secs(60));
    }
}
