//! In-memory response cache with per-entry time-to-live.
//!
//! Entries expire lazily: nothing sweeps the map, a stale entry is dropped
//! the next time it is read. There is no capacity bound.

use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// TTL applied when the caller does not pick one.
pub const DEFAULT_TTL_MINUTES: f64 = 5.0;

#[derive(Debug, Clone)]
struct CacheEntry {
    data: Value,
    stored_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) > self.ttl
    }
}

#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: HashMap<String, CacheEntry>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `data` under `key`. `ttl_minutes` defaults to
    /// [`DEFAULT_TTL_MINUTES`]; negative values are treated as zero.
    pub fn set(&mut self, key: impl Into<String>, data: Value, ttl_minutes: Option<f64>) {
        let minutes = ttl_minutes.unwrap_or(DEFAULT_TTL_MINUTES).max(0.0);
        let entry = CacheEntry {
            data,
            stored_at: Instant::now(),
            ttl: Duration::from_secs_f64(minutes * 60.0),
        };
        self.entries.insert(key.into(), entry);
    }

    /// Return the cached value if present and unexpired. A stale entry is
    /// removed as a side effect.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        let entry = self.entries.get(key)?;
        if entry.is_expired(Instant::now()) {
            self.entries.remove(key);
            return None;
        }
        Some(entry.data.clone())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test(start_paused = true)]
    async fn test_entry_readable_before_ttl() {
        let mut cache = ResponseCache::new();
        cache.set("quote_AAPL", json!({"price": 101.5}), Some(0.01));
        tokio::time::advance(Duration::from_millis(300)).await;
        assert_eq!(cache.get("quote_AAPL"), Some(json!({"price": 101.5})));
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_absent_after_ttl() {
        let mut cache = ResponseCache::new();
        cache.set("quote_AAPL", json!({"price": 101.5}), Some(0.01));
        tokio::time::advance(Duration::from_millis(601)).await;
        assert_eq!(cache.get("quote_AAPL"), None);
        // stale entry was evicted by the read
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_ttl_is_five_minutes() {
        let mut cache = ResponseCache::new();
        cache.set("market_indices", json!([1, 2, 3]), None);
        tokio::time::advance(Duration::from_secs(299)).await;
        assert!(cache.get("market_indices").is_some());
        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get("market_indices").is_none());
    }

    #[test]
    fn test_clear_and_overwrite() {
        let mut cache = ResponseCache::new();
        cache.set("a", json!(1), Some(1.0));
        cache.set("a", json!(2), Some(1.0));
        cache.set("b", json!(3), Some(1.0));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), Some(json!(2)));
        cache.clear();
        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_none());
    }

    #[test]
    fn test_missing_key() {
        let mut cache = ResponseCache::new();
        assert!(cache.get("nope").is_none());
    }
}
