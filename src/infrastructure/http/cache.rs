//! In-memory TTL cache for successful read responses.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::time::Instant;

/// What `ResponseCache::clear` removed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearResult {
    /// Entries whose key contained the pattern
    Removed(usize),
    /// Everything
    All,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    stored_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.stored_at) >= self.ttl
    }
}

/// Response cache shared by all requests of one API client
#[derive(Debug)]
pub struct ResponseCache {
    default_ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResponseCache {
    /// Empty cache whose entries live for `default_ttl`
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            default_ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Cached value for `key`, unless it has outlived its TTL
    pub fn get(&self, key: &str) -> Option<Value> {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                None
            }
            Some(entry) => Some(entry.value.clone()),
            None => None,
        }
    }

    /// Store with the default TTL
    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    /// Store with an explicit TTL
    pub fn set_with_ttl(&self, key: impl Into<String>, value: Value, ttl: Duration) {
        let entry = CacheEntry {
            value,
            stored_at: Instant::now(),
            ttl,
        };
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), entry);
    }

    /// Remove entries whose key contains `pattern`, or everything when `None`
    pub fn clear(&self, pattern: Option<&str>) -> ClearResult {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        match pattern {
            Some(pattern) => {
                let before = entries.len();
                entries.retain(|key, _| !key.contains(pattern));
                ClearResult::Removed(before - entries.len())
            }
            None => {
                entries.clear();
                ClearResult::All
            }
        }
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    /// Stored entries, expired ones included until swept
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether nothing is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `METHOD:endpoint:sha256(payload)`
///
/// `serde_json` maps keep keys sorted, so equal payloads hash equally
/// regardless of the order their fields were written in.
pub fn cache_key(method: &str, endpoint: &str, payload: Option<&Value>) -> String {
    let serialized = payload.map_or_else(String::new, Value::to_string);
    let digest = Sha256::digest(serialized.as_bytes());
    format!("{}:{endpoint}:{}", method.to_uppercase(), hex::encode(digest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = ResponseCache::new(Duration::from_secs(300));
        cache.set("GET:/users:abc", json!({"users": []}));

        tokio::time::advance(Duration::from_secs(299)).await;
        assert_eq!(cache.get("GET:/users:abc"), Some(json!({"users": []})));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get("GET:/users:abc"), None);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_ttl() {
        let cache = ResponseCache::new(Duration::from_secs(300));
        cache.set_with_ttl("short", json!(1), Duration::from_secs(5));

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(cache.get("short"), None);
    }

    #[test]
    fn test_clear_with_pattern() {
        let cache = ResponseCache::new(Duration::from_secs(300));
        cache.set("GET:/users:1", json!(1));
        cache.set("GET:/users/42:2", json!(2));
        cache.set("GET:/orders:3", json!(3));

        assert_eq!(cache.clear(Some("/users")), ClearResult::Removed(2));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.clear(Some("/nothing")), ClearResult::Removed(0));
    }

    #[test]
    fn test_clear_all() {
        let cache = ResponseCache::new(Duration::from_secs(300));
        cache.set("a", json!(1));
        cache.set("b", json!(2));

        assert_eq!(cache.clear(None), ClearResult::All);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let cache = ResponseCache::new(Duration::from_secs(10));
        cache.set("old", json!(1));
        tokio::time::advance(Duration::from_secs(6)).await;
        cache.set("new", json!(2));
        tokio::time::advance(Duration::from_secs(5)).await;

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.get("new"), Some(json!(2)));
    }

    #[test]
    fn test_cache_key_is_order_independent() {
        let a = cache_key("get", "/search", Some(&json!({"q": "rust", "page": 2})));
        let b = cache_key("GET", "/search", Some(&json!({"page": 2, "q": "rust"})));
        let c = cache_key("GET", "/search", Some(&json!({"q": "go", "page": 2})));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("GET:/search:"));
        assert_eq!(a.len(), "GET:/search:".len() + 64);
    }
}
