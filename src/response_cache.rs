//! Per-connector cache of successful GET response bodies.
//!
//! Entries are keyed on method, endpoint and query, and live for a fixed
//! TTL. Only bodies of 2xx GET responses are ever stored.

use chrono::{DateTime, Duration, Utc};
use reqwest::Method;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    method: Method,
    endpoint: String,
    query: Vec<(String, String)>,
}

impl CacheKey {
    /// `None` for anything but GET.
    pub fn for_request(
        method: &Method,
        endpoint: &str,
        query: &[(String, String)],
    ) -> Option<Self> {
        (*method == Method::GET).then(|| Self {
            method: method.clone(),
            endpoint: endpoint.to_string(),
            query: query.to_vec(),
        })
    }
}

#[derive(Debug, Clone)]
struct CachedResponse {
    body: String,
    cached_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct ResponseCache {
    enabled: bool,
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, CachedResponse>>,
}

impl ResponseCache {
    /// A zero TTL disables the cache just like `enabled = false`.
    pub fn new(enabled: bool, ttl_seconds: u64) -> Self {
        let ttl = i64::try_from(ttl_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX);
        Self {
            enabled: enabled && ttl_seconds > 0,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Cached body for `key` if it is younger than the TTL.
    pub fn get(&self, key: &CacheKey) -> Option<String> {
        if !self.enabled {
            return None;
        }

        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(key)?;
        if self.is_valid(entry.cached_at) {
            debug!("Serving {} from response cache", key.endpoint);
            Some(entry.body.clone())
        } else {
            entries.remove(key);
            None
        }
    }

    pub fn insert(&self, key: CacheKey, body: String) {
        if !self.enabled {
            return;
        }

        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                key,
                CachedResponse {
                    body,
                    cached_at: Utc::now(),
                },
            );
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_valid(&self, cached_at: DateTime<Utc>) -> bool {
        (Utc::now() - cached_at) < self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(endpoint: &str, query: &[(&str, &str)]) -> CacheKey {
        let query: Vec<_> = query
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CacheKey::for_request(&Method::GET, endpoint, &query).unwrap()
    }

    #[test]
    fn test_only_get_is_keyed() {
        let post = CacheKey::for_request(&Method::POST, "/reports/r1/GenerateToken", &[]);
        assert!(post.is_none());
        assert!(CacheKey::for_request(&Method::GET, "/groups", &[]).is_some());
    }

    #[test]
    fn test_set_get() {
        let cache = ResponseCache::new(true, 60);
        cache.insert(key("/groups", &[]), r#"{"value":[]}"#.to_string());

        assert_eq!(cache.get(&key("/groups", &[])).unwrap(), r#"{"value":[]}"#);
        assert!(cache.get(&key("/groups", &[("$top", "5")])).is_none());
    }

    #[test]
    fn test_expired_entry_is_evicted() {
        let cache = ResponseCache::new(true, 60);
        let stale = key("/groups", &[]);
        cache.entries.lock().unwrap().insert(
            stale.clone(),
            CachedResponse {
                body: "old".to_string(),
                cached_at: Utc::now() - Duration::minutes(2),
            },
        );

        assert!(cache.get(&stale).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_disabled_stores_nothing() {
        for cache in [ResponseCache::new(false, 60), ResponseCache::new(true, 0)] {
            assert!(!cache.is_enabled());
            cache.insert(key("/groups", &[]), "body".to_string());
            assert!(cache.get(&key("/groups", &[])).is_none());
            assert!(cache.is_empty());
        }
    }

    #[test]
    fn test_clear() {
        let cache = ResponseCache::new(true, 60);
        cache.insert(key("/groups", &[]), "body".to_string());
        cache.clear();
        assert!(cache.is_empty());
    }
}
