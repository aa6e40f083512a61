//! In-memory response cache keyed by request URL.
//!
//! Owned by a [`Dispatcher`](super::Dispatcher); entries live as long as the
//! dispatcher does and are never evicted.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

/// Result of a cache lookup
#[derive(Debug, Clone, PartialEq)]
pub enum CacheResult<T> {
    /// Item was found
    Hit(T),

    /// Item was not found, or caching is disabled
    Miss,
}

/// Memoizes parsed response bodies by URL
#[derive(Debug)]
pub struct ResponseCache {
    enabled: bool,
    entries: Mutex<HashMap<String, Value>>,
}

impl ResponseCache {
    /// Create an enabled, empty cache
    pub fn new() -> Self {
        Self {
            enabled: true,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Create a cache that never stores anything
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Look up a cached body
    pub fn get(&self, url: &str) -> CacheResult<Value> {
        if !self.enabled {
            return CacheResult::Miss;
        }

        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(url) {
            Some(body) => {
                tracing::debug!("Cache HIT for {}", url);
                CacheResult::Hit(body.clone())
            }
            None => {
                tracing::debug!("Cache MISS for {}", url);
                CacheResult::Miss
            }
        }
    }

    /// Store a body under its URL
    pub fn insert(&self, url: &str, body: Value) {
        if !self.enabled {
            return;
        }

        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(url.to_string(), body);
    }

    /// Number of cached responses
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all cached responses
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}
