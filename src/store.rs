//! Best-effort TTL cache on top of a [`StorageBackend`].
//!
//! Nothing in this module fails visibly. Read errors, corrupt JSON and
//! expired entries all become "absent", and write errors (quota exceeded,
//! I/O) are logged and dropped: the cache is an optimization, the caller
//! must never notice it failing.

use crate::backend::StorageBackend;
use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::key::{CacheKeyBuilder, DEFAULT_CACHE_PREFIX};
use crate::observability::DEFAULT_TTL;
use crate::serialization::{decode_entry, encode_entry, CacheEntry};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// TTL cache keyed by string, shared by cloning.
///
/// # Example
///
/// ```
/// use crud_kit::backend::InMemoryBackend;
/// use crud_kit::store::CacheStore;
///
/// let store = CacheStore::new(InMemoryBackend::new());
/// store.set("user_1", &"Alice".to_string(), None);
///
/// let name: Option<String> = store.get("user_1");
/// assert_eq!(name.as_deref(), Some("Alice"));
/// ```
#[derive(Clone)]
pub struct CacheStore<B: StorageBackend> {
    backend: B,
    clock: Arc<dyn Clock>,
    prefix: Arc<str>,
    default_ttl: Duration,
}

impl<B: StorageBackend> CacheStore<B> {
    /// Create a store with the system clock, `app_cache_` prefix and 5 minute TTL.
    pub fn new(backend: B) -> Self {
        CacheStore {
            backend,
            clock: Arc::new(SystemClock),
            prefix: Arc::from(DEFAULT_CACHE_PREFIX),
            default_ttl: DEFAULT_TTL,
        }
    }

    /// Use a custom clock.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Use a custom key prefix.
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = Arc::from(prefix);
        self
    }

    /// TTL used by `set` when none is given.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Fresh cached value under `key`.
    ///
    /// Expired entries are removed as a side effect. Missing, corrupt or
    /// unreadable entries return `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entry = self.entry::<T>(key)?;
        if entry.is_expired(self.now()) {
            debug!("✗ Cache entry {} expired, evicting", key);
            self.remove(key);
            return None;
        }
        Some(entry.data)
    }

    /// Cached value under `key` regardless of freshness.
    ///
    /// Used as the last-resort fallback when a live fetch fails. Does not evict.
    pub fn peek_stale<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.entry::<T>(key).map(|entry| entry.data)
    }

    /// Raw entry under `key`, including its timestamp and TTL.
    pub fn entry<T: DeserializeOwned>(&self, key: &str) -> Option<CacheEntry<T>> {
        let storage_key = self.storage_key(key);
        let raw = match self.backend.get(&storage_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Cache read failed for {}: {}", key, e);
                return None;
            }
        };

        decode_entry(&raw).ok()
    }

    /// Write `data` under `key` with the current timestamp.
    ///
    /// Failures are logged and swallowed.
    pub fn set<T: Serialize>(&self, key: &str, data: &T, ttl: Option<Duration>) {
        if let Err(e) = self.try_set(key, data, ttl) {
            warn!("Error caching data for {}: {}", key, e);
        }
    }

    /// Write `data` under `key`, reporting failures.
    ///
    /// # Errors
    ///
    /// Returns the backend or serialization error.
    pub fn try_set<T: Serialize>(&self, key: &str, data: &T, ttl: Option<Duration>) -> Result<()> {
        let ttl = ttl.unwrap_or(self.default_ttl).as_millis() as u64;
        let entry = CacheEntry::new(data, self.now(), ttl);
        let raw = encode_entry(&entry)?;
        self.backend.set(&self.storage_key(key), raw)
    }

    /// Delete the entry under `key` unconditionally.
    pub fn remove(&self, key: &str) {
        if let Err(e) = self.backend.delete(&self.storage_key(key)) {
            warn!("Cache remove failed for {}: {}", key, e);
        }
    }

    /// Logical keys (prefix stripped) currently stored by this cache.
    pub fn keys(&self) -> Vec<String> {
        match self.backend.keys() {
            Ok(keys) => keys
                .iter()
                .filter_map(|k| CacheKeyBuilder::logical_key(&self.prefix, k))
                .map(str::to_string)
                .collect(),
            Err(e) => {
                warn!("Cache key listing failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Remove every entry under this cache's prefix, leaving other keys alone.
    pub fn clear(&self) {
        for key in self.keys() {
            self.remove(&key);
        }
    }

    /// Remove every expired entry. Returns how many were evicted.
    pub fn purge_expired(&self) -> usize {
        let now = self.now();
        let mut evicted = 0;
        for key in self.keys() {
            if let Some(entry) = self.entry::<serde_json::Value>(&key) {
                if entry.is_expired(now) {
                    self.remove(&key);
                    evicted += 1;
                }
            }
        }
        evicted
    }

    /// Current time according to the store clock.
    pub fn now(&self) -> u64 {
        self.clock.now_millis()
    }

    /// Get backend reference (for advanced use).
    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn storage_key(&self, key: &str) -> String {
        CacheKeyBuilder::storage_key(&self.prefix, key)
    }
}
