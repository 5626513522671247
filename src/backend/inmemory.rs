//! In-memory key-value store (default, thread-safe).
//!
//! Uses DashMap for lock-free concurrent access with per-key sharding.
//! An optional byte quota rejects writes the way a browser origin store does.

use super::StorageBackend;
use crate::error::{Error, Result};
use dashmap::DashMap;
use std::sync::Arc;

/// Thread-safe in-memory store.
///
/// Clones share the same underlying map.
///
/// # Example
///
/// ```no_run
/// use crud_kit::backend::{InMemoryBackend, StorageBackend};
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let backend = InMemoryBackend::with_quota(1024);
///
///     backend.set("key1", "value".to_string())?;
///     assert_eq!(backend.get("key1")?, Some("value".to_string()));
///
///     // Larger than the quota: rejected
///     assert!(backend.set("key2", "x".repeat(4096)).is_err());
///
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct InMemoryBackend {
    store: Arc<DashMap<String, String>>,
    quota: Option<usize>,
}

impl InMemoryBackend {
    /// Create a new unbounded store.
    pub fn new() -> Self {
        InMemoryBackend {
            store: Arc::new(DashMap::new()),
            quota: None,
        }
    }

    /// Create a store that rejects writes once keys and values exceed `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        InMemoryBackend {
            store: Arc::new(DashMap::new()),
            quota: Some(bytes),
        }
    }

    /// Get the current number of entries.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Get memory statistics.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            total_entries: self.store.len(),
            total_bytes: self.used_bytes(),
            quota_bytes: self.quota,
        }
    }

    /// Print store statistics to debug log.
    pub fn log_stats(&self) {
        let stats = self.stats();
        debug!(
            "Store Stats: {} entries, {} bytes (quota: {:?})",
            stats.total_entries, stats.total_bytes, stats.quota_bytes
        );
    }

    fn used_bytes(&self) -> usize {
        self.store
            .iter()
            .map(|entry| entry.key().len() + entry.value().len())
            .sum()
    }

    /// Bytes held by every entry other than `key`.
    fn used_bytes_except(&self, key: &str) -> usize {
        self.store
            .iter()
            .filter(|entry| entry.key() != key)
            .map(|entry| entry.key().len() + entry.value().len())
            .sum()
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageBackend for InMemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self.store.get(key).map(|v| v.value().clone());
        debug!(
            "✓ InMemory GET {} -> {}",
            key,
            if value.is_some() { "HIT" } else { "MISS" }
        );
        Ok(value)
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        if let Some(limit) = self.quota {
            let requested = self.used_bytes_except(key) + key.len() + value.len();
            if requested > limit {
                return Err(Error::QuotaExceeded { limit, requested });
            }
        }

        self.store.insert(key.to_string(), value);
        debug!("✓ InMemory SET {}", key);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.store.remove(key);
        debug!("✓ InMemory DELETE {}", key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.store.iter().map(|entry| entry.key().clone()).collect())
    }

    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.store.contains_key(key))
    }

    fn clear_all(&self) -> Result<()> {
        self.store.clear();
        warn!("⚠ InMemory CLEAR_ALL executed - all entries removed!");
        Ok(())
    }
}

/// Store statistics.
#[derive(Clone, Debug)]
pub struct StoreStats {
    pub total_entries: usize,
    pub total_bytes: usize,
    pub quota_bytes: Option<usize>,
}
