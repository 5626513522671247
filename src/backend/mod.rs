//! Persistent key-value store implementations.

use crate::error::Result;

pub mod file;
pub mod inmemory;

pub use file::FileBackend;
pub use inmemory::InMemoryBackend;

/// Trait for key-value store implementations.
///
/// Models an origin-scoped string store with a finite quota. Values are the
/// JSON-encoded [`CacheEntry`](crate::serialization::CacheEntry) strings.
///
/// **IMPORTANT:** All methods use `&self` instead of `&mut self` to allow concurrent access.
/// Implementations should use interior mutability.
///
/// **SYNC:** Store access is synchronous but fallible. Callers in the cache
/// layer absorb every error this trait returns.
pub trait StorageBackend: Send + Sync + Clone + 'static {
    /// Read the raw string stored under `key`.
    ///
    /// # Errors
    /// Returns `Err` if the store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    /// Returns `Err` on write failure, including `Error::QuotaExceeded`.
    fn set(&self, key: &str, value: String) -> Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    /// Returns `Err` if the store cannot be written.
    fn delete(&self, key: &str) -> Result<()>;

    /// Enumerate every key in the store.
    ///
    /// # Errors
    /// Returns `Err` if the store cannot be read.
    fn keys(&self) -> Result<Vec<String>>;

    /// Check if key exists in the store.
    ///
    /// # Errors
    /// Returns `Err` if the store cannot be read.
    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Remove every key.
    ///
    /// Default implementation deletes keys one by one.
    ///
    /// # Errors
    /// Returns `Err` if the store cannot be written.
    fn clear_all(&self) -> Result<()> {
        for key in self.keys()? {
            self.delete(&key)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_exists_default() {
        let backend = InMemoryBackend::new();
        backend
            .set("key", "value".to_string())
            .expect("Failed to set key");
        assert!(backend.exists("key").expect("Failed to check exists"));
        assert!(!backend
            .exists("nonexistent")
            .expect("Failed to check exists"));
    }
}
