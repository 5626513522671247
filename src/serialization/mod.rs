//! JSON cache entries with timestamp and time-to-live.
//!
//! Every value written to the persistent store is wrapped in a [`CacheEntry`]
//! and stored as a JSON string:
//!
//! ```text
//! { "data": <payload>, "timestamp": <epoch millis>, "ttl": <millis> }
//! ```
//!
//! The entry is expired once `now - timestamp > ttl`. Entries are always
//! overwritten on refresh, never merged.
//!
//! # Example
//!
//! ```rust
//! use crud_kit::serialization::{decode_entry, encode_entry, CacheEntry};
//!
//! # fn main() -> crud_kit::Result<()> {
//! let entry = CacheEntry::new(vec![1, 2, 3], 1_000, 60_000);
//! let json = encode_entry(&entry)?;
//!
//! let decoded: CacheEntry<Vec<u32>> = decode_entry(&json)?;
//! assert_eq!(decoded.data, vec![1, 2, 3]);
//! assert!(!decoded.is_expired(61_000));
//! assert!(decoded.is_expired(61_001));
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Single cache entry as stored in the key-value store.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    /// The cached payload.
    pub data: T,
    /// Write time in milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// Lifetime in milliseconds. Always greater than zero.
    pub ttl: u64,
}

impl<T> CacheEntry<T> {
    /// Create a new entry. A zero `ttl` is raised to one millisecond.
    pub fn new(data: T, timestamp: u64, ttl: u64) -> Self {
        CacheEntry {
            data,
            timestamp,
            ttl: ttl.max(1),
        }
    }

    /// True once more than `ttl` milliseconds have passed since `timestamp`.
    pub fn is_expired(&self, now: u64) -> bool {
        now.saturating_sub(self.timestamp) > self.ttl
    }

    /// Milliseconds left before expiry, zero when already expired.
    pub fn remaining(&self, now: u64) -> u64 {
        self.timestamp.saturating_add(self.ttl).saturating_sub(now)
    }
}

/// Encode an entry as a JSON string.
///
/// # Errors
///
/// Returns `Error::SerializationError` if the payload cannot be represented as JSON.
pub fn encode_entry<T: Serialize>(entry: &CacheEntry<T>) -> Result<String> {
    serde_json::to_string(entry).map_err(|e| {
        log::error!("Cache serialization failed: {}", e);
        Error::SerializationError(e.to_string())
    })
}

/// Decode an entry from a JSON string.
///
/// # Errors
///
/// Returns `Error::DeserializationError` for corrupt JSON or a payload of the wrong shape.
pub fn decode_entry<T: DeserializeOwned>(raw: &str) -> Result<CacheEntry<T>> {
    serde_json::from_str(raw).map_err(|e| {
        log::warn!("Cache entry could not be decoded: {}", e);
        Error::DeserializationError(e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
    struct TestData {
        id: u64,
        name: String,
        active: bool,
    }

    #[test]
    fn test_entry_json_layout() {
        let entry = CacheEntry::new(
            TestData {
                id: 1,
                name: "A".to_string(),
                active: true,
            },
            1_700_000_000_000,
            300_000,
        );

        let json = encode_entry(&entry).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["data"]["name"], "A");
        assert_eq!(value["timestamp"], 1_700_000_000_000u64);
        assert_eq!(value["ttl"], 300_000);
    }

    #[test]
    fn test_zero_ttl_is_raised() {
        let entry = CacheEntry::new(1, 0, 0);
        assert_eq!(entry.ttl, 1);
    }

    #[test]
    fn test_expiry_boundary() {
        let entry = CacheEntry::new("x", 1_000, 500);

        assert!(!entry.is_expired(1_000));
        assert!(!entry.is_expired(1_500));
        assert!(entry.is_expired(1_501));
        assert_eq!(entry.remaining(1_200), 300);
        assert_eq!(entry.remaining(2_000), 0);
    }

    #[test]
    fn test_remaining_with_huge_ttl() {
        let json = r#"{"data":1,"timestamp":1700000000000,"ttl":18446744073709551615}"#;
        let entry: CacheEntry<u32> = decode_entry(json).unwrap();

        assert!(!entry.is_expired(1_700_000_000_001));
        assert_eq!(entry.remaining(1_700_000_000_000), u64::MAX - 1_700_000_000_000);
    }

    #[test]
    fn test_clock_behind_timestamp_is_not_expired() {
        let entry = CacheEntry::new("x", 5_000, 10);
        assert!(!entry.is_expired(1_000));
    }

    #[test]
    fn test_corrupt_json_rejected() {
        let result: Result<CacheEntry<TestData>> = decode_entry("{\"data\": {\"id\": 1");
        match result.unwrap_err() {
            Error::DeserializationError(_) => {}
            e => panic!("Expected DeserializationError, got {:?}", e),
        }
    }

    #[test]
    fn test_wrong_shape_rejected() {
        let raw = r#"{"data":"not a struct","timestamp":1,"ttl":1}"#;
        let result: Result<CacheEntry<TestData>> = decode_entry(raw);
        assert!(matches!(result, Err(Error::DeserializationError(_))));
    }

    #[test]
    fn test_missing_envelope_fields_rejected() {
        let result: Result<CacheEntry<u32>> = decode_entry("42");
        assert!(result.is_err());
    }
}
