//! Observability and TTL policies for cache operations.
//!
//! crud-kit separates observability into two concerns:
//!
//! - **Metrics (`CacheMetrics`)**: hits, misses, stale fallbacks, background refreshes
//! - **TTL Policies (`TtlPolicy`)**: how long entries stay fresh
//!
//! # Metrics
//!
//! ```ignore
//! use crud_kit::observability::CacheMetrics;
//! use std::time::Duration;
//!
//! struct CounterMetrics;
//!
//! impl CacheMetrics for CounterMetrics {
//!     fn record_hit(&self, _key: &str, _duration: Duration) {
//!         // counter!("cache_hits").inc();
//!     }
//! }
//!
//! // let expander = CacheExpander::new(store, connectivity)
//! //     .with_metrics(Box::new(CounterMetrics));
//! ```
//!
//! Methods that are not overridden log through the `log` crate.
//! [`NoOpMetrics`] silences everything and is the expander default.
//!
//! # TTL Policies
//!
//! ```
//! use crud_kit::observability::TtlPolicy;
//! use std::time::Duration;
//!
//! // Five minutes for every key (the default)
//! let _policy = TtlPolicy::default();
//!
//! // Different TTL per key family
//! let _policy = TtlPolicy::PerKey(|key| {
//!     if key.starts_with("comments_") {
//!         Duration::from_secs(60)
//!     } else {
//!         Duration::from_secs(300)
//!     }
//! });
//! ```

use std::time::Duration;

/// Default lifetime of a cache entry.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Trait for cache metrics collection.
pub trait CacheMetrics: Send + Sync {
    /// Fresh cached value served.
    fn record_hit(&self, key: &str, duration: Duration) {
        debug!("Cache HIT: {} took {:?}", key, duration);
    }

    /// Live fetch performed because nothing usable was cached.
    fn record_miss(&self, key: &str, duration: Duration) {
        debug!("Cache MISS: {} took {:?}", key, duration);
    }

    /// Live fetch failed and a stale cached value was served instead.
    fn record_stale_fallback(&self, key: &str, error: &str) {
        debug!("Cache STALE FALLBACK: {} ({})", key, error);
    }

    /// Background refresh finished.
    fn record_refresh(&self, key: &str, succeeded: bool) {
        debug!("Cache REFRESH: {} succeeded={}", key, succeeded);
    }

    /// Entry written.
    fn record_set(&self, key: &str) {
        debug!("Cache SET: {}", key);
    }

    /// Failure surfaced to the caller.
    fn record_error(&self, key: &str, error: &str) {
        warn!("Cache ERROR for {}: {}", key, error);
    }
}

/// Default metrics implementation (no-op).
#[derive(Clone, Default)]
pub struct NoOpMetrics;

impl CacheMetrics for NoOpMetrics {
    fn record_hit(&self, _key: &str, _duration: Duration) {}
    fn record_miss(&self, _key: &str, _duration: Duration) {}
    fn record_stale_fallback(&self, _key: &str, _error: &str) {}
    fn record_refresh(&self, _key: &str, _succeeded: bool) {}
    fn record_set(&self, _key: &str) {}
    fn record_error(&self, _key: &str, _error: &str) {}
}

/// Metrics that only log.
#[derive(Clone, Default)]
pub struct LogMetrics;

impl CacheMetrics for LogMetrics {}

/// TTL (Time-to-Live) policy for cache entries.
#[derive(Clone, Debug)]
pub enum TtlPolicy {
    /// Same duration for all entries.
    Fixed(Duration),

    /// Duration chosen from the logical cache key.
    PerKey(fn(&str) -> Duration),
}

impl Default for TtlPolicy {
    fn default() -> Self {
        TtlPolicy::Fixed(DEFAULT_TTL)
    }
}

impl TtlPolicy {
    /// Get TTL for a cache key.
    pub fn get_ttl(&self, key: &str) -> Duration {
        match self {
            TtlPolicy::Fixed(d) => *d,
            TtlPolicy::PerKey(f) => f(key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_metrics() {
        let metrics = NoOpMetrics;
        metrics.record_hit("key", Duration::from_secs(1));
        metrics.record_miss("key", Duration::from_secs(2));
        metrics.record_refresh("key", false);
    }

    #[test]
    fn test_ttl_policy_default() {
        let policy = TtlPolicy::default();
        assert_eq!(policy.get_ttl("any"), Duration::from_secs(300));
    }

    #[test]
    fn test_ttl_policy_fixed() {
        let policy = TtlPolicy::Fixed(Duration::from_secs(30));
        assert_eq!(policy.get_ttl("any"), Duration::from_secs(30));
    }

    #[test]
    fn test_ttl_policy_per_key() {
        let policy = TtlPolicy::PerKey(|key| {
            if key == "users" {
                Duration::from_secs(3600)
            } else {
                Duration::from_secs(1800)
            }
        });

        assert_eq!(policy.get_ttl("users"), Duration::from_secs(3600));
        assert_eq!(policy.get_ttl("user_1"), Duration::from_secs(1800));
    }
}
