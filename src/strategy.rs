//! Cache strategies and the outcome of a cache-augmented fetch.
//!
//! # The Two Strategies
//!
//! ```
//! use crud_kit::strategy::CacheStrategy;
//!
//! // 1. StaleWhileRevalidate - serve cache, refresh in background (default)
//! let _s = CacheStrategy::StaleWhileRevalidate;
//!
//! // 2. ForceRefresh - always run the live fetch first
//! let _s = CacheStrategy::ForceRefresh;
//! ```
//!
//! # Decision Table
//!
//! | Strategy | Online | Cache | Result |
//! |----------|--------|-------|--------|
//! | SWR | yes | fresh | cached value, background refresh spawned |
//! | SWR | no | any (even expired) | cached value, no fetch |
//! | SWR | any | none / expired online | live fetch |
//! | Force | any | any | live fetch |
//!
//! Every live fetch that fails falls back to whatever is cached, fresh or
//! not. Only when nothing is cached does the fetch error reach the caller.

use crate::error::{Error, Result};
use tokio::task::JoinHandle;

/// Strategy enum controlling whether cached data may short-circuit a fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CacheStrategy {
    /// **StaleWhileRevalidate**: serve cached data, keep it fresh in the background.
    ///
    /// Flow:
    /// 1. Online and fresh entry: return it, spawn a refresh
    /// 2. Offline and any entry: return it, no fetch
    /// 3. Otherwise: live fetch, store, return (fallback to cache on failure)
    #[default]
    StaleWhileRevalidate,

    /// **ForceRefresh**: never short-circuit on cached data.
    ///
    /// Flow:
    /// 1. Live fetch
    /// 2. Store and return on success
    /// 3. On failure: return any cached value, else the error
    ForceRefresh,
}

impl std::fmt::Display for CacheStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheStrategy::StaleWhileRevalidate => write!(f, "StaleWhileRevalidate"),
            CacheStrategy::ForceRefresh => write!(f, "ForceRefresh"),
        }
    }
}

/// Detached background refresh.
///
/// The cache layer never awaits it. Its completion order relative to the
/// caller is unspecified and its errors are not observable; tests may await
/// the handle to make the refresh deterministic.
pub type RefreshHandle = JoinHandle<()>;

/// Outcome of a cache-augmented fetch.
///
/// This is the internal result type of [`CacheExpander::resolve`](crate::CacheExpander::resolve).
/// [`Resolution::into_result`] turns it into a plain `Result` at the API boundary.
#[derive(Debug)]
pub enum Resolution<T> {
    /// Fresh cached value served, background refresh spawned.
    Cached {
        value: T,
        refresh: RefreshHandle,
    },

    /// Offline: cached value served without attempting a fetch.
    Offline(T),

    /// Live fetch succeeded and was written to the cache.
    Live(T),

    /// Live fetch failed, cached value served instead.
    Stale {
        value: T,
        error: Error,
    },

    /// Live fetch failed and nothing was cached.
    Failed(Error),
}

impl<T> Resolution<T> {
    /// Convert to the outward-facing result.
    ///
    /// # Errors
    ///
    /// Returns the original fetch error for [`Resolution::Failed`].
    pub fn into_result(self) -> Result<T> {
        match self {
            Resolution::Cached { value, .. }
            | Resolution::Offline(value)
            | Resolution::Live(value)
            | Resolution::Stale { value, .. } => Ok(value),
            Resolution::Failed(error) => Err(error),
        }
    }

    /// Value carried by the resolution, if any.
    pub fn value(&self) -> Option<&T> {
        match self {
            Resolution::Cached { value, .. }
            | Resolution::Offline(value)
            | Resolution::Live(value)
            | Resolution::Stale { value, .. } => Some(value),
            Resolution::Failed(_) => None,
        }
    }

    /// True when the value did not come from a successful live fetch.
    pub fn is_from_cache(&self) -> bool {
        matches!(
            self,
            Resolution::Cached { .. } | Resolution::Offline(_) | Resolution::Stale { .. }
        )
    }

    /// Split into the outward-facing result and the refresh handle, if one was spawned.
    pub fn into_parts(self) -> (Result<T>, Option<RefreshHandle>) {
        match self {
            Resolution::Cached { value, refresh } => (Ok(value), Some(refresh)),
            other => (other.into_result(), None),
        }
    }

    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Resolution::Cached { .. } => "cached",
            Resolution::Offline(_) => "offline",
            Resolution::Live(_) => "live",
            Resolution::Stale { .. } => "stale",
            Resolution::Failed(_) => "failed",
        }
    }
}
