//! Cache expander - stale-while-revalidate fetches with offline fallback.

use crate::backend::StorageBackend;
use crate::connectivity::ConnectivityMonitor;
use crate::error::Result;
use crate::observability::{CacheMetrics, NoOpMetrics, TtlPolicy};
use crate::store::CacheStore;
use crate::strategy::{CacheStrategy, RefreshHandle, Resolution};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Configuration for per-operation overrides.
///
/// # Example
///
/// ```ignore
/// use crud_kit::OperationConfig;
/// use std::time::Duration;
///
/// // Bypass the cache for a pull-to-refresh, keep the result for a minute
/// let config = OperationConfig::default()
///     .with_ttl(Duration::from_secs(60))
///     .force_refresh();
///
/// let users = expander.with_cache("users", fetch_users, config).await?;
/// ```
#[derive(Clone, Debug, Default)]
pub struct OperationConfig {
    /// Override the expander's TTL policy for this operation only.
    ///
    /// - **If `Some(duration)`**: use this override
    /// - **If `None`**: fall back to the expander's `ttl_policy`
    pub ttl_override: Option<Duration>,

    /// Whether cached data may short-circuit the live fetch.
    pub strategy: CacheStrategy,
}

impl OperationConfig {
    /// Override TTL for this operation.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl_override = Some(ttl);
        self
    }

    /// Always run the live fetch, even if a fresh entry exists.
    pub fn force_refresh(mut self) -> Self {
        self.strategy = CacheStrategy::ForceRefresh;
        self
    }

    /// Set the strategy explicitly.
    pub fn with_strategy(mut self, strategy: CacheStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}

/// Core cache expander - decides between cached data, live fetch and fallback.
///
/// Cloning is cheap; clones share the store, connectivity signal and metrics.
///
/// # Example
///
/// ```ignore
/// use crud_kit::{CacheExpander, ConnectivityMonitor, OperationConfig};
/// use crud_kit::backend::InMemoryBackend;
/// use crud_kit::store::CacheStore;
///
/// let expander = CacheExpander::new(
///     CacheStore::new(InMemoryBackend::new()),
///     ConnectivityMonitor::new(),
/// );
///
/// let users: Vec<User> = expander
///     .with_cache("users", || api.get_json("/users"), OperationConfig::default())
///     .await?;
/// ```
#[derive(Clone)]
pub struct CacheExpander<B: StorageBackend> {
    store: CacheStore<B>,
    connectivity: ConnectivityMonitor,
    metrics: Arc<dyn CacheMetrics>,
    pub(crate) ttl_policy: TtlPolicy,
}

impl<B: StorageBackend> CacheExpander<B> {
    /// Create new expander over a store and a connectivity signal.
    pub fn new(store: CacheStore<B>, connectivity: ConnectivityMonitor) -> Self {
        CacheExpander {
            store,
            connectivity,
            metrics: Arc::new(NoOpMetrics),
            ttl_policy: TtlPolicy::default(),
        }
    }

    /// Set custom metrics handler.
    pub fn with_metrics(mut self, metrics: Box<dyn CacheMetrics>) -> Self {
        self.metrics = Arc::from(metrics);
        self
    }

    /// Set custom TTL policy.
    pub fn with_ttl_policy(mut self, policy: TtlPolicy) -> Self {
        self.ttl_policy = policy;
        self
    }

    /// Cache-augmented fetch with the default configuration.
    ///
    /// # Errors
    ///
    /// See [`with_cache`](Self::with_cache).
    pub async fn fetch<T, F, Fut>(&self, key: &str, fetcher: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        self.with_cache(key, fetcher, OperationConfig::default())
            .await
    }

    /// Wrap `fetcher` with the cache entry under `key`.
    ///
    /// 1. Unless forced: online with a fresh entry returns it at once and
    ///    refreshes it in a detached task; offline with any entry returns it
    ///    without fetching.
    /// 2. Otherwise `fetcher` is awaited; success is cached and returned.
    /// 3. On failure any cached value (fresh or expired) is returned.
    ///
    /// `fetcher` is invoked at most once.
    ///
    /// # Errors
    ///
    /// Returns the fetcher's own error, unchanged, when the live fetch failed
    /// and nothing was cached under `key`.
    pub async fn with_cache<T, F, Fut>(
        &self,
        key: &str,
        fetcher: F,
        config: OperationConfig,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        self.resolve(key, fetcher, config).await.into_result()
    }

    /// Same decision as [`with_cache`](Self::with_cache), reported as a [`Resolution`].
    ///
    /// The resolution says where the value came from and carries the handle
    /// of the background refresh when one was spawned.
    pub async fn resolve<T, F, Fut>(
        &self,
        key: &str,
        fetcher: F,
        config: OperationConfig,
    ) -> Resolution<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let timer = Instant::now();
        let ttl = self.ttl_for(key, &config);

        debug!(
            "» Cache operation for key: {} (strategy: {})",
            key, config.strategy
        );

        if config.strategy == CacheStrategy::StaleWhileRevalidate {
            if self.connectivity.is_online() {
                if let Some(entry) = self.store.entry::<T>(key) {
                    if !entry.is_expired(self.store.now()) {
                        debug!("✓ Cache hit for {}, revalidating in background", key);
                        let refresh = self.spawn_refresh(key, fetcher(), ttl);
                        self.metrics.record_hit(key, timer.elapsed());
                        return Resolution::Cached {
                            value: entry.data,
                            refresh,
                        };
                    }
                    debug!("Cache entry for {} expired, fetching", key);
                }
            } else if let Some(value) = self.store.peek_stale::<T>(key) {
                debug!("✓ Offline, serving cached {} without fetching", key);
                self.metrics.record_hit(key, timer.elapsed());
                return Resolution::Offline(value);
            }
        }

        match fetcher().await {
            Ok(data) => {
                self.store.set(key, &data, Some(ttl));
                self.metrics.record_set(key);
                self.metrics.record_miss(key, timer.elapsed());
                info!("✓ Live fetch for {} succeeded in {:?}", key, timer.elapsed());
                Resolution::Live(data)
            }
            Err(error) => match self.store.peek_stale::<T>(key) {
                Some(value) => {
                    warn!("Live fetch for {} failed ({}), serving cached data", key, error);
                    self.metrics.record_stale_fallback(key, &error.to_string());
                    Resolution::Stale { value, error }
                }
                None => {
                    self.metrics.record_error(key, &error.to_string());
                    Resolution::Failed(error)
                }
            },
        }
    }

    /// Spawn the detached refresh. Its outcome only ever reaches the store.
    fn spawn_refresh<T, Fut>(&self, key: &str, pending: Fut, ttl: Duration) -> RefreshHandle
    where
        T: Serialize + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let store = self.store.clone();
        let metrics = Arc::clone(&self.metrics);
        let key = key.to_string();

        tokio::spawn(async move {
            match pending.await {
                Ok(data) => {
                    store.set(&key, &data, Some(ttl));
                    metrics.record_refresh(&key, true);
                }
                Err(e) => {
                    debug!("Background refresh for {} failed: {}", key, e);
                    metrics.record_refresh(&key, false);
                }
            }
        })
    }

    fn ttl_for(&self, key: &str, config: &OperationConfig) -> Duration {
        config
            .ttl_override
            .unwrap_or_else(|| self.ttl_policy.get_ttl(key))
    }

    /// Get store reference.
    pub fn store(&self) -> &CacheStore<B> {
        &self.store
    }

    /// Get connectivity reference.
    pub fn connectivity(&self) -> &ConnectivityMonitor {
        &self.connectivity
    }
}
