//! Session state shared by the CLI and the MCP server.
//!
//! `VaultState` owns the current catalog snapshot, the blob fetcher, an LRU
//! cache of fetched content and the set of fetches currently in progress.
//! Concurrent requests for the same file id await one shared future.

use crate::catalog::{Catalog, DataSource};
use crate::error::{CatalogError, FetchError};
use crate::fetch::BlobFetcher;
use crate::search::Vocabulary;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::time::{Duration, MissedTickBehavior, interval};

/// Fetched file content, shared between the cache and callers.
pub type Blob = Arc<Vec<u8>>;

type SharedFetch = Shared<BoxFuture<'static, Result<Blob, FetchError>>>;

pub struct VaultState {
    /// Snapshot searched by every query; swapped wholesale on reload.
    catalog: RwLock<Arc<Catalog>>,

    /// Where the catalog is re-read from on refresh
    source: Option<Arc<dyn DataSource>>,

    vocabulary: Arc<Vocabulary>,

    default_limit: usize,

    fetcher: Arc<dyn BlobFetcher>,

    /// Successfully fetched content by file id
    cache: Mutex<LruCache<String, Blob>>,

    /// Fetches in progress (can be awaited by multiple callers)
    in_flight: Mutex<HashMap<String, SharedFetch>>,
}

impl std::fmt::Debug for VaultState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultState")
            .field(
                "catalog_len",
                &self.catalog.try_read().map(|c| c.len()).ok(),
            )
            .field("cache_len", &self.cache.try_lock().map(|c| c.len()).ok())
            .field(
                "in_flight_count",
                &self.in_flight.try_lock().map(|m| m.len()).ok(),
            )
            .field("has_source", &self.source.is_some())
            .field("default_limit", &self.default_limit)
            .finish_non_exhaustive()
    }
}

impl VaultState {
    /// Create a session. A `cache_size` of zero is treated as one.
    pub fn new(
        catalog: Catalog,
        vocabulary: Vocabulary,
        default_limit: usize,
        fetcher: Arc<dyn BlobFetcher>,
        cache_size: usize,
    ) -> Self {
        let capacity = NonZeroUsize::new(cache_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            catalog: RwLock::new(Arc::new(catalog)),
            source: None,
            vocabulary: Arc::new(vocabulary),
            default_limit,
            fetcher,
            cache: Mutex::new(LruCache::new(capacity)),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Remember the data source the catalog came from so [`Self::refresh`] can re-read it.
    #[must_use]
    pub fn with_source(mut self, source: Arc<dyn DataSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Current catalog snapshot. Searches keep using it even if a reload
    /// happens meanwhile.
    pub async fn catalog(&self) -> Arc<Catalog> {
        Arc::clone(&*self.catalog.read().await)
    }

    pub async fn replace_catalog(&self, catalog: Catalog) {
        *self.catalog.write().await = Arc::new(catalog);
    }

    /// Reload the catalog from `source`. On failure the previous snapshot stays.
    pub async fn reload(&self, source: &dyn DataSource) -> Result<usize, CatalogError> {
        let catalog = Catalog::load(source)?;
        let len = catalog.len();
        self.replace_catalog(catalog).await;
        tracing::info!("Catalog reloaded with {} entries", len);
        Ok(len)
    }

    /// Re-read the catalog from the remembered data source.
    ///
    /// Returns `Ok(None)` when the session was built without one.
    pub async fn refresh(&self) -> Result<Option<usize>, CatalogError> {
        match &self.source {
            Some(source) => self.reload(source.as_ref()).await.map(Some),
            None => Ok(None),
        }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub const fn default_limit(&self) -> usize {
        self.default_limit
    }

    /// Get content for a file id, waiting for an in-flight fetch if needed.
    ///
    /// 1. Checks the LRU cache
    /// 2. Joins a fetch already in progress for the same id
    /// 3. Starts a new fetch otherwise
    ///
    /// Failures are returned to every waiter but never cached.
    pub async fn fetch(&self, id: &str) -> Result<Blob, FetchError> {
        let id = id.trim();

        if let Some(blob) = self.cache.lock().await.get(id) {
            tracing::debug!("Cache hit for {}", id);
            return Ok(Arc::clone(blob));
        }

        let future = {
            let mut in_flight = self.in_flight.lock().await;
            if let Some(future) = in_flight.get(id) {
                tracing::debug!("Awaiting in-flight fetch for {}", id);
                future.clone()
            } else {
                // A fetch may have completed since the cache check above.
                if let Some(blob) = self.cache.lock().await.get(id) {
                    return Ok(Arc::clone(blob));
                }
                let fetcher = Arc::clone(&self.fetcher);
                let owned_id = id.to_string();
                let fetch: BoxFuture<'static, Result<Blob, FetchError>> = Box::pin(async move {
                    fetcher.fetch_content(&owned_id).await.map(Arc::new)
                });
                let shared = fetch.shared();
                in_flight.insert(id.to_string(), shared.clone());
                shared
            }
        };

        let result = future.clone().await;

        // Cache before retiring the in-flight entry so no caller sees neither.
        match &result {
            Ok(blob) => {
                self.cache.lock().await.put(id.to_string(), Arc::clone(blob));
            }
            Err(e) => tracing::debug!("Fetch failed for {}: {}", id, e),
        }

        {
            let mut in_flight = self.in_flight.lock().await;
            if in_flight.get(id).is_some_and(|f| f.ptr_eq(&future)) {
                in_flight.remove(id);
            }
        }

        result
    }

    pub async fn is_cached(&self, id: &str) -> bool {
        self.cache.lock().await.contains(id)
    }

    #[cfg(test)]
    pub(crate) async fn is_fetching(&self, id: &str) -> bool {
        self.in_flight.lock().await.contains_key(id)
    }

    /// Drop all cached content. Fetches in progress are left to finish.
    pub async fn clear_cache(&self) {
        self.cache.lock().await.clear();
    }
}

/// Periodically re-read the catalog so a long-running server picks up new entries.
///
/// A failed refresh keeps the previous snapshot. The task ends when the
/// session has no data source.
pub fn spawn_refresh_task(state: Arc<VaultState>, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately and the catalog was just loaded.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match state.refresh().await {
                Ok(Some(_)) => {}
                Ok(None) => {
                    tracing::debug!("No catalog source, stopping refresh task");
                    return;
                }
                Err(e) => tracing::warn!("Catalog refresh failed, keeping previous snapshot: {}", e),
            }
        }
    })
}
