//! Time-bounded model registry cache.
//!
//! Serves the model list from memory while it is fresh, revalidates in
//! the background once the TTL lapses (stale-while-revalidate), and
//! collapses concurrent refreshes into a single fetch (single-flight).
//!
//! `get_models` never fails outright: on fetch failure the last good
//! list is served (empty if none exists yet) and the failure is logged.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tokio::time::Instant;
use tracing::{debug, warn};

use chorus_types::config::ChorusConfig;
use chorus_types::model::ModelDescriptor;

use super::catalog::ModelCatalog;

/// Default freshness window for a fetched model list.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

type RefreshFuture = Shared<BoxFuture<'static, Vec<ModelDescriptor>>>;

/// TTL'd cache over a [`ModelCatalog`].
///
/// Constructed once at application start and handed around by reference
/// (or cheap clone); there is no ambient global state. Time comes from
/// `tokio::time`, so paused-clock tests exercise the TTL directly.
pub struct ModelRegistryCache<C> {
    inner: Arc<Inner<C>>,
}

impl<C> Clone for ModelRegistryCache<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<C> {
    catalog: C,
    ttl: Duration,
    state: Mutex<CacheState>,
}

struct CacheState {
    entry: Option<CacheEntry>,
    /// The one in-flight refresh, shared by all concurrent callers.
    inflight: Option<RefreshFuture>,
}

struct CacheEntry {
    models: Vec<ModelDescriptor>,
    fetched_at: Instant,
    /// Set by `force_refresh`; treated as past-TTL regardless of age.
    invalidated: bool,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        !self.invalidated && self.fetched_at.elapsed() < ttl
    }
}

impl<C: ModelCatalog + 'static> ModelRegistryCache<C> {
    /// Create a cache with the given TTL.
    pub fn new(catalog: C, ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                catalog,
                ttl,
                state: Mutex::new(CacheState {
                    entry: None,
                    inflight: None,
                }),
            }),
        }
    }

    /// Create a cache with the TTL from configuration.
    pub fn from_config(catalog: C, config: &ChorusConfig) -> Self {
        Self::new(catalog, Duration::from_secs(config.registry_ttl_secs))
    }

    /// Current list of available models.
    ///
    /// - Fresh cache: returns the cached list.
    /// - Stale cache: returns the stale list immediately and revalidates
    ///   in the background.
    /// - Cold cache: awaits the fetch (shared with any concurrent caller).
    ///
    /// Never returns an error; fetch failures fall back to the last good
    /// list and are logged.
    pub async fn get_models(&self) -> Vec<ModelDescriptor> {
        let (stale, refresh) = {
            let mut state = self.inner.state.lock().expect("registry cache lock poisoned");

            if let Some(entry) = &state.entry {
                if entry.is_fresh(self.inner.ttl) {
                    return entry.models.clone();
                }
            }

            let stale = state.entry.as_ref().map(|e| e.models.clone());
            let refresh = match &state.inflight {
                Some(inflight) => inflight.clone(),
                None => {
                    let fut = Self::refresh_future(Arc::clone(&self.inner));
                    state.inflight = Some(fut.clone());
                    fut
                }
            };
            (stale, refresh)
        };

        match stale {
            // Stale-while-revalidate: serve the previous list without
            // blocking while the refresh completes in the background.
            Some(models) => {
                tokio::spawn(refresh);
                models
            }
            None => refresh.await,
        }
    }

    /// Models the user may mount for a turn with the given needs.
    ///
    /// Filters by the `accessible` entitlement flag and, when the turn
    /// carries image input, the vision capability.
    pub async fn eligible_models(&self, needs_vision: bool) -> Vec<ModelDescriptor> {
        self.get_models()
            .await
            .into_iter()
            .filter(|m| m.eligible(needs_vision))
            .collect()
    }

    /// Invalidate the TTL so the next `get_models` call refreshes.
    pub fn force_refresh(&self) {
        let mut state = self.inner.state.lock().expect("registry cache lock poisoned");
        if let Some(entry) = state.entry.as_mut() {
            entry.invalidated = true;
        }
    }

    /// Build the shared refresh future.
    ///
    /// On success the cache entry is replaced wholesale. On failure the
    /// previous entry (and its timestamp) is left untouched, so the next
    /// read past the TTL retries.
    fn refresh_future(inner: Arc<Inner<C>>) -> RefreshFuture {
        async move {
            let result = inner.catalog.fetch_models().await;
            let mut state = inner.state.lock().expect("registry cache lock poisoned");
            state.inflight = None;
            match result {
                Ok(models) => {
                    debug!(count = models.len(), "model list refreshed");
                    state.entry = Some(CacheEntry {
                        models: models.clone(),
                        fetched_at: Instant::now(),
                        invalidated: false,
                    });
                    models
                }
                Err(err) => {
                    warn!(error = %err, "model list refresh failed; serving last good list");
                    state
                        .entry
                        .as_ref()
                        .map(|e| e.models.clone())
                        .unwrap_or_default()
                }
            }
        }
        .boxed()
        .shared()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chorus_types::error::RegistryError;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn model(id: &str) -> ModelDescriptor {
        ModelDescriptor {
            id: id.to_string(),
            display_name: id.to_string(),
            provider: "test".to_string(),
            capabilities: Default::default(),
            accessible: true,
            context_window: 8192,
        }
    }

    /// Catalog that pops one scripted response per fetch and counts calls.
    struct ScriptedCatalog {
        calls: AtomicUsize,
        responses: Mutex<VecDeque<Result<Vec<ModelDescriptor>, RegistryError>>>,
    }

    impl ScriptedCatalog {
        fn new(
            responses: impl IntoIterator<Item = Result<Vec<ModelDescriptor>, RegistryError>>,
        ) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                responses: Mutex::new(responses.into_iter().collect()),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ModelCatalog for Arc<ScriptedCatalog> {
        async fn fetch_models(&self) -> Result<Vec<ModelDescriptor>, RegistryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            // Suspension point so concurrent callers genuinely overlap.
            tokio::task::yield_now().await;
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(RegistryError::Request("script exhausted".to_string())))
        }
    }

    fn cache_with(
        responses: impl IntoIterator<Item = Result<Vec<ModelDescriptor>, RegistryError>>,
        ttl: Duration,
    ) -> (ModelRegistryCache<Arc<ScriptedCatalog>>, Arc<ScriptedCatalog>) {
        let catalog = Arc::new(ScriptedCatalog::new(responses));
        (ModelRegistryCache::new(Arc::clone(&catalog), ttl), catalog)
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_read_does_not_refetch() {
        let ttl = Duration::from_secs(300);
        let (cache, catalog) = cache_with([Ok(vec![model("a:1")])], ttl);

        let first = cache.get_models().await;
        assert_eq!(first.len(), 1);
        assert_eq!(catalog.calls(), 1);

        tokio::time::advance(ttl - Duration::from_millis(1)).await;

        let second = cache.get_models().await;
        assert_eq!(second, first);
        assert_eq!(catalog.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cold_concurrent_reads_share_one_fetch() {
        let (cache, catalog) = cache_with([Ok(vec![model("a:1")])], DEFAULT_TTL);

        let (r1, r2, r3) = tokio::join!(cache.get_models(), cache.get_models(), cache.get_models());
        assert_eq!(r1.len(), 1);
        assert_eq!(r2, r1);
        assert_eq!(r3, r1);
        assert_eq!(catalog.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_concurrent_reads_trigger_exactly_one_refresh() {
        let ttl = Duration::from_secs(300);
        let (cache, catalog) = cache_with(
            [Ok(vec![model("a:1")]), Ok(vec![model("a:2")])],
            ttl,
        );

        cache.get_models().await;
        tokio::time::advance(ttl + Duration::from_millis(1)).await;

        let (r1, r2, r3) = tokio::join!(cache.get_models(), cache.get_models(), cache.get_models());
        // All serve the stale list while the shared refresh is in flight.
        assert_eq!(r1[0].id, "a:1");
        assert_eq!(r2[0].id, "a:1");
        assert_eq!(r3[0].id, "a:1");

        // Let the background refresh run to completion.
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        assert_eq!(catalog.calls(), 2);
        assert_eq!(cache.get_models().await[0].id, "a:2");
    }

    #[tokio::test(start_paused = true)]
    async fn stale_read_serves_old_list_immediately() {
        let ttl = Duration::from_secs(60);
        let (cache, catalog) = cache_with(
            [Ok(vec![model("a:1")]), Ok(vec![model("a:2")])],
            ttl,
        );

        cache.get_models().await;
        tokio::time::advance(ttl + Duration::from_secs(1)).await;

        let stale = cache.get_models().await;
        assert_eq!(stale[0].id, "a:1");

        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        let fresh = cache.get_models().await;
        assert_eq!(fresh[0].id, "a:2");
        assert_eq!(catalog.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_failure_serves_last_good_list() {
        let ttl = Duration::from_secs(60);
        let (cache, catalog) = cache_with(
            [
                Ok(vec![model("a:1")]),
                Err(RegistryError::Request("network down".to_string())),
            ],
            ttl,
        );

        cache.get_models().await;
        tokio::time::advance(ttl + Duration::from_secs(1)).await;

        let stale = cache.get_models().await;
        assert_eq!(stale[0].id, "a:1");

        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        // Refresh failed; the last good list is still served.
        assert_eq!(cache.get_models().await[0].id, "a:1");
        assert!(catalog.calls() >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cold_fetch_failure_returns_empty_list() {
        let (cache, catalog) = cache_with(
            [Err(RegistryError::Request("network down".to_string()))],
            DEFAULT_TTL,
        );

        let models = cache.get_models().await;
        assert!(models.is_empty());
        assert_eq!(catalog.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn force_refresh_invalidates_fresh_entry() {
        let (cache, catalog) = cache_with(
            [Ok(vec![model("a:1")]), Ok(vec![model("a:2")])],
            DEFAULT_TTL,
        );

        cache.get_models().await;
        assert_eq!(catalog.calls(), 1);

        cache.force_refresh();
        // Stale-while-revalidate still applies: old list now, new list
        // once the refresh lands.
        assert_eq!(cache.get_models().await[0].id, "a:1");
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        assert_eq!(cache.get_models().await[0].id, "a:2");
        assert_eq!(catalog.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn eligible_models_filters_access_and_vision() {
        let mut visionless = model("a:1");
        visionless.capabilities.vision = false;
        let mut vision = model("a:2");
        vision.capabilities.vision = true;
        let mut locked = model("a:3");
        locked.capabilities.vision = true;
        locked.accessible = false;

        let (cache, _) = cache_with(
            [Ok(vec![visionless, vision, locked])],
            DEFAULT_TTL,
        );

        let for_text = cache.eligible_models(false).await;
        assert_eq!(for_text.len(), 2);

        let for_images = cache.eligible_models(true).await;
        assert_eq!(for_images.len(), 1);
        assert_eq!(for_images[0].id, "a:2");
    }
}
