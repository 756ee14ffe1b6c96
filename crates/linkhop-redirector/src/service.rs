use std::sync::Arc;

use crate::recorder::{ClickRecorder, RecorderConfig};
use crate::redirector::Redirector;
use crate::{RedirectorError, Result};
use async_trait::async_trait;
use linkhop_core::{CacheError, CachedLink, EdgeCache, LinkStore, Slug, Visit};
use tracing::{debug, trace, warn};

/// Cache-aside resolution of slugs.
///
/// The cache is advisory: a read error or an undecodable entry is treated as
/// a miss, and a failed repopulation is logged and ignored. Only the store
/// decides whether a slug exists, and lookups that find nothing are never
/// cached.
pub struct ResolverService<S: ?Sized, C: ?Sized> {
    store: Arc<S>,
    cache: Arc<C>,
    recorder: ClickRecorder<S>,
}

impl<S: ?Sized, C: ?Sized> Clone for ResolverService<S, C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            cache: Arc::clone(&self.cache),
            recorder: self.recorder.clone(),
        }
    }
}

impl<S: LinkStore + ?Sized, C: EdgeCache + ?Sized> ResolverService<S, C> {
    pub fn new(store: Arc<S>, cache: Arc<C>, recorder: RecorderConfig) -> Self {
        let recorder = ClickRecorder::new(Arc::clone(&store), recorder);
        Self {
            store,
            cache,
            recorder,
        }
    }

    /// The recorder fed by this service, for draining and counters.
    pub fn recorder(&self) -> &ClickRecorder<S> {
        &self.recorder
    }

    async fn cached(&self, slug: &Slug) -> Option<CachedLink> {
        match self.cache.get(slug).await {
            Ok(hit) => hit,
            Err(CacheError::InvalidData(reason)) => {
                warn!(slug = %slug, reason = %reason, "Malformed cache entry, treating as miss");
                None
            }
            Err(e) => {
                warn!(slug = %slug, error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }
}

#[async_trait]
impl<S: LinkStore + ?Sized, C: EdgeCache + ?Sized> Redirector for ResolverService<S, C> {
    async fn resolve(&self, slug: &Slug, visit: Visit) -> Result<String> {
        if slug.is_empty() {
            return Err(RedirectorError::NotFound(String::new()));
        }
        trace!(slug = %slug, "Resolving slug");

        if let Some(entry) = self.cached(slug).await {
            debug!(slug = %slug, "Cache hit");
            self.recorder.submit(slug.clone(), visit);
            return Ok(entry.url);
        }

        trace!(slug = %slug, "Cache miss, reading link store");
        let link = self
            .store
            .get_by_slug(slug)
            .await?
            .ok_or_else(|| RedirectorError::NotFound(slug.to_string()))?;

        let entry = CachedLink::from(&link);
        match self.cache.put(slug, &entry).await {
            Ok(()) => debug!(slug = %slug, ttl = ?entry.ttl.map(|t| t.as_secs()), "Cache repopulated"),
            Err(e) => warn!(slug = %slug, error = %e, "Failed to repopulate cache"),
        }

        self.recorder.submit(slug.clone(), visit);
        Ok(link.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkhop_cache::MokaEdgeCache;
    use linkhop_core::{Link, LinkId, NewLink, StorageError, Ttl};
    use linkhop_storage::InMemoryLinkStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    type Service = ResolverService<InMemoryLinkStore, MokaEdgeCache>;

    fn slug(s: &str) -> Slug {
        Slug::new_unchecked(s)
    }

    async fn setup(links: &[(&str, &str, Option<u64>)]) -> (Service, Arc<InMemoryLinkStore>, Arc<MokaEdgeCache>) {
        let store = Arc::new(InMemoryLinkStore::new());
        for (s, url, ttl) in links {
            store
                .create_link(NewLink {
                    slug: slug(s),
                    url: url.to_string(),
                    ttl: ttl.map(|secs| Ttl::from_secs(secs).unwrap()),
                })
                .await
                .unwrap();
        }
        let cache = Arc::new(MokaEdgeCache::new());
        let service = ResolverService::new(
            Arc::clone(&store),
            Arc::clone(&cache),
            RecorderConfig::default(),
        );
        (service, store, cache)
    }

    /// A cache whose every operation fails.
    struct DownCache;

    #[async_trait]
    impl EdgeCache for DownCache {
        async fn get(&self, _: &Slug) -> linkhop_core::cache::Result<Option<CachedLink>> {
            Err(CacheError::Unavailable("connection refused".into()))
        }

        async fn set_with_expiry(
            &self,
            _: &Slug,
            _: &CachedLink,
            _: Duration,
        ) -> linkhop_core::cache::Result<()> {
            Err(CacheError::Unavailable("connection refused".into()))
        }

        async fn set_no_expiry(&self, _: &Slug, _: &CachedLink) -> linkhop_core::cache::Result<()> {
            Err(CacheError::Unavailable("connection refused".into()))
        }

        async fn del(&self, _: &Slug) -> linkhop_core::cache::Result<()> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
    }

    /// A cache holding an entry that cannot be decoded.
    struct GarbledCache;

    #[async_trait]
    impl EdgeCache for GarbledCache {
        async fn get(&self, _: &Slug) -> linkhop_core::cache::Result<Option<CachedLink>> {
            Err(CacheError::InvalidData("expected value at line 1 column 1".into()))
        }

        async fn set_with_expiry(
            &self,
            _: &Slug,
            _: &CachedLink,
            _: Duration,
        ) -> linkhop_core::cache::Result<()> {
            Ok(())
        }

        async fn set_no_expiry(&self, _: &Slug, _: &CachedLink) -> linkhop_core::cache::Result<()> {
            Ok(())
        }

        async fn del(&self, _: &Slug) -> linkhop_core::cache::Result<()> {
            Ok(())
        }
    }

    /// A store that is unreachable and counts how often it was asked.
    #[derive(Default)]
    struct DownStore {
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl LinkStore for DownStore {
        async fn get_by_slug(&self, _: &Slug) -> linkhop_core::store::Result<Option<Link>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Err(StorageError::Unavailable("pool closed".into()))
        }

        async fn create_link(&self, _: NewLink) -> linkhop_core::store::Result<Link> {
            Err(StorageError::Unavailable("pool closed".into()))
        }

        async fn record_click(
            &self,
            _: LinkId,
            _: Visit,
            _: Duration,
        ) -> linkhop_core::store::Result<()> {
            Err(StorageError::Unavailable("pool closed".into()))
        }

        async fn count_clicks_since(
            &self,
            _: LinkId,
            _: jiff::Timestamp,
        ) -> linkhop_core::store::Result<u64> {
            Err(StorageError::Unavailable("pool closed".into()))
        }
    }

    #[tokio::test]
    async fn miss_reads_store_and_populates_cache() {
        let (service, _store, cache) = setup(&[("abc123", "https://example.com", Some(60))]).await;

        let url = service.resolve(&slug("abc123"), Visit::default()).await.unwrap();
        assert_eq!(url, "https://example.com");

        let cached = cache.get(&slug("abc123")).await.unwrap().unwrap();
        assert_eq!(cached.url, "https://example.com");
        assert_eq!(cached.ttl.map(|t| t.as_secs()), Some(60));
    }

    #[tokio::test]
    async fn hit_is_served_without_the_store() {
        let store = Arc::new(DownStore::default());
        let cache = Arc::new(MokaEdgeCache::new());
        cache
            .set_no_expiry(
                &slug("cached"),
                &CachedLink {
                    url: "https://cached.example".to_string(),
                    ttl: None,
                },
            )
            .await
            .unwrap();
        let service = ResolverService::new(Arc::clone(&store), cache, RecorderConfig::default());

        let url = service.resolve(&slug("cached"), Visit::default()).await.unwrap();
        assert_eq!(url, "https://cached.example");

        // Only the recorder's lookup may have reached the store.
        service.recorder().wait_idle().await;
        assert_eq!(store.lookups.load(Ordering::SeqCst), 1);
        assert_eq!(service.recorder().stats().failed, 1);
    }

    #[tokio::test]
    async fn unknown_slug_is_not_found_and_not_cached() {
        let (service, _store, cache) = setup(&[]).await;

        let err = service.resolve(&slug("nope"), Visit::default()).await.unwrap_err();
        assert!(err.is_not_found());

        assert!(cache.get(&slug("nope")).await.unwrap().is_none());
        assert_eq!(cache.entry_count().await, 0);
    }

    #[tokio::test]
    async fn empty_slug_is_not_found() {
        let (service, _store, _cache) = setup(&[]).await;

        let err = service.resolve(&slug(""), Visit::default()).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(service.recorder().stats().submitted, 0);
    }

    #[tokio::test]
    async fn store_failure_is_surfaced_as_unavailable() {
        let store = Arc::new(DownStore::default());
        let service = ResolverService::new(
            store,
            Arc::new(MokaEdgeCache::new()),
            RecorderConfig::default(),
        );

        let err = service.resolve(&slug("abc123"), Visit::default()).await.unwrap_err();
        assert!(matches!(err, RedirectorError::Storage(StorageError::Unavailable(_))));
    }

    #[tokio::test]
    async fn cache_outage_falls_back_to_store() {
        let store = Arc::new(InMemoryLinkStore::new());
        store
            .create_link(NewLink {
                slug: slug("abc123"),
                url: "https://example.com".to_string(),
                ttl: Some(Ttl::from_secs(5).unwrap()),
            })
            .await
            .unwrap();
        let service = ResolverService::new(Arc::clone(&store), Arc::new(DownCache), RecorderConfig::default());

        let url = service.resolve(&slug("abc123"), Visit::default()).await.unwrap();
        assert_eq!(url, "https://example.com");

        service.recorder().wait_idle().await;
        let link = store.get_by_slug(&slug("abc123")).await.unwrap().unwrap();
        assert_eq!(link.clicks, 1);
    }

    #[tokio::test]
    async fn malformed_cache_entry_is_a_miss() {
        let store = Arc::new(InMemoryLinkStore::new());
        store
            .create_link(NewLink {
                slug: slug("abc123"),
                url: "https://example.com".to_string(),
                ttl: None,
            })
            .await
            .unwrap();
        let service = ResolverService::new(store, Arc::new(GarbledCache), RecorderConfig::default());

        let url = service.resolve(&slug("abc123"), Visit::default()).await.unwrap();
        assert_eq!(url, "https://example.com");
    }

    #[tokio::test]
    async fn miss_redirects_to_destination_not_slug() {
        let (service, _store, _cache) = setup(&[("go", "https://dest.example/path?q=1", None)]).await;

        let url = service.resolve(&slug("go"), Visit::default()).await.unwrap();
        assert_eq!(url, "https://dest.example/path?q=1");
    }

    #[tokio::test]
    async fn concurrent_resolutions_are_all_counted() {
        let (service, store, _cache) = setup(&[("hot", "https://example.com", None)]).await;
        let service = Arc::new(service);

        let mut handles = vec![];
        for i in 0..50 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move {
                let visit = Visit {
                    ip: Some(format!("192.0.2.{i}")),
                    ..Visit::default()
                };
                service.resolve(&slug("hot"), visit).await
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "https://example.com");
        }

        service.recorder().wait_idle().await;
        let link = store.get_by_slug(&slug("hot")).await.unwrap().unwrap();
        assert_eq!(link.clicks, 50);
        assert_eq!(store.click_events(link.id).len(), 50);
    }

    #[tokio::test]
    async fn slow_click_write_does_not_delay_the_redirect() {
        let store = Arc::new(
            InMemoryLinkStore::new().with_write_latency(Duration::from_millis(300)),
        );
        store
            .create_link(NewLink {
                slug: slug("slow"),
                url: "https://example.com".to_string(),
                ttl: None,
            })
            .await
            .unwrap();
        let config = RecorderConfig::builder()
            .deadline(Duration::from_millis(50))
            .build();
        let service = ResolverService::new(Arc::clone(&store), Arc::new(MokaEdgeCache::new()), config);

        let started = tokio::time::Instant::now();
        service.resolve(&slug("slow"), Visit::default()).await.unwrap();
        assert!(started.elapsed() < Duration::from_millis(300));

        service.recorder().wait_idle().await;
        let link = store.get_by_slug(&slug("slow")).await.unwrap().unwrap();
        assert_eq!(link.clicks, 0);
        assert_eq!(service.recorder().stats().failed, 1);
    }

    #[tokio::test]
    async fn expired_cache_entry_is_reprimed_from_store() {
        let (service, _store, cache) = setup(&[("brief", "https://example.com", Some(1))]).await;

        service.resolve(&slug("brief"), Visit::default()).await.unwrap();
        assert!(cache.get(&slug("brief")).await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(1_200)).await;
        assert!(cache.get(&slug("brief")).await.unwrap().is_none());

        let url = service.resolve(&slug("brief"), Visit::default()).await.unwrap();
        assert_eq!(url, "https://example.com");
        let cached = cache.get(&slug("brief")).await.unwrap().unwrap();
        assert_eq!(cached.ttl.map(|t| t.as_secs()), Some(1));
    }
}
