use async_trait::async_trait;
use linkhop_core::cache::Result;
use linkhop_core::{CachedLink, EdgeCache, Slug};
use moka::future::Cache;
use moka::Expiry;
use std::time::{Duration, Instant};
use tracing::{debug, trace};
use typed_builder::TypedBuilder;

pub const DEFAULT_MAX_CAPACITY: u64 = 100_000;

/// A cached value together with the expiry it was written with.
#[derive(Debug, Clone)]
struct Stored {
    entry: CachedLink,
    expiry: Option<Duration>,
}

/// Per-entry expiry: every write, including an overwrite, restarts the
/// clock with the expiry carried by the new value.
struct WriteExpiry;

impl Expiry<String, Stored> for WriteExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Stored,
        _created_at: Instant,
    ) -> Option<Duration> {
        value.expiry
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Stored,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        value.expiry
    }
}

/// An in-process implementation of [`EdgeCache`] using Moka.
///
/// Suited to single-node deployments and tests. Entries without a TTL are
/// only ever removed by capacity eviction or an explicit delete.
#[derive(Debug, Clone)]
pub struct MokaEdgeCache {
    cache: Cache<String, Stored>,
}

impl MokaEdgeCache {
    /// Creates a new Moka edge cache with default settings.
    ///
    /// The cache will have a default maximum capacity of 100,000 entries.
    pub fn new() -> Self {
        MokaCacheConfig::builder().build().into()
    }

    /// Creates a new Moka edge cache with a custom maximum capacity.
    ///
    /// # Arguments
    ///
    /// * `max_capacity` - Maximum number of entries the cache can hold
    pub fn with_capacity(max_capacity: u64) -> Self {
        MokaCacheConfig::builder()
            .max_capacity(max_capacity)
            .build()
            .into()
    }

    /// Returns a builder for creating a custom cache configuration.
    pub fn builder() -> MokaCacheConfigBuilder {
        MokaCacheConfig::builder()
    }

    /// Number of live entries, after applying pending maintenance.
    pub async fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }

    async fn insert(&self, slug: &Slug, entry: &CachedLink, expiry: Option<Duration>) {
        let stored = Stored {
            entry: entry.clone(),
            expiry,
        };
        self.cache.insert(slug.as_str().to_string(), stored).await;
    }
}

impl Default for MokaEdgeCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EdgeCache for MokaEdgeCache {
    async fn get(&self, slug: &Slug) -> Result<Option<CachedLink>> {
        trace!(slug = %slug, "Fetching link from Moka cache");

        match self.cache.get(slug.as_str()).await {
            Some(stored) => {
                debug!(slug = %slug, "Cache hit in Moka");
                Ok(Some(stored.entry))
            }
            None => {
                trace!(slug = %slug, "Cache miss in Moka");
                Ok(None)
            }
        }
    }

    async fn set_with_expiry(&self, slug: &Slug, entry: &CachedLink, ttl: Duration) -> Result<()> {
        trace!(slug = %slug, ttl_ms = ttl.as_millis() as u64, "Storing expiring link in Moka cache");
        self.insert(slug, entry, Some(ttl)).await;
        debug!(slug = %slug, "Cached link in Moka");
        Ok(())
    }

    async fn set_no_expiry(&self, slug: &Slug, entry: &CachedLink) -> Result<()> {
        trace!(slug = %slug, "Storing persistent link in Moka cache");
        self.insert(slug, entry, None).await;
        debug!(slug = %slug, "Cached link in Moka without expiry");
        Ok(())
    }

    async fn del(&self, slug: &Slug) -> Result<()> {
        trace!(slug = %slug, "Removing link from Moka cache");
        self.cache.invalidate(slug.as_str()).await;
        debug!(slug = %slug, "Removed link from Moka cache (if present)");
        Ok(())
    }
}

/// Configuration for creating a [`MokaEdgeCache`] with custom settings.
#[derive(Debug, TypedBuilder)]
pub struct MokaCacheConfig {
    /// Maximum number of entries the cache can hold.
    #[builder(default = DEFAULT_MAX_CAPACITY)]
    max_capacity: u64,
}

impl From<MokaCacheConfig> for MokaEdgeCache {
    fn from(config: MokaCacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(WriteExpiry)
            .build();
        MokaEdgeCache { cache }
    }
}
