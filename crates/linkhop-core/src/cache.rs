use crate::error::CacheError;
use crate::link::CachedLink;
use crate::slug::Slug;
use async_trait::async_trait;
use std::time::Duration;

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

/// A TTL-aware cache for the projection of links, keyed by [`Slug`].
///
/// Implementations can use Redis, in-memory caches, or other storage
/// backends. Callers on the request path treat every error as a soft
/// failure.
#[async_trait]
pub trait EdgeCache: Send + Sync + 'static {
    /// Get a cached link.
    ///
    /// Returns `Ok(None)` if the key is not in the cache. A value that cannot
    /// be decoded is reported as [`CacheError::InvalidData`].
    async fn get(&self, slug: &Slug) -> Result<Option<CachedLink>>;

    /// Store an entry that expires `ttl` after this write.
    async fn set_with_expiry(&self, slug: &Slug, entry: &CachedLink, ttl: Duration) -> Result<()>;

    /// Store an entry that never expires on its own.
    async fn set_no_expiry(&self, slug: &Slug, entry: &CachedLink) -> Result<()>;

    /// Remove an entry. It is not an error if the key does not exist.
    async fn del(&self, slug: &Slug) -> Result<()>;

    /// Store an entry with the expiry its own TTL dictates: a finite TTL
    /// expires that many seconds from now, an absent TTL never expires.
    async fn put(&self, slug: &Slug, entry: &CachedLink) -> Result<()> {
        match entry.expiry() {
            Some(ttl) => self.set_with_expiry(slug, entry, ttl).await,
            None => self.set_no_expiry(slug, entry).await,
        }
    }
}
