use async_trait::async_trait;
use linkhop_core::cache::Result;
use linkhop_core::{CacheError, CachedLink, EdgeCache, Slug};
use redis::AsyncCommands;
use std::time::Duration;
use tracing::{debug, trace, warn};

pub const DEFAULT_KEY_PREFIX: &str = "link:";

/// A Redis-based implementation of [`EdgeCache`].
///
/// Entries are stored as JSON strings (`{"url": ..., "ttl": ...}`) under
/// `<prefix><slug>`. Finite TTLs are written with `SET ... EX`, so expiry is
/// enforced by Redis itself.
#[derive(Debug, Clone)]
pub struct RedisEdgeCache {
    conn: redis::aio::MultiplexedConnection,
    key_prefix: String,
}

fn map_redis_error(operation: &str, err: redis::RedisError) -> CacheError {
    let message = format!("{operation}: {err}");
    let lowered = message.to_ascii_lowercase();
    if lowered.contains("timed out") {
        CacheError::Timeout(message)
    } else if lowered.contains("connection refused") || lowered.contains("broken pipe") {
        CacheError::Unavailable(message)
    } else {
        CacheError::Operation(message)
    }
}

impl RedisEdgeCache {
    /// Creates a new Redis edge cache.
    ///
    /// # Arguments
    ///
    /// * `conn` - A multiplexed Redis connection
    pub fn new(conn: redis::aio::MultiplexedConnection) -> Self {
        Self::with_prefix(conn, DEFAULT_KEY_PREFIX)
    }

    /// Creates a new Redis edge cache with a custom key prefix.
    ///
    /// # Arguments
    ///
    /// * `conn` - A multiplexed Redis connection
    /// * `key_prefix` - Custom prefix for cache keys (e.g., "myapp:link:")
    pub fn with_prefix(
        conn: redis::aio::MultiplexedConnection,
        key_prefix: impl Into<String>,
    ) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.into(),
        }
    }

    /// Opens a client for `redis_url` and establishes a multiplexed connection.
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| CacheError::Initialization(format!("invalid redis url: {e}")))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| map_redis_error("failed to connect to Redis", e))?;
        Ok(Self::new(conn))
    }

    /// Generates the cache key for a slug.
    pub fn cache_key(&self, slug: &Slug) -> String {
        format!("{}{}", self.key_prefix, slug.as_str())
    }

    fn encode(slug: &Slug, entry: &CachedLink) -> Result<String> {
        serde_json::to_string(entry).map_err(|e| {
            warn!(slug = %slug, error = %e, "Failed to serialize entry for caching");
            CacheError::Serialization(format!("failed to serialize cache value: {e}"))
        })
    }
}

#[async_trait]
impl EdgeCache for RedisEdgeCache {
    async fn get(&self, slug: &Slug) -> Result<Option<CachedLink>> {
        let key = self.cache_key(slug);
        trace!(slug = %slug, "Fetching link from Redis cache");

        let mut conn = self.conn.clone();
        match conn.get::<_, Option<String>>(&key).await {
            Ok(Some(cached)) => match serde_json::from_str::<CachedLink>(&cached) {
                Ok(entry) => {
                    debug!(slug = %slug, "Cache hit in Redis");
                    Ok(Some(entry))
                }
                Err(e) => {
                    warn!(slug = %slug, error = %e, "Failed to deserialize cached link");
                    Err(CacheError::InvalidData(format!(
                        "invalid cached value for key '{key}': {e}"
                    )))
                }
            },
            Ok(None) => {
                trace!(slug = %slug, "Cache miss in Redis");
                Ok(None)
            }
            Err(e) => {
                warn!(slug = %slug, error = %e, "Redis error on get");
                Err(map_redis_error("failed to fetch value from Redis", e))
            }
        }
    }

    async fn set_with_expiry(&self, slug: &Slug, entry: &CachedLink, ttl: Duration) -> Result<()> {
        let key = self.cache_key(slug);
        let json = Self::encode(slug, entry)?;
        // EX takes whole seconds; never round a sub-second TTL down to "no expiry".
        let seconds = ttl.as_secs().max(1);
        trace!(slug = %slug, seconds, "Storing expiring link in Redis cache");

        let mut conn = self.conn.clone();
        match conn.set_ex::<_, _, ()>(&key, json, seconds).await {
            Ok(()) => {
                debug!(slug = %slug, seconds, "Cached link in Redis");
                Ok(())
            }
            Err(e) => {
                warn!(slug = %slug, error = %e, "Failed to cache link in Redis");
                Err(map_redis_error("failed to write value to Redis", e))
            }
        }
    }

    async fn set_no_expiry(&self, slug: &Slug, entry: &CachedLink) -> Result<()> {
        let key = self.cache_key(slug);
        let json = Self::encode(slug, entry)?;
        trace!(slug = %slug, "Storing persistent link in Redis cache");

        // Plain SET also clears any TTL left by a previous write of this key.
        let mut conn = self.conn.clone();
        match conn.set::<_, _, ()>(&key, json).await {
            Ok(()) => {
                debug!(slug = %slug, "Cached link in Redis without expiry");
                Ok(())
            }
            Err(e) => {
                warn!(slug = %slug, error = %e, "Failed to cache link in Redis");
                Err(map_redis_error("failed to write value to Redis", e))
            }
        }
    }

    async fn del(&self, slug: &Slug) -> Result<()> {
        let key = self.cache_key(slug);
        trace!(slug = %slug, "Removing link from Redis cache");

        let mut conn = self.conn.clone();
        match conn.del::<_, ()>(&key).await {
            Ok(()) => {
                debug!(slug = %slug, "Removed link from Redis cache");
                Ok(())
            }
            Err(e) => {
                warn!(slug = %slug, error = %e, "Failed to remove link from Redis cache");
                Err(map_redis_error("failed to delete value from Redis", e))
            }
        }
    }
}
