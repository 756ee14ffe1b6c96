use crate::error::{Result, ShortenerError};
use crate::shortener::{CreateParams, CreatedLink, Shortener};
use async_trait::async_trait;
use jiff::{SignedDuration, Timestamp};
use linkhop_core::{
    CachedLink, EdgeCache, Link, LinkStats, LinkStore, NewLink, Slug, StorageError, Ttl,
};
use linkhop_generator::Generator;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};
use typed_builder::TypedBuilder;
use url::Url;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_STATS_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, TypedBuilder)]
pub struct ShortenerConfig {
    /// How many generated slugs to try before giving up. Zero is raised to one.
    #[builder(default = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u32,
    /// Look-back window for the recent click count in stats.
    #[builder(default = DEFAULT_STATS_WINDOW)]
    pub stats_window: Duration,
}

impl Default for ShortenerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A concrete implementation of the [`Shortener`] trait.
///
/// This service wraps a [`LinkStore`], an [`EdgeCache`] and a [`Generator`]
/// to handle:
/// - URL, slug and TTL validation, before the store is touched
/// - Slug generation with bounded retry on collisions
/// - Priming the cache so the first redirect is a hit
/// - Click statistics
pub struct ShortenerService<S: ?Sized, C: ?Sized, G: ?Sized> {
    store: Arc<S>,
    cache: Arc<C>,
    generator: Arc<G>,
    config: ShortenerConfig,
}

impl<S: ?Sized, C: ?Sized, G: ?Sized> Clone for ShortenerService<S, C, G> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            cache: Arc::clone(&self.cache),
            generator: Arc::clone(&self.generator),
            config: self.config.clone(),
        }
    }
}

impl<S, C, G> ShortenerService<S, C, G>
where
    S: LinkStore + ?Sized,
    C: EdgeCache + ?Sized,
    G: Generator + ?Sized,
{
    pub fn new(store: Arc<S>, cache: Arc<C>, generator: Arc<G>, config: ShortenerConfig) -> Self {
        Self {
            store,
            cache,
            generator,
            config,
        }
    }

    pub fn config(&self) -> &ShortenerConfig {
        &self.config
    }

    /// Accepts absolute `http`/`https` URLs with a host. The URL is stored as
    /// given, not in its normalized form.
    fn validate_url(url: &str) -> Result<()> {
        if url.is_empty() {
            return Err(ShortenerError::InvalidUrl("URL cannot be empty".to_string()));
        }

        let parsed = Url::parse(url).map_err(|e| ShortenerError::InvalidUrl(format!("{url}: {e}")))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ShortenerError::InvalidUrl(format!(
                "URL scheme must be http or https: {}",
                parsed.scheme()
            )));
        }
        if parsed.host_str().is_none_or(str::is_empty) {
            return Err(ShortenerError::InvalidUrl(format!("URL has no host: {url}")));
        }

        Ok(())
    }

    fn validate_ttl(ttl: Option<i64>) -> Result<Option<Ttl>> {
        ttl.map(|secs| {
            let secs = u64::try_from(secs).map_err(|_| {
                ShortenerError::InvalidTtl(format!("ttl must be positive, got {secs}"))
            })?;
            Ttl::from_secs(secs).map_err(ShortenerError::from)
        })
        .transpose()
    }

    async fn insert_with_slug(&self, slug: Slug, url: String, ttl: Option<Ttl>) -> Result<Link> {
        self.store
            .create_link(NewLink { slug, url, ttl })
            .await
            .map_err(ShortenerError::from)
    }

    async fn insert_with_generated_slug(&self, url: String, ttl: Option<Ttl>) -> Result<Link> {
        let attempts = self.config.max_attempts.max(1);

        for attempt in 1..=attempts {
            let slug = self.generator.generate();
            if let Err(e) = Slug::new(slug.as_str()) {
                warn!(slug = %slug, error = %e, "Generator produced an invalid slug");
                return Err(ShortenerError::InvalidGeneratedSlug(slug.into_inner()));
            }

            let link = NewLink {
                slug: slug.clone(),
                url: url.clone(),
                ttl,
            };

            match self.store.create_link(link).await {
                Ok(link) => return Ok(link),
                Err(StorageError::Conflict(_)) => {
                    debug!(slug = %slug, attempt, "Generated slug already taken, regenerating");
                }
                Err(e) => return Err(ShortenerError::Storage(e)),
            }
        }

        warn!(attempts, "Exhausted slug generation attempts");
        Err(ShortenerError::SlugsExhausted(attempts))
    }

    /// Writes the cache projection of a freshly stored link. Failures are
    /// logged only; the next resolution repopulates the entry.
    async fn prime(&self, link: &Link) {
        let entry = CachedLink::from(link);
        match self.cache.put(&link.slug, &entry).await {
            Ok(()) => trace!(slug = %link.slug, "Primed cache"),
            Err(e) => warn!(slug = %link.slug, error = %e, "Failed to prime cache"),
        }
    }
}

#[async_trait]
impl<S, C, G> Shortener for ShortenerService<S, C, G>
where
    S: LinkStore + ?Sized,
    C: EdgeCache + ?Sized,
    G: Generator + ?Sized,
{
    async fn create(&self, params: CreateParams) -> Result<CreatedLink> {
        let CreateParams { url, slug, ttl } = params;

        Self::validate_url(&url)?;
        let ttl = Self::validate_ttl(ttl)?;
        let slug = slug.map(Slug::new).transpose()?;

        let link = match slug {
            Some(slug) => self.insert_with_slug(slug, url, ttl).await?,
            None => self.insert_with_generated_slug(url, ttl).await?,
        };
        debug!(slug = %link.slug, link_id = %link.id, "Created link");

        self.prime(&link).await;

        Ok(CreatedLink {
            slug: link.slug,
            url: link.url,
            ttl: link.ttl,
        })
    }

    async fn stats(&self, slug: &Slug) -> Result<LinkStats> {
        let link = self
            .store
            .get_by_slug(slug)
            .await?
            .ok_or_else(|| ShortenerError::NotFound(slug.to_string()))?;

        let since = SignedDuration::try_from(self.config.stats_window)
            .ok()
            .and_then(|window| Timestamp::now().checked_sub(window).ok())
            .unwrap_or(Timestamp::MIN);
        let clicks_in_window = self.store.count_clicks_since(link.id, since).await?;

        Ok(LinkStats {
            slug: link.slug,
            url: link.url,
            total_clicks: link.clicks,
            clicks_in_window,
        })
    }
}
