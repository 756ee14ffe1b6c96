use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use jiff::Timestamp;
use linkhop_core::store::Result;
use linkhop_core::{ClickEvent, Link, LinkId, LinkStore, NewLink, Slug, StorageError, Visit};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, trace};

/// A link together with its append-only click history.
#[derive(Debug, Clone)]
struct Row {
    link: Link,
    events: Vec<ClickEvent>,
}

/// In-memory implementation of [`LinkStore`] using DashMap.
///
/// DashMap provides better concurrency than RwLock<HashMap> because it
/// uses sharded locks, allowing concurrent reads and writes to different
/// buckets without blocking. Slug uniqueness and click recording both rely
/// on the shard write lock of the slug's bucket, so they are atomic with
/// respect to each other.
#[derive(Debug, Default)]
pub struct InMemoryLinkStore {
    rows: DashMap<String, Row>,
    slugs: DashMap<LinkId, String>,
    next_link_id: AtomicU64,
    next_event_id: AtomicU64,
    write_latency: Option<Duration>,
}

impl InMemoryLinkStore {
    /// Creates a new in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every click recording by `latency` before it touches any
    /// state, emulating a slow backend.
    pub fn with_write_latency(mut self, latency: Duration) -> Self {
        self.write_latency = Some(latency);
        self
    }

    /// Number of stored links.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the click history of a link, oldest first.
    pub fn click_events(&self, link_id: LinkId) -> Vec<ClickEvent> {
        let Some(slug) = self.slugs.get(&link_id).map(|s| s.clone()) else {
            return Vec::new();
        };
        self.rows
            .get(&slug)
            .map(|row| row.events.clone())
            .unwrap_or_default()
    }

    fn append_click(&self, link_id: LinkId, visit: Visit) -> Result<()> {
        let slug = self
            .slugs
            .get(&link_id)
            .map(|s| s.clone())
            .ok_or_else(|| StorageError::Missing(link_id.to_string()))?;

        let mut row = self
            .rows
            .get_mut(&slug)
            .ok_or_else(|| StorageError::Missing(link_id.to_string()))?;

        // Both effects happen under the same shard write lock.
        let event = ClickEvent {
            id: self.next_event_id.fetch_add(1, Ordering::Relaxed) + 1,
            link_id,
            ip: visit.ip,
            user_agent: visit.user_agent,
            referer: visit.referer,
            created_at: Timestamp::now(),
        };
        row.link.clicks += 1;
        row.events.push(event);
        trace!(link_id = %link_id, clicks = row.link.clicks, "Recorded click in memory");
        Ok(())
    }
}

#[async_trait]
impl LinkStore for InMemoryLinkStore {
    async fn get_by_slug(&self, slug: &Slug) -> Result<Option<Link>> {
        Ok(self.rows.get(slug.as_str()).map(|row| row.link.clone()))
    }

    async fn create_link(&self, link: NewLink) -> Result<Link> {
        match self.rows.entry(link.slug.as_str().to_owned()) {
            Entry::Occupied(_) => Err(StorageError::Conflict(link.slug.to_string())),
            Entry::Vacant(vacant) => {
                let id = LinkId(self.next_link_id.fetch_add(1, Ordering::Relaxed) + 1);
                let created = Link {
                    id,
                    slug: link.slug,
                    url: link.url,
                    ttl: link.ttl,
                    clicks: 0,
                    created_at: Timestamp::now(),
                };
                self.slugs.insert(id, created.slug.as_str().to_owned());
                vacant.insert(Row {
                    link: created.clone(),
                    events: Vec::new(),
                });
                debug!(slug = %created.slug, link_id = %id, "Created link in memory");
                Ok(created)
            }
        }
    }

    async fn record_click(&self, link_id: LinkId, visit: Visit, deadline: Duration) -> Result<()> {
        let latency = self.write_latency;
        let unit = async move {
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }
            self.append_click(link_id, visit)
        };

        tokio::time::timeout(deadline, unit).await.map_err(|_| {
            StorageError::Timeout(format!(
                "click recording for link {link_id} exceeded {}ms",
                deadline.as_millis()
            ))
        })?
    }

    async fn count_clicks_since(&self, link_id: LinkId, since: Timestamp) -> Result<u64> {
        let Some(slug) = self.slugs.get(&link_id).map(|s| s.clone()) else {
            return Ok(0);
        };
        let count = self
            .rows
            .get(&slug)
            .map(|row| row.events.iter().filter(|e| e.created_at >= since).count())
            .unwrap_or(0);
        Ok(count as u64)
    }
}
