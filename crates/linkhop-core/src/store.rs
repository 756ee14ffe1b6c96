use crate::error::StorageError;
use crate::link::{Link, LinkId, NewLink, Visit};
use crate::slug::Slug;
use async_trait::async_trait;
use jiff::Timestamp;
use std::time::Duration;

/// Result type for link store operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// The durable source of truth for links and their click events.
///
/// Implementations must be safe for concurrent use; no locking is layered
/// on top of them.
#[async_trait]
pub trait LinkStore: Send + Sync + 'static {
    /// Retrieves the link for a given slug.
    /// Returns `None` if the slug does not exist.
    async fn get_by_slug(&self, slug: &Slug) -> Result<Option<Link>>;

    /// Inserts a new link. Returns `Err(StorageError::Conflict)` if the slug
    /// is already taken; an existing link is never overwritten.
    async fn create_link(&self, link: NewLink) -> Result<Link>;

    /// Increments the click counter of `link_id` by exactly one and appends
    /// a click event carrying `visit`, as a single atomic unit.
    ///
    /// The unit is abandoned with `Err(StorageError::Timeout)` once
    /// `deadline` elapses; an abandoned unit leaves neither effect behind.
    async fn record_click(&self, link_id: LinkId, visit: Visit, deadline: Duration) -> Result<()>;

    /// Counts click events of `link_id` created at or after `since`.
    async fn count_clicks_since(&self, link_id: LinkId, since: Timestamp) -> Result<u64>;
}
