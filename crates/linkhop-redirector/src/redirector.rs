use crate::Result;
use async_trait::async_trait;
use linkhop_core::{Slug, Visit};

#[async_trait]
pub trait Redirector: Send + Sync + 'static {
    /// Resolves a slug to its destination URL and records the visit in the
    /// background.
    ///
    /// Returns [`RedirectorError::NotFound`](crate::RedirectorError::NotFound)
    /// if no link owns the slug.
    async fn resolve(&self, slug: &Slug, visit: Visit) -> Result<String>;
}
