use crate::error::Result;
use async_trait::async_trait;
use linkhop_core::{LinkStats, Slug, Ttl};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateParams {
    /// The destination URL, absolute `http` or `https`.
    pub url: String,
    /// Optional caller-chosen slug; one is generated when absent.
    pub slug: Option<String>,
    /// Optional lifetime of the cached projection, in seconds.
    pub ttl: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedLink {
    pub slug: Slug,
    pub url: String,
    pub ttl: Option<Ttl>,
}

#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Validates the request, stores a new link and primes the edge cache.
    async fn create(&self, params: CreateParams) -> Result<CreatedLink>;

    /// Click totals for a link, read straight from the store.
    async fn stats(&self, slug: &Slug) -> Result<LinkStats>;
}
