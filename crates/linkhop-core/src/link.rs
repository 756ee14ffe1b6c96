use crate::error::CoreError;
use crate::slug::Slug;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::num::NonZeroU32;
use std::time::Duration;

/// Store-assigned identity of a [`Link`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkId(pub u64);

impl Display for LinkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Time-to-live of a link's cached projection, in whole seconds.
///
/// Always positive. An absent TTL (`Option<Ttl>::None`) means the cache
/// entry never expires on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ttl(NonZeroU32);

impl Ttl {
    pub fn from_secs(secs: u64) -> std::result::Result<Self, CoreError> {
        let secs = u32::try_from(secs)
            .map_err(|_| CoreError::InvalidTtl(format!("{secs} seconds is too large")))?;
        NonZeroU32::new(secs)
            .map(Self)
            .ok_or_else(|| CoreError::InvalidTtl("must be a positive number of seconds".into()))
    }

    pub fn as_secs(&self) -> u32 {
        self.0.get()
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.0.get()))
    }
}

/// A durable slug → destination mapping owned by the link store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub id: LinkId,
    pub slug: Slug,
    /// The destination the slug redirects to.
    pub url: String,
    pub ttl: Option<Ttl>,
    /// Only ever incremented by click recording.
    pub clicks: u64,
    pub created_at: Timestamp,
}

/// A link that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLink {
    pub slug: Slug,
    pub url: String,
    pub ttl: Option<Ttl>,
}

/// Client metadata captured when a slug is resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visit {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
}

/// An appended click record. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickEvent {
    pub id: u64,
    pub link_id: LinkId,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub created_at: Timestamp,
}

/// The cache's projection of a [`Link`]: destination and the TTL it was
/// written with. Never carries the click counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedLink {
    pub url: String,
    pub ttl: Option<Ttl>,
}

impl CachedLink {
    /// How long the cache should keep this entry, `None` meaning forever.
    pub fn expiry(&self) -> Option<Duration> {
        self.ttl.map(|ttl| ttl.as_duration())
    }
}

impl From<&Link> for CachedLink {
    fn from(link: &Link) -> Self {
        Self {
            url: link.url.clone(),
            ttl: link.ttl,
        }
    }
}

/// Aggregate click figures for one link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkStats {
    pub slug: Slug,
    pub url: String,
    pub total_clicks: u64,
    pub clicks_in_window: u64,
}
