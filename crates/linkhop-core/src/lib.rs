//! Core types and traits for the linkhop URL shortener.
//!
//! This crate provides the domain model shared by the redirector and the
//! shortener, plus the two collaborator contracts they are written against:
//! the durable [`LinkStore`] and the TTL-aware [`EdgeCache`].

pub mod cache;
pub mod error;
pub mod link;
pub mod slug;
pub mod store;

pub use cache::EdgeCache;
pub use error::{CacheError, CoreError, StorageError};
pub use link::{CachedLink, ClickEvent, Link, LinkId, LinkStats, NewLink, Ttl, Visit};
pub use slug::Slug;
pub use store::LinkStore;
