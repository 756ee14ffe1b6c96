//! Link admission and statistics for linkhop.
//!
//! [`ShortenerService`] validates new links, picks a slug (the caller's or a
//! generated one), stores the link and primes the edge cache before
//! acknowledging. It also serves per-link click statistics.

pub mod error;
pub mod service;
pub mod shortener;

pub use error::{Result, ShortenerError};
pub use service::{ShortenerConfig, ShortenerService};
pub use shortener::{CreateParams, CreatedLink, Shortener};
