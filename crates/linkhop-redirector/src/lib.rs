//! Redirect resolution for linkhop.
//!
//! [`ResolverService`] answers the hot path: it reads the [`EdgeCache`]
//! first, falls back to the [`LinkStore`] on a miss and re-primes the cache,
//! then hands the visit to a [`ClickRecorder`] that persists it off the
//! request path.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use linkhop_core::{Slug, Visit};
//! use linkhop_redirector::{RecorderConfig, Redirector, ResolverService};
//! # use linkhop_core::{EdgeCache, LinkStore};
//!
//! # async fn example<S: LinkStore, C: EdgeCache>(store: Arc<S>, cache: Arc<C>) -> Result<(), Box<dyn std::error::Error>> {
//! let service = ResolverService::new(store, cache, RecorderConfig::default());
//!
//! let url = service.resolve(&Slug::new("abc123")?, Visit::default()).await?;
//! println!("Redirect to: {url}");
//!
//! service.recorder().wait_idle().await;
//! # Ok(())
//! # }
//! ```
//!
//! [`EdgeCache`]: linkhop_core::EdgeCache
//! [`LinkStore`]: linkhop_core::LinkStore

pub mod error;
pub mod recorder;
pub mod redirector;
pub mod service;

pub use error::{RedirectorError, Result};
pub use recorder::{ClickRecorder, RecorderConfig, RecorderStats};
pub use redirector::Redirector;
pub use service::ResolverService;
