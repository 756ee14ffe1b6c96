//! Edge cache implementations shared by the linkhop services.

pub mod moka;
pub mod redis;

pub use linkhop_core::{CacheError, EdgeCache};
pub use moka::{MokaCacheConfig, MokaEdgeCache};
pub use redis::RedisEdgeCache;
