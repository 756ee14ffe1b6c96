//! Link store implementations: an in-memory store for single-node
//! deployments and tests, and a MySQL store for durable deployments.

pub mod memory;
pub mod mysql;

pub use linkhop_core::store::Result;
pub use linkhop_core::{LinkStore, StorageError};
pub use memory::InMemoryLinkStore;
pub use mysql::MySqlLinkStore;
