//! key/value storage backing the quote store.
//!
//! the durable backend keeps values in a sqlite table so they survive restarts,
//! the memory backend holds them for the lifetime of the process and stands in
//! for session-scoped storage.

use async_trait::async_trait;

use crate::error::Result;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// overwrites any previous value under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;
}
