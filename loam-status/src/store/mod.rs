//! Snapshot store access.
//!
//! The live store is a keyspace of string-valued hash records owned by an
//! external writer. Readers see it through [`HashStore`]: point lookups of
//! whole records plus a lazy, cursor-style enumeration of keys matching a
//! wildcard pattern.

use std::collections::HashMap;

use async_trait::async_trait;
use futures::stream::BoxStream;

pub mod memory;
pub mod redis;

pub use memory::{InMemoryHashStore, MemoryStoreError};
pub use redis::{RedisHashStore, RedisStoreError};

#[async_trait]
pub trait HashStore: Clone + Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch all fields of one record. An absent key yields an empty
    /// map, indistinguishable from an empty record.
    async fn fetch(&self, key: &str) -> Result<HashMap<String, String>, Self::Error>;

    /// Enumerate keys matching a wildcard pattern as a resumable stream.
    /// Implementations must page through the keyspace rather than block
    /// on one large listing; the number of per-tenant keys is unbounded.
    fn scan(&self, pattern: &str) -> BoxStream<'static, Result<String, Self::Error>>;
}
