use std::collections::HashMap;

use async_trait::async_trait;
use fred::prelude::*;
use futures::stream::{BoxStream, StreamExt};
use thiserror::Error;

use super::HashStore;

/// How many keys each SCAN page requests.
const SCAN_PAGE_SIZE: u32 = 100;

/// Snapshot store backed by Redis. Records are hashes read with HGETALL;
/// enumeration pages through the keyspace with cursor-based SCAN, so a
/// tenant with many devices never triggers one blocking listing.
#[derive(Clone)]
pub struct RedisHashStore {
    client: Client,
}

#[derive(Debug, Error)]
pub enum RedisStoreError {
    #[error("redis error: {0}")]
    Redis(#[from] fred::error::Error),
}

impl RedisHashStore {
    /// Connect to the given `redis://` URL and wait for the first
    /// successful handshake.
    pub async fn connect(url: &str) -> Result<Self, RedisStoreError> {
        let config = Config::from_url(url)?;
        let client = Builder::from_config(config).build()?;
        let _connection = client.init().await?;
        Ok(Self { client })
    }

    /// Wrap an already-connected client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HashStore for RedisHashStore {
    type Error = RedisStoreError;

    async fn fetch(&self, key: &str) -> Result<HashMap<String, String>, Self::Error> {
        Ok(self.client.hgetall(key).await?)
    }

    fn scan(&self, pattern: &str) -> BoxStream<'static, Result<String, Self::Error>> {
        self.client
            .clone()
            .scan_buffered(pattern.to_string(), Some(SCAN_PAGE_SIZE), None)
            .map(|result| match result {
                // non-utf8 keys cannot belong to the key schema; an empty
                // string extracts to no device id and is skipped upstream
                Ok(key) => Ok(key.as_str().unwrap_or_default().to_string()),
                Err(e) => Err(RedisStoreError::Redis(e)),
            })
            .boxed()
    }
}
