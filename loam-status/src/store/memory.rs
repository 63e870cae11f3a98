use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use thiserror::Error;

use super::HashStore;

/// In-memory snapshot store. Primarily intended for testing and as a
/// reference implementation of the [`HashStore`] trait; `scan` follows
/// Redis `SCAN MATCH` semantics for the `*` wildcard, the only one the
/// key schema uses.
#[derive(Clone, Default)]
pub struct InMemoryHashStore {
    records: Arc<Mutex<HashMap<String, HashMap<String, String>>>>,
    unavailable: Arc<Mutex<HashSet<String>>>,
}

#[derive(Debug, Error)]
pub enum MemoryStoreError {
    #[error("internal error: {0}")]
    Internal(String),
    #[error("store unavailable for key: {0}")]
    Unavailable(String),
}

impl InMemoryHashStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a whole record, replacing any existing fields.
    pub fn insert(&self, key: &str, fields: &[(&str, &str)]) -> Result<(), MemoryStoreError> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| MemoryStoreError::Internal("records mutex poisoned".into()))?;

        let record = fields
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        records.insert(key.to_string(), record);

        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<(), MemoryStoreError> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| MemoryStoreError::Internal("records mutex poisoned".into()))?;
        records.remove(key);
        Ok(())
    }

    /// Make subsequent fetches of `key` fail, simulating a connectivity
    /// failure scoped to that record.
    pub fn mark_unavailable(&self, key: &str) -> Result<(), MemoryStoreError> {
        let mut unavailable = self
            .unavailable
            .lock()
            .map_err(|_| MemoryStoreError::Internal("unavailable mutex poisoned".into()))?;
        unavailable.insert(key.to_string());
        Ok(())
    }
}

#[async_trait]
impl HashStore for InMemoryHashStore {
    type Error = MemoryStoreError;

    async fn fetch(&self, key: &str) -> Result<HashMap<String, String>, Self::Error> {
        let unavailable = self
            .unavailable
            .lock()
            .map_err(|_| MemoryStoreError::Internal("unavailable mutex poisoned".into()))?;
        if unavailable.contains(key) {
            return Err(MemoryStoreError::Unavailable(key.to_string()));
        }
        drop(unavailable);

        let records = self
            .records
            .lock()
            .map_err(|_| MemoryStoreError::Internal("records mutex poisoned".into()))?;

        Ok(records.get(key).cloned().unwrap_or_default())
    }

    fn scan(&self, pattern: &str) -> BoxStream<'static, Result<String, Self::Error>> {
        match self.records.lock() {
            Ok(records) => {
                let mut keys: Vec<String> = records
                    .keys()
                    .filter(|key| pattern_matches(pattern, key))
                    .cloned()
                    .collect();
                // keep enumeration order stable for callers
                keys.sort();
                stream::iter(keys.into_iter().map(Ok)).boxed()
            }
            Err(_) => stream::iter([Err(MemoryStoreError::Internal(
                "records mutex poisoned".into(),
            ))])
            .boxed(),
        }
    }
}

/// Match a key against a glob pattern restricted to the `*` wildcard.
fn pattern_matches(pattern: &str, key: &str) -> bool {
    let segments: Vec<&str> = pattern.split('*').collect();
    let Some((first, rest)) = segments.split_first() else {
        return pattern == key;
    };
    if rest.is_empty() {
        return pattern == key;
    }

    if !key.starts_with(first) {
        return false;
    }
    let mut pos = first.len();

    let (last, middle) = rest.split_last().unwrap_or((&"", &[]));
    for segment in middle {
        if segment.is_empty() {
            continue;
        }
        match key[pos..].find(segment) {
            Some(offset) => pos += offset + segment.len(),
            None => return false,
        }
    }

    if last.is_empty() {
        // pattern ends with `*`
        return true;
    }
    key.len() >= pos + last.len() && key[pos..].ends_with(last)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_patterns_require_equality() {
        assert!(pattern_matches("a:b:c", "a:b:c"));
        assert!(!pattern_matches("a:b:c", "a:b:c:d"));
        assert!(!pattern_matches("a:b:c", "a:b"));
    }

    #[test]
    fn single_wildcard_spans_a_segment() {
        let pattern = "pvz:prod:acme:device:*:state";
        assert!(pattern_matches(pattern, "pvz:prod:acme:device:d1:state"));
        assert!(pattern_matches(pattern, "pvz:prod:acme:device:a:b:state"));
        assert!(!pattern_matches(pattern, "pvz:prod:acme:device:d1:streak"));
        assert!(!pattern_matches(pattern, "pvz:prod:other:device:d1:state"));
    }

    #[test]
    fn leading_and_trailing_wildcards() {
        assert!(pattern_matches("*", "anything"));
        assert!(pattern_matches("*:state", "x:y:state"));
        assert!(pattern_matches("pvz:*", "pvz:prod:acme:devices"));
        assert!(!pattern_matches("pvz:*", "qvz:prod"));
    }

    #[test]
    fn multiple_wildcards_match_in_order() {
        assert!(pattern_matches("a*b*c", "a-x-b-y-c"));
        assert!(pattern_matches("a*b*c", "abc"));
        assert!(!pattern_matches("a*b*c", "acb"));
    }

    #[tokio::test]
    async fn fetch_of_absent_key_is_an_empty_record() {
        let store = InMemoryHashStore::new();
        let record = store.fetch("missing").await.unwrap();
        assert!(record.is_empty());
    }

    #[tokio::test]
    async fn scan_yields_matching_keys_in_stable_order() {
        let store = InMemoryHashStore::new();
        store.insert("pvz:p:t:device:b:state", &[("h", "1")]).unwrap();
        store.insert("pvz:p:t:device:a:state", &[("h", "2")]).unwrap();
        store.insert("pvz:p:t:device:a:humidity_low_streak", &[]).unwrap();

        let keys: Vec<String> = store
            .scan("pvz:p:t:device:*:state")
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(
            keys,
            vec!["pvz:p:t:device:a:state", "pvz:p:t:device:b:state"]
        );
    }

    #[tokio::test]
    async fn unavailable_keys_error_without_affecting_others() {
        let store = InMemoryHashStore::new();
        store.insert("k1", &[("f", "v")]).unwrap();
        store.insert("k2", &[("f", "v")]).unwrap();
        store.mark_unavailable("k1").unwrap();

        assert!(store.fetch("k1").await.is_err());
        assert_eq!(store.fetch("k2").await.unwrap().len(), 1);
    }
}
