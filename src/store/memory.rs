//! In-memory store backend
//!
//! A `RwLock<HashMap>`-backed [`ChunkStore`] used by tests and by
//! nodes running without a network. It mirrors the behaviors the
//! pipelines must cope with from a real distributed store: several
//! values can accumulate under one key, and a put past the storage
//! limit is confirmed as failed instead of returning an error.

use crate::chunk::ChunkId;
use crate::error::Result;
use crate::store::ChunkStore;

use parking_lot::RwLock;
use std::collections::HashMap;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// In-memory chunk store with a configurable storage limit
pub struct MemoryStore {
    entries: RwLock<HashMap<ChunkId, Vec<Vec<u8>>>>,
    max_bytes: u64,
}

impl MemoryStore {
    /// Create a store holding at most `max_bytes` of values
    pub fn new(max_bytes: u64) -> Self {
        MemoryStore {
            entries: RwLock::new(HashMap::new()),
            max_bytes,
        }
    }

    /// Bytes currently held across all values
    pub fn used_bytes(&self) -> u64 {
        let map = self.entries.read();
        map.values().flatten().map(|v| v.len() as u64).sum()
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the store holds no keys
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drop every value stored under a key
    ///
    /// Returns true if the key was present.
    pub fn remove(&self, id: &ChunkId) -> bool {
        self.entries.write().remove(id).is_some()
    }
}

impl ChunkStore for MemoryStore {
    fn put(&self, id: &ChunkId, data: Vec<u8>) -> oneshot::Receiver<bool> {
        let (confirm, rx) = oneshot::channel();
        let mut map = self.entries.write();

        let used: u64 = map.values().flatten().map(|v| v.len() as u64).sum();
        if used + data.len() as u64 > self.max_bytes {
            warn!(%id, size = data.len(), "storage limit reached, rejecting value");
            let _ = confirm.send(false);
            return rx;
        }

        let values = map.entry(*id).or_default();
        // Identical values under one key collapse; distinct ones accumulate
        if !values.iter().any(|v| *v == data) {
            debug!(%id, size = data.len(), "stored value");
            values.push(data);
        }

        let _ = confirm.send(true);
        rx
    }

    fn get(&self, id: &ChunkId) -> Result<Vec<Vec<u8>>> {
        let map = self.entries.read();
        Ok(map.get(id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let store = MemoryStore::new(1024 * 1024);
        let data = b"hello chunk".to_vec();
        let id = ChunkId::from_data(&data);

        let confirmed = store.put(&id, data.clone()).await.unwrap();
        assert!(confirmed);

        let values = store.get(&id).unwrap();
        assert_eq!(values, vec![data.clone()]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.used_bytes(), data.len() as u64);
    }

    #[test]
    fn test_get_missing_returns_empty() {
        let store = MemoryStore::new(1024);
        let id = ChunkId::from_data(b"never stored");

        assert!(store.get(&id).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_identical_values_collapse() {
        let store = MemoryStore::new(1024);
        let data = b"same".to_vec();
        let id = ChunkId::from_data(&data);

        store.put(&id, data.clone()).await.unwrap();
        store.put(&id, data.clone()).await.unwrap();

        assert_eq!(store.get(&id).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_distinct_values_accumulate_in_order() {
        let store = MemoryStore::new(1024);
        let id = ChunkId::from_data(b"key");

        store.put(&id, b"first".to_vec()).await.unwrap();
        store.put(&id, b"second".to_vec()).await.unwrap();

        let values = store.get(&id).unwrap();
        assert_eq!(values, vec![b"first".to_vec(), b"second".to_vec()]);
    }

    #[tokio::test]
    async fn test_storage_limit_confirms_failure() {
        let store = MemoryStore::new(8);
        let id = ChunkId::from_data(b"too big");

        let confirmed = store.put(&id, vec![0u8; 16]).await.unwrap();
        assert!(!confirmed);
        assert!(store.get(&id).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove() {
        let store = MemoryStore::new(1024);
        let data = b"removable".to_vec();
        let id = ChunkId::from_data(&data);

        store.put(&id, data).await.unwrap();
        assert!(!store.is_empty());
        assert!(store.remove(&id));
        assert!(!store.remove(&id));
        assert!(store.is_empty());
        assert!(store.get(&id).unwrap().is_empty());
    }
}
