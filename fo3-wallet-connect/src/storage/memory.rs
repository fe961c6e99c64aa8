//! In-memory storage backend
//!
//! Used in tests and by hosts that do not need sessions to survive a restart.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::KeyValueStorage;
use crate::error::Result;

type Namespace = BTreeMap<String, Vec<u8>>;

/// In-memory [`KeyValueStorage`] implementation
#[derive(Debug, Default)]
pub struct MemoryKeyValueStorage {
    namespaces: RwLock<HashMap<String, Namespace>>,
}

impl MemoryKeyValueStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries stored in `namespace`
    pub async fn len(&self, namespace: &str) -> usize {
        let namespaces = self.namespaces.read().await;
        namespaces.get(namespace).map_or(0, |entries| entries.len())
    }
}

#[async_trait]
impl KeyValueStorage for MemoryKeyValueStorage {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Vec<u8>>> {
        let namespaces = self.namespaces.read().await;
        Ok(namespaces
            .get(namespace)
            .and_then(|entries| entries.get(key))
            .cloned())
    }

    async fn set(&self, namespace: &str, key: &str, value: Vec<u8>) -> Result<()> {
        debug!("Setting {}/{} ({} bytes)", namespace, key, value.len());
        let mut namespaces = self.namespaces.write().await;
        namespaces
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn set_if_absent(&self, namespace: &str, key: &str, value: Vec<u8>) -> Result<bool> {
        let mut namespaces = self.namespaces.write().await;
        let entries = namespaces.entry(namespace.to_string()).or_default();
        if entries.contains_key(key) {
            return Ok(false);
        }
        entries.insert(key.to_string(), value);
        Ok(true)
    }

    async fn delete(&self, namespace: &str, key: &str) -> Result<()> {
        debug!("Deleting {}/{}", namespace, key);
        let mut namespaces = self.namespaces.write().await;
        if let Some(entries) = namespaces.get_mut(namespace) {
            entries.remove(key);
        }
        Ok(())
    }

    async fn enumerate(&self, namespace: &str) -> Result<Vec<Vec<u8>>> {
        let namespaces = self.namespaces.read().await;
        Ok(namespaces
            .get(namespace)
            .map(|entries| entries.values().cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_namespaces_are_isolated() {
        let storage = MemoryKeyValueStorage::new();
        storage.set("a", "k", b"1".to_vec()).await.unwrap();
        storage.set("b", "k", b"2".to_vec()).await.unwrap();

        assert_eq!(storage.get("a", "k").await.unwrap(), Some(b"1".to_vec()));
        assert_eq!(storage.get("b", "k").await.unwrap(), Some(b"2".to_vec()));
        assert_eq!(storage.get("c", "k").await.unwrap(), None);
        assert_eq!(storage.enumerate("a").await.unwrap(), vec![b"1".to_vec()]);
    }

    #[tokio::test]
    async fn test_set_if_absent() {
        let storage = MemoryKeyValueStorage::new();
        assert!(storage.set_if_absent("ns", "k", b"first".to_vec()).await.unwrap());
        assert!(!storage.set_if_absent("ns", "k", b"second".to_vec()).await.unwrap());
        assert_eq!(storage.get("ns", "k").await.unwrap(), Some(b"first".to_vec()));
    }

    #[tokio::test]
    async fn test_delete() {
        let storage = MemoryKeyValueStorage::new();
        storage.set("ns", "k", b"v".to_vec()).await.unwrap();
        storage.delete("ns", "k").await.unwrap();
        storage.delete("missing", "k").await.unwrap();

        assert_eq!(storage.get("ns", "k").await.unwrap(), None);
        assert_eq!(storage.len("ns").await, 0);
    }
}
