//! Typed key-value store
//!
//! Wraps a [`KeyValueStorage`] and a namespace, JSON-encoding values of a
//! single type on the way in and decoding them on the way out.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use super::KeyValueStorage;
use crate::error::{Error, Result};

/// Namespaced store of JSON-encoded `T` values
pub struct KeyValueStore<T> {
    storage: Arc<dyn KeyValueStorage>,
    namespace: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for KeyValueStore<T> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            namespace: self.namespace.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for KeyValueStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyValueStore")
            .field("namespace", &self.namespace)
            .finish()
    }
}

impl<T> KeyValueStore<T> {
    /// Create a new store scoped to `namespace`
    pub fn new(storage: Arc<dyn KeyValueStorage>, namespace: impl Into<String>) -> Self {
        Self {
            storage,
            namespace: namespace.into(),
            _marker: PhantomData,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

impl<T> KeyValueStore<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    pub async fn get(&self, key: &str) -> Result<Option<T>> {
        match self.storage.get(&self.namespace, key).await? {
            Some(data) => Ok(Some(Self::decode(&data)?)),
            None => Ok(None),
        }
    }

    pub async fn set(&self, key: &str, value: &T) -> Result<()> {
        let data = serde_json::to_vec(value)?;
        self.storage.set(&self.namespace, key, data).await
    }

    /// Store `value` only if `key` is vacant; returns whether it was inserted
    pub async fn set_if_absent(&self, key: &str, value: &T) -> Result<bool> {
        let data = serde_json::to_vec(value)?;
        self.storage.set_if_absent(&self.namespace, key, data).await
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        self.storage.delete(&self.namespace, key).await
    }

    /// Every decodable value in the namespace
    ///
    /// Entries that fail to decode are skipped with a warning so one corrupt
    /// record cannot hide the rest.
    pub async fn get_all(&self) -> Result<Vec<T>> {
        let entries = self.storage.enumerate(&self.namespace).await?;
        let mut values = Vec::with_capacity(entries.len());
        for data in entries {
            match Self::decode(&data) {
                Ok(value) => values.push(value),
                Err(e) => warn!("Skipping undecodable entry in {}: {}", self.namespace, e),
            }
        }
        Ok(values)
    }

    fn decode(data: &[u8]) -> Result<T> {
        serde_json::from_slice(data).map_err(|e| Error::Decoding(e.to_string()))
    }
}
