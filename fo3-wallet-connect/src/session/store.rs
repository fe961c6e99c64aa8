//! Expiry-aware sequence store
//!
//! Sequences live in a [`KeyValueStore`] keyed by topic. Reads evaluate
//! expiry lazily: an expired sequence is deleted and reported as absent.
//! All in-place mutation goes through [`SequenceStore::update`].

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::expiry::ExpirableSequence;
use crate::error::{Error, Result};
use crate::storage::{KeyValueStorage, KeyValueStore};

/// Store of sequences keyed by topic
pub struct SequenceStore<S> {
    store: KeyValueStore<S>,
    write_lock: Mutex<()>,
}

impl<S> std::fmt::Debug for SequenceStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequenceStore")
            .field("namespace", &self.store.namespace())
            .finish()
    }
}

impl<S> SequenceStore<S>
where
    S: ExpirableSequence + Serialize + DeserializeOwned + Send + Sync,
{
    pub fn new(storage: Arc<dyn KeyValueStorage>, namespace: impl Into<String>) -> Self {
        Self {
            store: KeyValueStore::new(storage, namespace),
            write_lock: Mutex::new(()),
        }
    }

    /// Insert or replace the sequence under its own topic
    pub async fn set(&self, sequence: &S) -> Result<()> {
        debug!("Storing sequence for topic {}", sequence.topic());
        self.store.set(sequence.topic(), sequence).await
    }

    /// Live sequence for `topic`; expired sequences read as `None`
    pub async fn get(&self, topic: &str) -> Result<Option<S>> {
        match self.load(topic).await {
            Ok(sequence) => Ok(Some(sequence)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Live sequence for `topic`, or why there is none
    pub async fn require(&self, topic: &str) -> Result<S> {
        self.load(topic).await
    }

    pub async fn exists(&self, topic: &str) -> Result<bool> {
        Ok(self.get(topic).await?.is_some())
    }

    /// Every live sequence; expired ones are removed along the way
    pub async fn get_all(&self) -> Result<Vec<S>> {
        let mut live = Vec::new();
        for sequence in self.store.get_all().await? {
            if sequence.is_expired() {
                self.expire(&sequence).await?;
            } else {
                live.push(sequence);
            }
        }
        Ok(live)
    }

    pub async fn delete(&self, topic: &str) -> Result<()> {
        debug!("Deleting sequence for topic {}", topic);
        self.store.delete(topic).await
    }

    /// Read, mutate and write back the sequence for `topic`
    ///
    /// The closure runs on an owned copy; nothing is written if it fails.
    /// Concurrent `update` calls on the same store are serialized.
    pub async fn update<F>(&self, topic: &str, mutate: F) -> Result<S>
    where
        F: FnOnce(&mut S) -> Result<()>,
    {
        let _guard = self.write_lock.lock().await;
        let mut sequence = self.load(topic).await?;
        mutate(&mut sequence)?;
        self.store.set(topic, &sequence).await?;
        Ok(sequence)
    }

    async fn load(&self, topic: &str) -> Result<S> {
        let sequence = self
            .store
            .get(topic)
            .await?
            .ok_or_else(|| Error::NoSequenceForTopic(topic.to_string()))?;

        if sequence.is_expired() {
            self.expire(&sequence).await?;
            return Err(Error::SessionExpired(topic.to_string()));
        }
        Ok(sequence)
    }

    async fn expire(&self, sequence: &S) -> Result<()> {
        info!(
            "Sequence for topic {} expired at {}",
            sequence.topic(),
            sequence.expiry_date()
        );
        self.store.delete(sequence.topic()).await
    }
}
