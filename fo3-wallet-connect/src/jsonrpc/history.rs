//! JSON-RPC request/response ledger
//!
//! Requests and responses cross the transport asynchronously and out of
//! order. The ledger correlates them by request id and refuses a reused
//! request id, a second response, and a response nobody asked for.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::types::{JsonRpcRequest, JsonRpcResult};
use crate::codable::AnyCodable;
use crate::error::{Error, Result};
use crate::storage::{KeyValueStorage, KeyValueStore};

/// The call recorded for a request id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedRequest {
    pub method: String,
    pub params: AnyCodable,
}

/// One request and, once it arrives, its response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonRpcRecord {
    pub id: i64,
    pub topic: String,
    pub request: RecordedRequest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<JsonRpcResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<String>,
}

impl JsonRpcRecord {
    pub fn is_resolved(&self) -> bool {
        self.response.is_some()
    }
}

/// Durable correlation table keyed by request id
pub struct JsonRpcHistory {
    store: KeyValueStore<JsonRpcRecord>,
    /// Held by every read-modify-write over existing records
    write_lock: Mutex<()>,
}

impl std::fmt::Debug for JsonRpcHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonRpcHistory")
            .field("namespace", &self.store.namespace())
            .finish()
    }
}

impl JsonRpcHistory {
    pub fn new(storage: Arc<dyn KeyValueStorage>, namespace: impl Into<String>) -> Self {
        Self {
            store: KeyValueStore::new(storage, namespace),
            write_lock: Mutex::new(()),
        }
    }

    /// Record an outgoing or incoming request
    ///
    /// Fails with [`Error::DuplicateRequest`] if the id already has a record.
    /// The existence check and the write are a single storage operation.
    pub async fn record(
        &self,
        topic: &str,
        request: &JsonRpcRequest,
        chain_id: Option<String>,
    ) -> Result<()> {
        let record = JsonRpcRecord {
            id: request.id,
            topic: topic.to_string(),
            request: RecordedRequest {
                method: request.method.clone(),
                params: request.params.clone(),
            },
            response: None,
            chain_id,
        };

        if !self.store.set_if_absent(&key(request.id), &record).await? {
            warn!("Duplicate request id {} on topic {}", request.id, topic);
            return Err(Error::DuplicateRequest(request.id));
        }
        debug!(
            "Recorded request {} ({}) on topic {}",
            request.id, request.method, topic
        );
        Ok(())
    }

    /// Attach a response to its request and return the completed record
    pub async fn resolve(&self, result: JsonRpcResult) -> Result<JsonRpcRecord> {
        let id = result.id();
        let _guard = self.write_lock.lock().await;

        let mut record = match self.store.get(&key(id)).await? {
            Some(record) => record,
            None => {
                warn!("Response {} has no matching request", id);
                return Err(Error::NoMatchingRequest(id));
            }
        };
        if record.is_resolved() {
            warn!("Request {} already has a response", id);
            return Err(Error::DuplicateResponse(id));
        }

        record.response = Some(result);
        self.store.set(&key(id), &record).await?;
        debug!("Resolved request {} on topic {}", id, record.topic);
        Ok(record)
    }

    pub async fn get(&self, id: i64) -> Result<Option<JsonRpcRecord>> {
        self.store.get(&key(id)).await
    }

    pub async fn exists(&self, id: i64) -> Result<bool> {
        Ok(self.get(id).await?.is_some())
    }

    /// Requests still waiting for a response, oldest id first
    pub async fn pending(&self) -> Result<Vec<JsonRpcRecord>> {
        let mut pending: Vec<_> = self
            .store
            .get_all()
            .await?
            .into_iter()
            .filter(|record| !record.is_resolved())
            .collect();
        pending.sort_by_key(|record| record.id);
        Ok(pending)
    }

    /// Remove every record that belongs to `topic`; returns how many
    ///
    /// Serialized with [`Self::resolve`], so a response landing mid-purge
    /// cannot write its record back afterwards.
    pub async fn purge(&self, topic: &str) -> Result<usize> {
        let _guard = self.write_lock.lock().await;
        let mut purged = 0;
        for record in self.store.get_all().await? {
            if record.topic == topic {
                self.store.delete(&key(record.id)).await?;
                purged += 1;
            }
        }
        if purged > 0 {
            info!("Purged {} JSON-RPC records for topic {}", purged, topic);
        }
        Ok(purged)
    }
}

fn key(id: i64) -> String {
    id.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jsonrpc::types::{JsonRpcErrorResponse, JsonRpcResponse};
    use crate::storage::MemoryKeyValueStorage;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::Notify;

    fn history() -> JsonRpcHistory {
        JsonRpcHistory::new(Arc::new(MemoryKeyValueStorage::new()), "test.jsonrpc")
    }

    fn request(id: i64) -> JsonRpcRequest {
        JsonRpcRequest::new(
            id,
            "wc_sessionPayload",
            AnyCodable::from(json!({"request": {"method": "eth_sign"}})),
        )
    }

    /// Storage that parks the first armed `get` until released
    #[derive(Default)]
    struct GatedStorage {
        inner: MemoryKeyValueStorage,
        armed: AtomicBool,
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl KeyValueStorage for GatedStorage {
        async fn get(&self, namespace: &str, key: &str) -> Result<Option<Vec<u8>>> {
            let value = self.inner.get(namespace, key).await?;
            if self.armed.swap(false, Ordering::SeqCst) {
                self.entered.notify_one();
                self.release.notified().await;
            }
            Ok(value)
        }

        async fn set(&self, namespace: &str, key: &str, value: Vec<u8>) -> Result<()> {
            self.inner.set(namespace, key, value).await
        }

        async fn set_if_absent(&self, namespace: &str, key: &str, value: Vec<u8>) -> Result<bool> {
            self.inner.set_if_absent(namespace, key, value).await
        }

        async fn delete(&self, namespace: &str, key: &str) -> Result<()> {
            self.inner.delete(namespace, key).await
        }

        async fn enumerate(&self, namespace: &str) -> Result<Vec<Vec<u8>>> {
            self.inner.enumerate(namespace).await
        }
    }

    #[tokio::test]
    async fn test_record_then_resolve() {
        let history = history();
        history
            .record("topic", &request(1), Some("eip155:1".to_string()))
            .await
            .unwrap();
        assert!(history.exists(1).await.unwrap());

        let record = history
            .resolve(JsonRpcResponse::new(1, AnyCodable::from(json!("0xsig"))).into())
            .await
            .unwrap();
        assert_eq!(record.topic, "topic");
        assert_eq!(record.chain_id.as_deref(), Some("eip155:1"));
        assert!(record.is_resolved());
        assert!(history.pending().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_error_response_resolves() {
        let history = history();
        history.record("topic", &request(2), None).await.unwrap();

        let record = history
            .resolve(JsonRpcErrorResponse::new(2, 5000, "User rejected").into())
            .await
            .unwrap();
        assert!(record.response.unwrap().is_error());
    }

    #[tokio::test]
    async fn test_duplicate_request_keeps_original() {
        let history = history();
        history.record("first", &request(5), None).await.unwrap();

        let result = history.record("second", &request(5), None).await;
        assert_eq!(result, Err(Error::DuplicateRequest(5)));
        assert_eq!(history.get(5).await.unwrap().unwrap().topic, "first");
    }

    #[tokio::test]
    async fn test_pending_sorted_by_id() {
        let history = history();
        for id in [30, 10, 20] {
            history.record("topic", &request(id), None).await.unwrap();
        }
        history
            .resolve(JsonRpcResponse::new(20, AnyCodable::null()).into())
            .await
            .unwrap();

        let ids: Vec<i64> = history.pending().await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![10, 30]);
    }

    #[tokio::test]
    async fn test_purge_during_resolve_leaves_nothing_behind() {
        let storage = Arc::new(GatedStorage::default());
        let history = Arc::new(JsonRpcHistory::new(storage.clone(), "test.jsonrpc"));
        history.record("topic", &request(9), None).await.unwrap();

        storage.armed.store(true, Ordering::SeqCst);
        let resolving = tokio::spawn({
            let history = history.clone();
            async move {
                history
                    .resolve(JsonRpcResponse::new(9, AnyCodable::null()).into())
                    .await
            }
        });
        storage.entered.notified().await;

        let purging = tokio::spawn({
            let history = history.clone();
            async move { history.purge("topic").await }
        });
        tokio::task::yield_now().await;
        storage.release.notify_one();

        assert!(resolving.await.unwrap().unwrap().is_resolved());
        assert_eq!(purging.await.unwrap().unwrap(), 1);
        assert!(!history.exists(9).await.unwrap());
    }

    #[tokio::test]
    async fn test_record_wire_format() {
        let history = history();
        history.record("topic", &request(9), None).await.unwrap();
        let record = history.get(9).await.unwrap().unwrap();

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["request"]["method"], "wc_sessionPayload");
        assert!(json.get("response").is_none());
        assert!(json.get("chainId").is_none());
    }
}
