//! Persistence adapter
//!
//! The engine persists sessions and JSON-RPC records through a minimal
//! namespaced, byte-oriented key-value contract. Records are JSON-encoded by
//! [`KeyValueStore`] before they cross this boundary; the backing engine is
//! supplied by the host application.

pub mod memory;
pub mod store;

use async_trait::async_trait;

use crate::error::Result;

pub use memory::MemoryKeyValueStorage;
pub use store::KeyValueStore;

/// Byte-oriented, namespace-scoped storage contract
///
/// Implementations must make every individual call atomic. Composite
/// operations built on top of several calls are not atomic unless they use
/// [`KeyValueStorage::set_if_absent`].
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    /// Read the value stored under `key`
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous value
    async fn set(&self, namespace: &str, key: &str, value: Vec<u8>) -> Result<()>;

    /// Store `value` only if `key` is vacant; returns whether it was inserted
    async fn set_if_absent(&self, namespace: &str, key: &str, value: Vec<u8>) -> Result<bool>;

    /// Remove the value stored under `key`, if any
    async fn delete(&self, namespace: &str, key: &str) -> Result<()>;

    /// All values stored in `namespace`
    async fn enumerate(&self, namespace: &str) -> Result<Vec<Vec<u8>>>;
}
