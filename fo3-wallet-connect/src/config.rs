//! Configuration for the session engine

use serde::{Deserialize, Serialize};

use crate::session::expiry::TTL_SETTLED;

/// Session engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConnectConfig {
    /// Prefix for every storage namespace owned by the engine
    pub storage_prefix: String,
    /// Relay protocol advertised in new proposals
    pub relay_protocol: String,
    /// Lifetime in seconds requested for sessions we propose
    pub session_ttl: i64,
}

impl Default for WalletConnectConfig {
    fn default() -> Self {
        Self {
            storage_prefix: "fo3.wc".to_string(),
            relay_protocol: "waku".to_string(),
            session_ttl: TTL_SETTLED,
        }
    }
}

impl WalletConnectConfig {
    /// Build the type-qualified namespace for a storage identifier
    pub fn namespace(&self, identifier: &str) -> String {
        format!("{}.{}", self.storage_prefix, identifier)
    }
}
