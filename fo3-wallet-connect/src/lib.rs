//! FO3 Wallet Connect - dApp session engine
//!
//! This library implements the session lifecycle between the wallet and a
//! dApp (proposal, pending, settled, acknowledged), the negotiation of the
//! session's authorization scope, and the ledger correlating JSON-RPC
//! requests with their responses. Transport and key agreement are provided
//! by the host application.

pub mod error;
pub mod config;
pub mod codable;
pub mod crypto;
pub mod storage;
pub mod session;
pub mod jsonrpc;

// Re-export commonly used types for convenience
pub use codable::AnyCodable;
pub use config::WalletConnectConfig;
pub use crypto::AgreementSecret;
pub use error::{Error, Result};
pub use jsonrpc::{JsonRpcHistory, JsonRpcRecord, RequestIdGenerator};
pub use session::{SessionRegistry, SessionSequence};
pub use storage::{KeyValueStorage, KeyValueStore, MemoryKeyValueStorage};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
