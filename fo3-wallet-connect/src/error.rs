//! Error types for the wallet-connect library

use thiserror::Error;

/// Custom error type for session and JSON-RPC ledger operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Duplicate request: id {0} already has an open record")]
    DuplicateRequest(i64),

    #[error("No matching request for response id {0}")]
    NoMatchingRequest(i64),

    #[error("Duplicate response for request id {0}")]
    DuplicateResponse(i64),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Session expired: {0}")]
    SessionExpired(String),

    #[error("No sequence for topic: {0}")]
    NoSequenceForTopic(String),

    #[error("Session not settled: {0}")]
    NotSettled(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Decoding error: {0}")]
    Decoding(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Whether callers should treat this error as "sequence not found"
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::SessionExpired(_) | Self::NoSequenceForTopic(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// Result type for wallet-connect operations
pub type Result<T> = std::result::Result<T, Error>;
