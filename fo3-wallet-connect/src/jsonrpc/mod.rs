//! JSON-RPC plumbing
//!
//! Envelopes for requests and responses, the session method names, request
//! id generation and the request/response correlation ledger.

pub mod history;
pub mod id;
pub mod types;

pub use history::*;
pub use id::*;
pub use types::*;
