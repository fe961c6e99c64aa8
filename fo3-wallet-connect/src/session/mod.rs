//! Session lifecycle
//!
//! Value types for scope and shared state, the wire payloads, the expiry
//! policy, the [`SessionSequence`] state machine and the stores that persist
//! it.

pub mod expiry;
pub mod params;
pub mod registry;
pub mod sequence;
pub mod store;
pub mod types;

pub use expiry::{ExpirableSequence, TTL_PENDING, TTL_PROPOSED, TTL_SETTLED};
pub use params::*;
pub use registry::SessionRegistry;
pub use sequence::*;
pub use store::SequenceStore;
pub use types::*;
