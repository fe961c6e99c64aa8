//! Request id generation

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use rand::Rng;

/// Owned, thread-safe source of JSON-RPC request ids
///
/// Ids start at the current time in milliseconds scaled by 1000 plus a random
/// offset below 1000, so generators created by different processes rarely
/// collide, and then increase by one per call.
#[derive(Debug)]
pub struct RequestIdGenerator {
    next: AtomicI64,
}

impl RequestIdGenerator {
    pub fn new() -> Self {
        let entropy = rand::thread_rng().gen_range(0..1000);
        Self::starting_at(Utc::now().timestamp_millis() * 1000 + entropy)
    }

    /// Generator whose first id is `first`
    pub fn starting_at(first: i64) -> Self {
        Self {
            next: AtomicI64::new(first),
        }
    }

    pub fn next(&self) -> i64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for RequestIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
