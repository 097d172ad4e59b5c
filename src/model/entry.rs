//! Stored cache entry with an optional expiry deadline.

use std::sync::Arc;
use std::time::{Duration, Instant};

/// A single stored entry, owned by the in-process backend.
///
/// The payload is wrapped in `Arc` so cloning the entry clones a pointer
/// rather than the bytes. `expires_at == None` means the entry never
/// expires.
#[derive(Debug, Clone)]
pub struct Entry {
    pub key: String,
    pub value: Arc<Vec<u8>>,
    pub expires_at: Option<Instant>,
}

impl Entry {
    /// Creates an entry; `ttl == None` stores it without a deadline.
    pub fn new(key: impl Into<String>, value: Vec<u8>, ttl: Option<Duration>) -> Self {
        Self {
            key: key.into(),
            value: Arc::new(value),
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        }
    }

    /// An entry is logically absent once its deadline has passed, even
    /// while physically stored (lazy expiry).
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(deadline) => now >= deadline,
            None => false,
        }
    }
}
