//! In-process map engine with lazy expiry.

use dashmap::DashMap;
use std::time::Duration;
use tracing::debug;

use crate::error::Result;
use crate::model::Entry;

const COMP_BACKEND: &str = "backend.memory";

/// In-process storage engine.
///
/// Entries past their deadline are discarded only when the key is next
/// touched by `get`, `has_key` or `clean`; there is no proactive sweep.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    store: DashMap<String, Entry>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            store: DashMap::new(),
        }
    }

    /// Removes the key if its entry has expired. Returns true when the key
    /// currently holds a live entry.
    fn evict_if_expired(&self, key: &str) -> bool {
        if let Some(entry) = self.store.get(key) {
            if !entry.is_expired() {
                return true;
            }
            drop(entry);
            self.store.remove(key);
            debug!(
                component = COMP_BACKEND,
                event = "lazy_expiry",
                key = %key,
                "discarded expired entry"
            );
        }
        false
    }
}

#[async_trait::async_trait]
impl super::Backend for MemoryBackend {
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        // Zero TTL means "no deadline", same as omitted.
        let ttl = ttl.filter(|ttl| !ttl.is_zero());
        self.store
            .insert(key.to_string(), Entry::new(key, value, ttl));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if !self.evict_if_expired(key) {
            return Ok(None);
        }
        Ok(self
            .store
            .get(key)
            .map(|entry| entry.value.as_ref().clone()))
    }

    async fn clean(&self, keys: &[String]) -> Result<Vec<String>> {
        let mut removed = Vec::new();
        for key in keys {
            if let Some((key, entry)) = self.store.remove(key) {
                // An already-expired entry is logically absent, so its
                // physical removal does not count.
                if !entry.is_expired() {
                    removed.push(key);
                }
            }
        }
        Ok(removed)
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self
            .store
            .iter()
            .filter(|item| !item.value().is_expired())
            .map(|item| item.key().clone())
            .collect())
    }

    async fn size(&self) -> Result<usize> {
        // Approximate: expired-but-unswept entries are still counted.
        Ok(self.store.len())
    }

    async fn has_key(&self, key: &str) -> Result<bool> {
        Ok(self.evict_if_expired(key))
    }

    fn engine_name(&self) -> &str {
        "memory"
    }
}
