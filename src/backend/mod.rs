// Storage backend capability contract and engine factory.

pub mod memory;
pub mod redis;

#[cfg(test)]
mod redis_test;

use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, Engine};
use crate::error::Result;

pub use memory::MemoryBackend;
pub use redis::RedisBackend;

/// Capability contract every storage engine satisfies.
///
/// TTL semantics: `ttl == None` stores the entry with no deadline, so it
/// never expires. Engines that keep the deadline locally perform lazy
/// expiry on read; the redis engine offloads expiry to the server.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// Writes or overwrites the entry.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()>;

    /// Reads an entry; an entry past its deadline is absent.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Removes the given keys, returning only the keys actually removed.
    /// Cleaning an absent key is not an error.
    async fn clean(&self, keys: &[String]) -> Result<Vec<String>>;

    /// Snapshot of stored keys, not a live view.
    async fn keys(&self) -> Result<Vec<String>>;

    /// Approximate count of live entries.
    async fn size(&self) -> Result<usize>;

    async fn has_key(&self, key: &str) -> Result<bool>;

    /// Engine identifier, e.g. "memory" or "redis".
    fn engine_name(&self) -> &str;
}

/// Builds the storage engine selected by `backend.engine`.
pub fn new_backend(cfg: &Config) -> Result<Arc<dyn Backend>> {
    match cfg.backend().engine {
        Engine::Memory => Ok(Arc::new(MemoryBackend::new())),
        Engine::Redis => Ok(Arc::new(RedisBackend::new(cfg.backend())?)),
    }
}
