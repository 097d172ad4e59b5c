//! Redis engine: translates the capability contract onto native commands.

use deadpool_redis::{Pool, Runtime};
use redis::AsyncCommands;
use std::time::Duration;
use tracing::debug;

use crate::config::BackendConfig;
use crate::error::{CacheError, Result};

const COMP_BACKEND: &str = "backend.redis";

/// Remote key/value engine backed by a redis connection pool.
///
/// Expiry is offloaded to the server (`SET ... EX`); a native miss is
/// forwarded as absence. `keys` and `size` can be expensive on large
/// databases (`KEYS *` / `DBSIZE`).
pub struct RedisBackend {
    pool: Pool,
    url: String,
}

impl RedisBackend {
    pub fn new(cfg: &BackendConfig) -> Result<Self> {
        let url = cfg.redis_url();
        let mut pool_cfg = deadpool_redis::Config::from_url(&url);
        if let Some(size) = cfg.pool_size {
            pool_cfg.pool = Some(deadpool_redis::PoolConfig::new(size));
        }
        let pool = pool_cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| CacheError::BackendUnavailable(format!("create redis pool: {e}")))?;
        Ok(Self { pool, url })
    }

    /// Transport URL this engine talks to.
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn conn(&self) -> Result<deadpool_redis::Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| CacheError::BackendUnavailable(format!("get redis connection: {e}")))
    }
}

/// Converts a sub-second-precision TTL to redis' whole seconds, rounding
/// up so a small positive TTL never becomes `EX 0`.
pub(crate) fn ttl_secs(ttl: Duration) -> u64 {
    let secs = ttl.as_secs();
    if ttl.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs.max(1)
    }
}

#[async_trait::async_trait]
impl super::Backend for RedisBackend {
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        let mut conn = self.conn().await?;
        // Zero TTL means "no deadline", same as omitted.
        let result: redis::RedisResult<()> = match ttl.filter(|ttl| !ttl.is_zero()) {
            Some(ttl) => conn.set_ex(key, value, ttl_secs(ttl)).await,
            None => conn.set(key, value).await,
        };
        result.map_err(|e| CacheError::BackendUnavailable(format!("redis SET {key:?}: {e}")))
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.conn().await?;
        conn.get::<_, Option<Vec<u8>>>(key)
            .await
            .map_err(|e| CacheError::BackendUnavailable(format!("redis GET {key:?}: {e}")))
    }

    async fn clean(&self, keys: &[String]) -> Result<Vec<String>> {
        let mut conn = self.conn().await?;
        let mut removed = Vec::new();
        // Per-key DEL so the removed list only carries keys that existed.
        for key in keys {
            let count: i64 = conn
                .del(key)
                .await
                .map_err(|e| CacheError::BackendUnavailable(format!("redis DEL {key:?}: {e}")))?;
            if count > 0 {
                removed.push(key.clone());
            }
        }
        debug!(
            component = COMP_BACKEND,
            event = "clean",
            requested = keys.len(),
            removed = removed.len(),
            "cleaned keys"
        );
        Ok(removed)
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut conn = self.conn().await?;
        conn.keys::<_, Vec<String>>("*")
            .await
            .map_err(|e| CacheError::BackendUnavailable(format!("redis KEYS: {e}")))
    }

    async fn size(&self) -> Result<usize> {
        let mut conn = self.conn().await?;
        let size: usize = redis::cmd("DBSIZE")
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::BackendUnavailable(format!("redis DBSIZE: {e}")))?;
        Ok(size)
    }

    async fn has_key(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn().await?;
        let count: i64 = conn
            .exists(key)
            .await
            .map_err(|e| CacheError::BackendUnavailable(format!("redis EXISTS {key:?}: {e}")))?;
        Ok(count > 0)
    }

    fn engine_name(&self) -> &str {
        "redis"
    }
}

impl std::fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBackend").field("url", &self.url).finish()
    }
}
