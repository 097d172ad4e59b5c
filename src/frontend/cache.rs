//! The cache façade callers interact with.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::backend::{new_backend, Backend};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::events::{CacheEvent, EventBroadcaster};
use crate::frontend::tags::TagIndex;
use crate::invalidation::{ChannelState, ChannelStateCell, InvalidationListener, InvalidationPublisher};

const COMP_FRONTEND: &str = "frontend";

/// Result of a clean operation: the keys the backend actually removed and,
/// for tag cleans, the originating tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanReport {
    pub removed_keys: Vec<String>,
    pub tags: Vec<String>,
}

/// Tag-aware caching façade over a pluggable storage engine.
///
/// Each instance owns its backend handle and its tag index; there is no
/// process-wide shared state. The tag index is process-local, rebuilt
/// implicitly by `set` calls and lost on restart — a documented
/// limitation, not something the frontend papers over.
pub struct Cache {
    cfg: Config,
    backend: Arc<dyn Backend>,
    tags: TagIndex,
    events: EventBroadcaster,
    publisher: Option<InvalidationPublisher>,
    channel_state: Option<ChannelStateCell>,
    shutdown_token: CancellationToken,
}

impl Cache {
    /// Constructs a cache with the engine selected by the configuration.
    pub fn new(cfg: Config) -> anyhow::Result<Arc<Self>> {
        let backend = new_backend(&cfg)?;
        Self::with_backend(cfg, backend)
    }

    /// Constructs a cache over a caller-supplied engine.
    pub fn with_backend(cfg: Config, backend: Arc<dyn Backend>) -> anyhow::Result<Arc<Self>> {
        cfg.validate()?;

        let shutdown_token = CancellationToken::new();
        let inv = cfg.invalidation();

        let (publisher, listener) = if inv.enabled {
            let url = cfg.invalidation_url();
            (
                Some(InvalidationPublisher::new(&url, &inv.channel)?),
                Some(InvalidationListener::new(&url, &inv.channel)),
            )
        } else {
            (None, None)
        };
        let channel_state = listener.as_ref().map(InvalidationListener::state_cell);

        let cache = Arc::new(Self {
            cfg,
            backend,
            tags: TagIndex::new(),
            events: EventBroadcaster::new(),
            publisher,
            channel_state,
            shutdown_token: shutdown_token.clone(),
        });

        if let Some(listener) = listener {
            // The listener applies remote cleans without re-publishing,
            // so receiving our own broadcast is an idempotent no-op.
            let weak = Arc::downgrade(&cache);
            listener.start(shutdown_token, move |tags| {
                let weak = weak.clone();
                async move {
                    let Some(cache) = weak.upgrade() else {
                        return;
                    };
                    if let Err(e) = cache.clean_tags_local(&tags).await {
                        warn!(
                            component = COMP_FRONTEND,
                            event = "remote_clean_failed",
                            error = %e,
                            "failed to apply remote clean-tags"
                        );
                    }
                }
            });
        }

        Ok(cache)
    }

    /// Stores `value` under `key`, bound to `tags`, for `lifetime`.
    ///
    /// `lifetime == None` applies `frontend.default_lifetime`;
    /// `Some(Duration::ZERO)` stores the entry without a deadline. The
    /// value is JSON-encoded; encoding failure aborts before any tag
    /// binding or backend write.
    pub async fn set<T>(
        &self,
        key: &str,
        value: &T,
        tags: &[&str],
        lifetime: Option<Duration>,
    ) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        if !self.cfg.frontend().caching_enabled {
            return Ok(());
        }
        validate_key(key)?;

        if !self.cfg.frontend().serialization_enabled {
            return Err(CacheError::Serialization {
                key: key.to_string(),
                reason: "serialization is disabled; use set_raw".to_string(),
            });
        }
        let encoded = serde_json::to_vec(value).map_err(|e| CacheError::Serialization {
            key: key.to_string(),
            reason: e.to_string(),
        })?;

        self.write(key, encoded, tags, lifetime).await
    }

    /// Stores pre-encoded bytes untouched; the storage form for
    /// deployments running with serialization disabled.
    pub async fn set_raw(
        &self,
        key: &str,
        value: Vec<u8>,
        tags: &[&str],
        lifetime: Option<Duration>,
    ) -> Result<()> {
        if !self.cfg.frontend().caching_enabled {
            return Ok(());
        }
        validate_key(key)?;
        self.write(key, value, tags, lifetime).await
    }

    async fn write(
        &self,
        key: &str,
        value: Vec<u8>,
        tags: &[&str],
        lifetime: Option<Duration>,
    ) -> Result<()> {
        let tags = owned_tags(tags);
        self.tags.bind(key, &tags);

        let ttl = match lifetime {
            None => Some(self.cfg.frontend().default_lifetime),
            Some(lifetime) if lifetime.is_zero() => None,
            Some(lifetime) => Some(lifetime),
        };
        self.backend.set(key, value, ttl).await?;

        debug!(
            component = COMP_FRONTEND,
            event = "set",
            key = %key,
            tags = tags.len(),
            "stored entry"
        );
        self.events.send(CacheEvent::Set {
            key: key.to_string(),
        });
        Ok(())
    }

    /// Fetches and decodes the value stored under `key`; absence is
    /// `Ok(None)`, not an error.
    pub async fn get<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        if !self.cfg.frontend().serialization_enabled {
            return Err(CacheError::Deserialization {
                key: key.to_string(),
                reason: "serialization is disabled; use get_raw".to_string(),
            });
        }
        let Some(bytes) = self.read(key).await? else {
            return Ok(None);
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => {
                self.events.send(CacheEvent::Hit {
                    key: key.to_string(),
                });
                Ok(Some(value))
            }
            Err(e) => {
                self.events.send(CacheEvent::Error {
                    key: key.to_string(),
                });
                Err(CacheError::Deserialization {
                    key: key.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Fetches the stored bytes untouched.
    pub async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let Some(bytes) = self.read(key).await? else {
            return Ok(None);
        };
        self.events.send(CacheEvent::Hit {
            key: key.to_string(),
        });
        Ok(Some(bytes))
    }

    /// Backend read shared by the typed and raw paths; emits `Miss` or
    /// `Error`, leaving `Hit` to the caller once decoding has succeeded.
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match self.backend.get(key).await {
            Ok(Some(bytes)) => Ok(Some(bytes)),
            Ok(None) => {
                debug!(component = COMP_FRONTEND, event = "miss", key = %key, "cache miss");
                self.events.send(CacheEvent::Miss {
                    key: key.to_string(),
                });
                Ok(None)
            }
            Err(e) => {
                self.events.send(CacheEvent::Error {
                    key: key.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Removes the given keys directly. Tag bindings pointing at removed
    /// keys go stale; resolution tolerates them.
    pub async fn clean_keys(&self, keys: &[&str]) -> Result<CleanReport> {
        let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        let removed_keys = self.backend.clean(&keys).await?;

        debug!(
            component = COMP_FRONTEND,
            event = "clean_keys",
            requested = keys.len(),
            removed = removed_keys.len(),
            "cleaned keys"
        );
        self.events.send(CacheEvent::Clean {
            removed_keys: removed_keys.clone(),
            tags: None,
        });
        Ok(CleanReport {
            removed_keys,
            tags: Vec::new(),
        })
    }

    /// Removes every key bound to any of the given tags, then broadcasts
    /// the tags on the invalidation channel when one is configured.
    ///
    /// The local clean always takes effect first; a broadcast failure
    /// surfaces as `ChannelUnavailable` without rolling it back.
    pub async fn clean_tags(&self, tags: &[&str]) -> Result<CleanReport> {
        let tags = owned_tags(tags);
        let report = self.clean_tags_local(&tags).await?;

        if let Some(publisher) = &self.publisher {
            // Broadcast even when nothing was removed locally: other
            // processes index their own keys under these tags.
            publisher.publish(&tags).await?;
        }
        Ok(report)
    }

    /// The local half of `clean_tags`; also the remote-broadcast handler.
    async fn clean_tags_local(&self, tags: &[String]) -> Result<CleanReport> {
        let keys = self.tags.resolve(tags);
        let removed_keys = self.backend.clean(&keys).await?;

        debug!(
            component = COMP_FRONTEND,
            event = "clean_tags",
            tags = tags.len(),
            resolved = keys.len(),
            removed = removed_keys.len(),
            "cleaned tags"
        );
        self.events.send(CacheEvent::Clean {
            removed_keys: removed_keys.clone(),
            tags: Some(tags.to_vec()),
        });
        Ok(CleanReport {
            removed_keys,
            tags: tags.to_vec(),
        })
    }

    pub async fn has_key(&self, key: &str) -> Result<bool> {
        self.backend.has_key(key).await
    }

    /// Answered purely from the local tag index; no backend round trip.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.exists(tag)
    }

    pub async fn get_keys(&self) -> Result<Vec<String>> {
        self.backend.keys().await
    }

    /// Snapshot of tags known to this process.
    pub fn get_tags(&self) -> Vec<String> {
        self.tags.tags()
    }

    pub async fn get_size(&self) -> Result<usize> {
        self.backend.size().await
    }

    /// Subscribes to the notification side channel.
    pub fn subscribe_events(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    /// Invalidation listener state, when a channel is configured.
    pub fn channel_state(&self) -> Option<ChannelState> {
        self.channel_state.as_ref().map(ChannelStateCell::get)
    }

    pub fn engine_name(&self) -> &str {
        self.backend.engine_name()
    }

    /// Stops the invalidation listener. Storage is left untouched.
    pub fn close(&self) {
        self.shutdown_token.cancel();
    }
}

impl Drop for Cache {
    fn drop(&mut self) {
        self.shutdown_token.cancel();
    }
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("engine", &self.backend.engine_name())
            .field("tags", &self.tags.len())
            .finish()
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidKey("key must not be empty".to_string()));
    }
    Ok(())
}

fn owned_tags(tags: &[&str]) -> Vec<String> {
    tags.iter()
        .filter(|tag| !tag.is_empty())
        .map(|tag| tag.to_string())
        .collect()
}
